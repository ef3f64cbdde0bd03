use crate::error::Result;
use crate::model::AppEntry;
use directories::BaseDirs;
use log::{debug, info, warn};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

pub mod desktop;
pub mod walk;

use desktop::{DESKTOP_EXTENSION, EntryParser};
use walk::find_files_with_extension;

pub trait Source {
    fn scan(&self) -> Result<Vec<AppEntry>>;
}

/// Scans a prioritized list of application roots. Walking fans out one task
/// per root, parsing splits the files into one chunk per worker thread; each
/// phase is fully joined before its results are consumed.
pub struct DesktopSource {
    roots: Vec<PathBuf>,
    locale: String,
}

impl DesktopSource {
    pub fn new(roots: Vec<PathBuf>, locale: impl Into<String>) -> Self {
        Self {
            roots,
            locale: locale.into(),
        }
    }

    fn find_files(&self) -> Vec<PathBuf> {
        thread::scope(|s| {
            let (tx, rx) = mpsc::channel();
            for root in &self.roots {
                let tx = tx.clone();
                s.spawn(move || {
                    debug!("Scanning desktop files in {:?}", root);
                    let _ = tx.send(find_files_with_extension(root, DESKTOP_EXTENSION));
                });
            }
            // The receive loop ends once every walker has dropped its sender.
            drop(tx);
            rx.into_iter().flatten().collect()
        })
    }

    fn parse_files(&self, files: &[PathBuf]) -> Vec<AppEntry> {
        let parser = EntryParser::new(&self.roots, &self.locale);
        let parser = &parser;

        thread::scope(|s| {
            let (tx, rx) = mpsc::channel();
            for chunk in files.chunks(chunk_len(files.len(), parse_workers())) {
                let tx = tx.clone();
                s.spawn(move || {
                    for file in chunk {
                        let _ = tx.send((file, parser.parse(file)));
                    }
                });
            }
            drop(tx);

            let mut entries = Vec::new();
            for (file, result) in rx {
                match result {
                    Ok(Some(entry)) => entries.push(entry),
                    Ok(None) => debug!("Skipping {:?}: not a visible application", file),
                    Err(err) => warn!("Skipping {:?}: {}", file, err),
                }
            }
            entries
        })
    }
}

fn parse_workers() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}

/// Chunk length that spreads `len` files over at most `workers` threads.
fn chunk_len(len: usize, workers: usize) -> usize {
    len.div_ceil(workers.max(1)).max(1)
}

impl Source for DesktopSource {
    fn scan(&self) -> Result<Vec<AppEntry>> {
        let files = self.find_files();
        info!(
            "DesktopSource: found {} files in {} roots",
            files.len(),
            self.roots.len()
        );

        let entries = self.parse_files(&files);
        info!("DesktopSource: parsed {} entries", entries.len());
        Ok(entries)
    }
}

/// Application roots in XDG precedence: user data dir first, then
/// `$XDG_DATA_DIRS`, then flatpak exports, then `extra`.
pub fn application_dirs(extra: &[PathBuf]) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let data_dirs = env::var("XDG_DATA_DIRS")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());

    let base_dirs = BaseDirs::new();

    if let Some(base_dirs) = &base_dirs {
        dirs.push(base_dirs.data_dir().join("applications"));
    }
    dirs.extend(
        data_dirs
            .split(':')
            .filter(|dir| !dir.is_empty())
            .map(|dir| Path::new(dir).join("applications")),
    );
    if let Some(base_dirs) = &base_dirs {
        dirs.push(base_dirs.data_dir().join("flatpak/exports/share/applications"));
    }
    dirs.push(PathBuf::from("/var/lib/flatpak/exports/share/applications"));
    dirs.extend(extra.iter().cloned());

    dedup_keep_first(dirs)
}

fn dedup_keep_first(dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut unique: Vec<PathBuf> = Vec::with_capacity(dirs.len());
    for dir in dirs {
        // "/usr/share/" and "/usr/share" compare equal as paths.
        if !unique.iter().any(|seen| seen == &dir) {
            unique.push(dir);
        }
    }
    unique
}
