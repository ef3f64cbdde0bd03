use crate::error::{Error, Result};
use crate::model::AppEntry;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const DESKTOP_EXTENSION: &str = "desktop";

struct Patterns {
    section: Regex,
    invisible: Regex,
    application: Regex,
    terminal: Regex,
    exec: Regex,
    path: Regex,
    name: Regex,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    section: Regex::new(r"(?ms)^\[Desktop Entry\][^\n]*$(.*?)(?:^\[|\z)").expect("section pattern"),
    invisible: Regex::new(r"(?m)^(?:Hidden|NoDisplay)[ \t]*=[ \t]*true[ \t\r]*$")
        .expect("visibility pattern"),
    application: Regex::new(r"(?m)^Type[ \t]*=[ \t]*Application[ \t\r]*$").expect("type pattern"),
    terminal: Regex::new(r"(?m)^Terminal[ \t]*=[ \t]*true[ \t\r]*$").expect("terminal pattern"),
    exec: key_pattern("Exec"),
    path: key_pattern("Path"),
    name: key_pattern("Name"),
});

fn key_pattern(key: &str) -> Regex {
    Regex::new(&format!(r"(?m)^{}[ \t]*=[ \t]*(.*?)[ \t\r]*$", key)).expect("key pattern")
}

/// What the runner needs from an entry at launch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchInfo {
    pub exec: String,
    pub working_dir: Option<PathBuf>,
    pub terminal: bool,
}

/// Parses desktop entries for one catalog build. The locale-specific name
/// pattern is compiled once here and shared by every parsing task.
pub struct EntryParser {
    roots: Vec<PathBuf>,
    localized_name: Option<Regex>,
}

impl EntryParser {
    pub fn new(roots: &[PathBuf], locale: &str) -> Self {
        let localized_name = (!locale.is_empty())
            .then(|| key_pattern(&format!(r"Name\[{}\]", regex::escape(locale))));
        Self {
            roots: roots.to_vec(),
            localized_name,
        }
    }

    /// Returns `Ok(None)` for files that are not visible applications.
    pub fn parse(&self, path: &Path) -> Result<Option<AppEntry>> {
        let Some(section) = read_section(path)? else {
            return Ok(None);
        };

        if PATTERNS.invisible.is_match(&section) || !PATTERNS.application.is_match(&section) {
            return Ok(None);
        }

        let Some(exec) = value(&PATTERNS.exec, &section) else {
            return Err(Error::InvalidDesktopEntry {
                path: path.to_path_buf(),
            });
        };

        let name = self
            .localized_name
            .as_ref()
            .and_then(|re| value(re, &section))
            .or_else(|| value(&PATTERNS.name, &section));
        let Some(name) = name else {
            return Ok(None);
        };

        let (id, source_dir) = entry_id(path, &self.roots);

        Ok(Some(AppEntry {
            name,
            file: path.to_path_buf(),
            command_template: exec,
            working_dir: value(&PATTERNS.path, &section).map(PathBuf::from),
            id,
            source_dir,
            terminal: PATTERNS.terminal.is_match(&section),
            collision_index: 0,
        }))
    }
}

/// Reads the launch-relevant keys of `path`, ignoring visibility.
pub fn launch_info(path: &Path) -> Result<LaunchInfo> {
    let invalid = || Error::InvalidDesktopEntry {
        path: path.to_path_buf(),
    };
    let section = read_section(path)?.ok_or_else(invalid)?;
    let exec = value(&PATTERNS.exec, &section).ok_or_else(invalid)?;

    Ok(LaunchInfo {
        exec,
        working_dir: value(&PATTERNS.path, &section).map(PathBuf::from),
        terminal: PATTERNS.terminal.is_match(&section),
    })
}

/// Derives the stable identifier of `path` from the deepest root containing
/// it. Files outside every root fall back to their stem and parent directory.
pub fn entry_id(path: &Path, roots: &[PathBuf]) -> (String, PathBuf) {
    let root = roots
        .iter()
        .filter(|root| path.starts_with(root))
        .max_by_key(|root| root.components().count());

    match root.and_then(|root| Some((root, path.strip_prefix(root).ok()?))) {
        Some((root, relative)) => {
            let id = relative
                .with_extension("")
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("-");
            (id, root.clone())
        }
        None => {
            let id = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let parent = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (id, parent)
        }
    }
}

fn read_section(path: &Path) -> Result<Option<String>> {
    let bytes = fs::read(path).map_err(|source| Error::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let content = String::from_utf8_lossy(&bytes);
    Ok(PATTERNS
        .section
        .captures(&content)
        .and_then(|caps| caps.get(1))
        .map(|body| body.as_str().to_string()))
}

fn value(re: &Regex, section: &str) -> Option<String> {
    re.captures(section)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|v| !v.is_empty())
}
