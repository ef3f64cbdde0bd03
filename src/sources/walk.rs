use log::debug;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lists every regular file or symlink under `root` whose extension matches
/// `extension` case-insensitively. A missing root yields nothing.
pub fn find_files_with_extension(root: &Path, extension: &str) -> Vec<PathBuf> {
    if !root.exists() {
        debug!("Skipping missing directory {:?}", root);
        return Vec::new();
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!("Walk error under {:?}: {}", root, err);
                continue;
            }
        };

        let file_type = entry.file_type();
        if !(file_type.is_file() || file_type.is_symlink()) {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches {
            files.push(entry.into_path());
        }
    }
    files
}
