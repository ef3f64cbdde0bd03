use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Command is empty")]
    EmptyCommand,
    #[error("Unescaped {ch:?} at position {offset} in command")]
    MalformedCommand { ch: char, offset: usize },
    #[error("Executable {name:?} not found in PATH")]
    ExecutableNotFound { name: String },
    #[error("{} is not a launchable desktop entry", path.display())]
    InvalidDesktopEntry { path: PathBuf },
    #[error("Alias {name:?} does not resolve to a desktop entry")]
    InvalidAlias { name: String },
    #[error("Failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to exec {program}: {source}")]
    Exec {
        program: String,
        #[source]
        source: nix::errno::Errno,
    },
    #[error("Menu command failed: {0}")]
    Menu(String),
    #[error("Invalid config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
