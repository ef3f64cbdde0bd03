use crate::error::Result;
use crate::model::Alias;
use directories::ProjectDirs;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub aliases: HashMap<String, Alias>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_menu_command")]
    pub menu_command: String,
    #[serde(default = "default_terminal_command")]
    pub terminal_command: String,
    #[serde(default)]
    pub excludes: HashSet<String>,
    /// Extra application roots, searched after the XDG ones.
    #[serde(default)]
    pub extra_dirs: Vec<PathBuf>,
}

fn default_menu_command() -> String {
    "dmenu -i -p Run:".to_string()
}

fn default_terminal_command() -> String {
    "kitty".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            menu_command: default_menu_command(),
            terminal_command: default_terminal_command(),
            excludes: HashSet::new(),
            extra_dirs: Vec::new(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    match ProjectDirs::from("org", "deskrun", "deskrun") {
        Some(dirs) => dirs.config_dir().join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

/// Loads `path`, falling back to defaults when the file does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}

/// Language part of the environment locale, e.g. `en_US.UTF-8` -> `en`.
pub fn locale_from_env() -> String {
    ["LC_ALL", "LC_MESSAGES", "LANG"]
        .iter()
        .filter_map(|key| env::var(key).ok())
        .find(|value| !value.is_empty())
        .map(|value| language(&value))
        .unwrap_or_default()
}

pub fn language(locale: &str) -> String {
    let end = locale.find(['_', '.', '@']).unwrap_or(locale.len());
    let lang = &locale[..end];
    if lang == "C" || lang == "POSIX" {
        String::new()
    } else {
        lang.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.general.menu_command, "dmenu -i -p Run:");
        assert_eq!(config.general.terminal_command, "kitty");
        assert!(config.aliases.is_empty());
    }

    #[test]
    fn parses_aliases_and_excludes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[general]
terminal_command = "foot -e"
excludes = ["Htop"]

[aliases.Browser]
command = "firefox"
is_desktop = true

[aliases."Top Five"]
command = "top -n 5"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.general.menu_command, "dmenu -i -p Run:");
        assert_eq!(config.general.terminal_command, "foot -e");
        assert!(config.general.excludes.contains("Htop"));
        assert_eq!(
            config.aliases["Browser"],
            Alias {
                command: "firefox".to_string(),
                is_desktop: true
            }
        );
        assert!(!config.aliases["Top Five"].is_desktop);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[general\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn language_truncates_locale() {
        assert_eq!(language("en_US.UTF-8"), "en");
        assert_eq!(language("de"), "de");
        assert_eq!(language("sr@latin"), "sr");
        assert_eq!(language("C.UTF-8"), "");
    }
}
