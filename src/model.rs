use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEntry {
    pub name: String,                 // Display name, localized when possible
    pub file: PathBuf,                // The .desktop file itself
    pub command_template: String,     // Raw Exec value, field codes untouched
    pub working_dir: Option<PathBuf>, // Path= key
    pub id: String,                   // e.g. "org-gnome-Nautilus" for org/gnome/Nautilus.desktop
    pub source_dir: PathBuf,          // Root the file was found under
    #[serde(default)]
    pub terminal: bool,
    #[serde(default)]
    pub collision_index: usize,
}

impl AppEntry {
    /// The name shown in the menu, e.g. "Editor (2)".
    pub fn display_name(&self) -> String {
        render_name(&self.name, self.collision_index)
    }
}

pub fn render_name(name: &str, collision_index: usize) -> String {
    if collision_index == 0 {
        name.to_string()
    } else {
        format!("{} ({})", name, collision_index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub command: String,
    #[serde(default)]
    pub is_desktop: bool,
}
