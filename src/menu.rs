use crate::catalog::Catalog;
use crate::command::parse_command;
use crate::config::Config;
use crate::error::{Error, Result};
use log::debug;
use std::collections::BTreeSet;
use std::io::Write;
use std::process::{Command, Stdio};

/// Names offered to the menu: catalog names plus aliases, minus excludes.
pub fn menu_names(catalog: &Catalog, config: &Config) -> Vec<String> {
    let names: BTreeSet<&str> = catalog
        .names()
        .chain(config.aliases.keys().map(String::as_str))
        .filter(|name| !config.general.excludes.contains(*name))
        .collect();
    names.into_iter().map(str::to_string).collect()
}

/// Runs the menu program with `names` on stdin and returns the trimmed
/// selection, or `None` if nothing was chosen.
pub fn select(
    menu_command: &str,
    extra_args: &[String],
    names: &[String],
) -> Result<Option<String>> {
    let mut argv = parse_command(menu_command)?;
    argv.extend(extra_args.iter().cloned());
    debug!("Running menu {:?}", argv);

    let mut child = Command::new(&argv[0])
        .args(&argv[1..])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        let mut input = names.join("\n");
        input.push('\n');
        // A menu that exits before reading everything closes the pipe early.
        if let Err(err) = stdin.write_all(input.as_bytes()) {
            debug!("Menu stopped reading input: {}", err);
        }
    }

    let output = child.wait_with_output()?;
    let selection = String::from_utf8_lossy(&output.stdout).trim().to_string();

    if !output.status.success() {
        // dmenu-style menus exit 1 when the user cancels.
        if selection.is_empty() && output.status.code() == Some(1) {
            return Ok(None);
        }
        return Err(Error::Menu(format!("{} exited with {}", argv[0], output.status)));
    }

    Ok((!selection.is_empty()).then_some(selection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Alias, AppEntry};
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn entry(name: &str, id: &str) -> AppEntry {
        AppEntry {
            name: name.to_string(),
            file: PathBuf::from(format!("/apps/{}.desktop", id)),
            command_template: id.to_string(),
            working_dir: None,
            id: id.to_string(),
            source_dir: PathBuf::from("/apps"),
            terminal: false,
            collision_index: 0,
        }
    }

    #[test]
    fn names_include_aliases_without_excludes() {
        let catalog = Catalog::merge(
            vec![entry("Files", "files"), entry("Editor", "editor")],
            &[PathBuf::from("/apps")],
            Vec::new(),
            &HashSet::new(),
        );
        let mut config = Config::default();
        config.aliases.insert(
            "Browser".to_string(),
            Alias {
                command: "firefox".to_string(),
                is_desktop: false,
            },
        );
        config.aliases.insert(
            "Files".to_string(),
            Alias {
                command: "files".to_string(),
                is_desktop: true,
            },
        );
        config.general.excludes.insert("Editor".to_string());

        assert_eq!(menu_names(&catalog, &config), ["Browser", "Files"]);
    }

    #[test]
    fn returns_menu_selection() {
        let names = vec!["Alpha".to_string(), "Beta".to_string()];
        let selected = select("/bin/sh -c \"head -n 2 | tail -n 1\"", &[], &names).unwrap();
        assert_eq!(selected.as_deref(), Some("Beta"));
    }

    #[test]
    fn extra_args_are_appended() {
        let names = vec!["ignored".to_string()];
        let selected = select("/bin/echo", &["picked".to_string()], &names).unwrap();
        assert_eq!(selected.as_deref(), Some("picked"));
    }

    #[test]
    fn cancelled_menu_selects_nothing() {
        let names = vec!["Alpha".to_string()];
        assert_eq!(select("/bin/false", &[], &names).unwrap(), None);
        assert_eq!(select("/bin/true", &[], &names).unwrap(), None);
    }

    #[test]
    fn failing_menu_is_an_error() {
        let names = vec!["Alpha".to_string()];
        let result = select("/bin/sh -c \"exit 3\"", &[], &names);
        assert!(matches!(result, Err(Error::Menu(_))));
    }
}
