use crate::catalog::Catalog;
use crate::command::{expand_field_codes, parse_command};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::sources::desktop::{DESKTOP_EXTENSION, launch_info};
use log::{debug, info, warn};
use nix::errno::Errno;
use nix::unistd::execv;
use std::convert::Infallible;
use std::env;
use std::ffi::CString;
use std::path::{Path, PathBuf};

/// A fully resolved process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    pub argv: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

/// Resolves `selected` through aliases, then the catalog, then as a literal
/// command line.
pub fn resolve(selected: &str, config: &Config, catalog: &Catalog) -> Result<Launch> {
    let terminal = &config.general.terminal_command;

    if let Some(alias) = config.aliases.get(selected) {
        debug!("{:?} is an alias for {:?}", selected, alias.command);
        if !alias.is_desktop {
            return literal(&alias.command);
        }
        if let Some(entry) = catalog.get_by_id(&alias.command) {
            return desktop(&entry.file, terminal);
        }
        let path = Path::new(&alias.command);
        let is_desktop_file = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(DESKTOP_EXTENSION));
        if is_desktop_file {
            return desktop(path, terminal);
        }
        return Err(Error::InvalidAlias {
            name: selected.to_string(),
        });
    }

    if let Some(entry) = catalog.get(selected) {
        return desktop(&entry.file, terminal);
    }

    literal(selected)
}

fn literal(command: &str) -> Result<Launch> {
    Ok(Launch {
        argv: parse_command(command)?,
        working_dir: None,
    })
}

fn desktop(file: &Path, terminal_command: &str) -> Result<Launch> {
    let info = launch_info(file)?;
    let mut command = expand_field_codes(&info.exec, file);
    if info.terminal {
        command = format!("{} {}", terminal_command, command);
    }
    Ok(Launch {
        argv: parse_command(&command)?,
        working_dir: info.working_dir,
    })
}

/// Replaces the current process with `launch`. Only returns on failure.
pub fn exec(launch: &Launch) -> Result<Infallible> {
    let program = launch.argv.first().ok_or(Error::EmptyCommand)?;
    let exec_error = |source: Errno| Error::Exec {
        program: program.clone(),
        source,
    };

    let args = launch
        .argv
        .iter()
        .map(|arg| CString::new(arg.as_str()))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| exec_error(Errno::EINVAL))?;

    if let Some(dir) = &launch.working_dir {
        enter_working_dir(dir);
    }

    info!("Executing {:?}", launch.argv);
    match execv(&args[0], &args) {
        Ok(never) => match never {},
        Err(errno) => Err(exec_error(errno)),
    }
}

/// An unusable `Path=` is not fatal; the program starts in the current directory.
fn enter_working_dir(dir: &Path) -> bool {
    match env::set_current_dir(dir) {
        Ok(()) => true,
        Err(err) => {
            warn!("Ignoring working directory {:?}: {}", dir, err);
            false
        }
    }
}

pub fn run(selected: &str, config: &Config, catalog: &Catalog) -> Result<Infallible> {
    let launch = resolve(selected, config, catalog)?;
    exec(&launch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AppEntry, Alias};
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    fn write_entry(dir: &Path, id: &str, body: &str) -> AppEntry {
        let file = dir.join(format!("{}.desktop", id));
        fs::write(&file, format!("[Desktop Entry]\nType=Application\n{}", body)).unwrap();
        AppEntry {
            name: id.to_string(),
            file,
            command_template: String::new(),
            working_dir: None,
            id: id.to_string(),
            source_dir: dir.to_path_buf(),
            terminal: false,
            collision_index: 0,
        }
    }

    fn catalog(dir: &Path, entries: Vec<AppEntry>) -> Catalog {
        Catalog::merge(entries, &[dir.to_path_buf()], Vec::new(), &HashSet::new())
    }

    fn config_with(aliases: &[(&str, &str, bool)]) -> Config {
        let mut config = Config::default();
        config.general.terminal_command = "/usr/bin/xterm -e".to_string();
        for (name, command, is_desktop) in aliases {
            config.aliases.insert(
                name.to_string(),
                Alias {
                    command: command.to_string(),
                    is_desktop: *is_desktop,
                },
            );
        }
        config
    }

    #[test]
    fn catalog_entry_expands_exec_and_path() {
        let dir = TempDir::new().unwrap();
        let viewer = write_entry(
            dir.path(),
            "viewer",
            "Name=Viewer\nExec=/opt/viewer --open %U\nPath=/srv/pics\n",
        );
        let catalog = catalog(dir.path(), vec![viewer]);

        let launch = resolve("viewer", &config_with(&[]), &catalog).unwrap();
        assert_eq!(launch.argv, ["/opt/viewer", "--open"]);
        assert_eq!(launch.working_dir, Some(PathBuf::from("/srv/pics")));
    }

    #[test]
    fn terminal_entries_are_wrapped() {
        let dir = TempDir::new().unwrap();
        let top = write_entry(
            dir.path(),
            "top",
            "Name=Top\nExec=/usr/bin/top -d 1\nTerminal=true\n",
        );
        let catalog = catalog(dir.path(), vec![top]);

        let launch = resolve("top", &config_with(&[]), &catalog).unwrap();
        assert_eq!(launch.argv, ["/usr/bin/xterm", "-e", "/usr/bin/top", "-d", "1"]);
    }

    #[test]
    fn plain_alias_is_tokenized() {
        let dir = TempDir::new().unwrap();
        let config = config_with(&[("Logs", "/usr/bin/less \"/var/log/my app.log\"", false)]);
        let launch = resolve("Logs", &config, &catalog(dir.path(), Vec::new())).unwrap();
        assert_eq!(launch.argv, ["/usr/bin/less", "/var/log/my app.log"]);
        assert_eq!(launch.working_dir, None);
    }

    #[test]
    fn desktop_alias_prefers_catalog_id() {
        let dir = TempDir::new().unwrap();
        let web = write_entry(dir.path(), "web", "Name=Web\nExec=/opt/web %u\n");
        let catalog = catalog(dir.path(), vec![web]);
        let config = config_with(&[("Browser", "web", true)]);

        let launch = resolve("Browser", &config, &catalog).unwrap();
        assert_eq!(launch.argv, ["/opt/web"]);
    }

    #[test]
    fn desktop_alias_falls_back_to_file_path() {
        let dir = TempDir::new().unwrap();
        let mail = write_entry(dir.path(), "mail", "Name=Mail\nExec=/opt/mail\nNoDisplay=true\n");
        let config = config_with(&[("Mail", mail.file.to_str().unwrap(), true)]);

        let launch = resolve("Mail", &config, &catalog(dir.path(), Vec::new())).unwrap();
        assert_eq!(launch.argv, ["/opt/mail"]);
    }

    #[test]
    fn unresolvable_desktop_alias_is_invalid() {
        let dir = TempDir::new().unwrap();
        let config = config_with(&[("Ghost", "ghost", true)]);
        assert!(matches!(
            resolve("Ghost", &config, &catalog(dir.path(), Vec::new())),
            Err(Error::InvalidAlias { name }) if name == "Ghost"
        ));
    }

    #[test]
    fn unknown_name_is_a_literal_command() {
        let dir = TempDir::new().unwrap();
        let empty = catalog(dir.path(), Vec::new());
        let launch = resolve("/bin/echo hi", &config_with(&[]), &empty).unwrap();
        assert_eq!(launch.argv, ["/bin/echo", "hi"]);

        assert!(matches!(
            resolve("echo $HOME", &config_with(&[]), &empty),
            Err(Error::MalformedCommand { ch: '$', offset: 5 })
        ));
    }

    #[test]
    fn entry_without_exec_is_invalid() {
        let dir = TempDir::new().unwrap();
        let broken = write_entry(dir.path(), "broken", "Name=Broken\n");
        let mut catalog = Catalog::new(vec![dir.path().to_path_buf()]);
        catalog.insert(broken);

        assert!(matches!(
            resolve("broken", &config_with(&[]), &catalog),
            Err(Error::InvalidDesktopEntry { .. })
        ));
    }

    #[test]
    fn missing_working_dir_is_skipped() {
        let dir = TempDir::new().unwrap();
        let before = env::current_dir().unwrap();
        assert!(!enter_working_dir(&dir.path().join("missing")));
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    fn desktop_alias_reaches_excluded_entry() {
        let dir = TempDir::new().unwrap();
        let firefox = write_entry(dir.path(), "firefox", "Name=Firefox
Exec=/opt/firefox %u
");
        let catalog = Catalog::merge(
            vec![firefox],
            &[dir.path().to_path_buf()],
            Vec::new(),
            &HashSet::from(["firefox".to_string()]),
        );
        assert!(catalog.get("firefox").is_none());

        let config = config_with(&[("Web", "firefox", true)]);
        let launch = resolve("Web", &config, &catalog).unwrap();
        assert_eq!(launch.argv, ["/opt/firefox"]);
    }

    #[test]
    fn exec_rejects_empty_argv() {
        let launch = Launch {
            argv: Vec::new(),
            working_dir: None,
        };
        assert!(matches!(exec(&launch), Err(Error::EmptyCommand)));
    }
}
