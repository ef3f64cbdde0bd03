//! Exec-string handling: tokenizing, field-code expansion and `PATH` lookup.
//!
//! The quoting rules are intentionally not POSIX. A double quote only opens or
//! closes a whitespace-preserving region when it sits next to a token boundary;
//! a quote in the middle of a token toggles a separate literal-quote mode that
//! drops the quote characters without grouping anything.

use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const RESERVED_CHARS: &str = " '\\><~|&;$*?#()`\"\t\n";

static FIELD_CODES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" *%[fFuUi] *|%%|%k").expect("field code pattern"));

/// Splits a command line into arguments without resolving the program.
pub fn tokenize(command: &str) -> Result<Vec<String>> {
    let lead = command.len() - command.trim_start().len();
    let trimmed = command.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyCommand);
    }

    let chars: Vec<(usize, char)> = trimmed
        .char_indices()
        .map(|(i, c)| (i + lead, c))
        .collect();
    let last = chars.len() - 1;

    let mut args = Vec::new();
    let mut current = String::new();
    // A token is emitted when it has content or was explicitly quoted ("").
    let mut pending = false;
    let mut quoted = false;
    let mut literal_quotes = false;
    let mut escaped = false;

    for (k, &(offset, ch)) in chars.iter().enumerate() {
        if escaped {
            current.push(ch);
            pending = true;
            escaped = false;
            continue;
        }

        match ch {
            '\\' => {
                if k == last {
                    return Err(Error::MalformedCommand { ch, offset });
                }
                escaped = true;
            }
            '"' => {
                let at_boundary =
                    k == 0 || k == last || chars[k - 1].1 == ' ' || chars[k + 1].1 == ' ';
                if at_boundary && !literal_quotes {
                    quoted = !quoted;
                    pending = true;
                } else {
                    literal_quotes = !literal_quotes;
                }
            }
            ' ' if !quoted => {
                if pending {
                    args.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            _ if !quoted && RESERVED_CHARS.contains(ch) => {
                return Err(Error::MalformedCommand { ch, offset });
            }
            _ => {
                current.push(ch);
                pending = true;
            }
        }
    }

    if pending {
        args.push(current);
    }
    if args.is_empty() {
        return Err(Error::EmptyCommand);
    }
    Ok(args)
}

/// Tokenizes `command` and replaces the program with its resolved path.
pub fn parse_command(command: &str) -> Result<Vec<String>> {
    let mut args = tokenize(command)?;
    let binary = find_executable(&args[0])?;
    args[0] = binary.to_string_lossy().into_owned();
    Ok(args)
}

/// Applies desktop-entry field codes to an Exec value.
///
/// `%%` becomes `%`, `%k` becomes `file` (with reserved characters escaped),
/// and `%f %F %u %U %i` are removed together with the spaces around them.
pub fn expand_field_codes(exec: &str, file: &Path) -> String {
    let mut out = String::with_capacity(exec.len());
    let mut copied = 0;

    for m in FIELD_CODES.find_iter(exec) {
        out.push_str(&exec[copied..m.start()]);
        match m.as_str() {
            "%%" => out.push('%'),
            "%k" => {
                for c in file.to_string_lossy().chars() {
                    if RESERVED_CHARS.contains(c) {
                        out.push('\\');
                    }
                    out.push(c);
                }
            }
            // Removed spaces between two words must still leave them apart.
            code if code.contains(' ') && m.start() > 0 && m.end() < exec.len() => {
                out.push(' ')
            }
            _ => {}
        }
        copied = m.end();
    }
    out.push_str(&exec[copied..]);
    out
}

/// Resolves a program name the way `execvp` would, except that a name
/// containing `/` is returned verbatim without checking it exists.
pub fn find_executable(name: &str) -> Result<PathBuf> {
    if name.contains('/') {
        return Ok(PathBuf::from(name));
    }
    let path_var = env::var_os("PATH").unwrap_or_default();
    search_path(name, &path_var).ok_or_else(|| Error::ExecutableNotFound {
        name: name.to_string(),
    })
}

fn search_path(name: &str, path_var: &OsStr) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    env::split_paths(path_var)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
