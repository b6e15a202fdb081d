//! Resolve required commands on `PATH` before anything is mutated.

use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use tracing::{debug, error};

use crate::error::{ToolchainError, ToolchainResult};

/// Outcome of resolving one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandProbe {
    /// Command name as requested.
    pub command: String,
    /// Resolved executable, if any.
    pub resolved: Option<PathBuf>,
}

impl CommandProbe {
    /// Whether the command resolved.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.resolved.is_some()
    }
}

/// Locate `command` on the current `PATH`.
#[must_use]
pub fn find_command(command: &str) -> Option<PathBuf> {
    let search = env::var_os("PATH")?;
    find_in(command, &search, env::var_os("PATHEXT").as_deref())
}

/// Resolve every command, preserving input order.
#[must_use]
pub fn probe_commands(commands: &[String]) -> Vec<CommandProbe> {
    commands
        .iter()
        .map(|command| {
            let resolved = find_command(command);
            debug!(command = %command, resolved = ?resolved, "probed command");
            CommandProbe {
                command: command.clone(),
                resolved,
            }
        })
        .collect()
}

/// Fail unless every command resolves.
///
/// # Errors
///
/// Returns [`ToolchainError::MissingCommands`] naming every command that did
/// not resolve.
pub fn check_required(commands: &[String]) -> ToolchainResult<Vec<CommandProbe>> {
    let probes = probe_commands(commands);
    let missing: Vec<String> = probes
        .iter()
        .filter(|probe| !probe.is_available())
        .map(|probe| probe.command.clone())
        .collect();
    if missing.is_empty() {
        return Ok(probes);
    }
    for command in &missing {
        error!(command = %command, "required command is not installed or not on PATH");
    }
    Err(ToolchainError::MissingCommands { commands: missing })
}

fn find_in(command: &str, search: &OsStr, extensions: Option<&OsStr>) -> Option<PathBuf> {
    let candidate = Path::new(command);
    if candidate.components().count() > 1 {
        return with_extensions(candidate, extensions).find(|path| is_executable(path));
    }
    env::split_paths(search)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| with_extensions(&dir.join(command), extensions).collect::<Vec<_>>())
        .find(|path| is_executable(path))
}

fn with_extensions(base: &Path, extensions: Option<&OsStr>) -> impl Iterator<Item = PathBuf> {
    let mut candidates = vec![base.to_path_buf()];
    if cfg!(windows) && base.extension().is_none() {
        let extensions = extensions
            .and_then(OsStr::to_str)
            .unwrap_or(".COM;.EXE;.BAT;.CMD");
        candidates.extend(
            extensions
                .split(';')
                .filter(|ext| !ext.is_empty())
                .map(|ext| {
                    let mut name = OsString::from(base.as_os_str());
                    name.push(ext);
                    PathBuf::from(name)
                }),
        );
    }
    candidates.into_iter()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    path.metadata()
        .is_ok_and(|metadata| metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;

    fn install_fake(dir: &Path, name: &str) -> Result<PathBuf> {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n")?;
        #[cfg(unix)]
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }

    #[test]
    fn find_in_searches_each_directory() -> Result<()> {
        let first = tempfile::tempdir()?;
        let second = tempfile::tempdir()?;
        let installed = install_fake(second.path(), "xmake")?;
        let search = env::join_paths([first.path(), second.path()])?;

        assert_eq!(find_in("xmake", &search, None), Some(installed));
        assert_eq!(find_in("git-not-here", &search, None), None);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_files_do_not_count() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("git");
        fs::write(&path, "")?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644))?;
        let search = env::join_paths([dir.path()])?;
        assert_eq!(find_in("git", &search, None), None);
        Ok(())
    }

    #[test]
    fn explicit_paths_skip_the_search() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let installed = install_fake(dir.path(), "tool")?;
        let search = OsString::new();
        let requested = installed.to_string_lossy().into_owned();
        assert_eq!(find_in(&requested, &search, None), Some(installed));
        Ok(())
    }

    #[test]
    fn check_required_names_every_missing_command() {
        let err = check_required(&[
            "trollkit-missing-one".to_string(),
            "trollkit-missing-two".to_string(),
        ])
        .expect_err("commands are absent");
        assert!(matches!(
            err,
            ToolchainError::MissingCommands { ref commands } if commands.len() == 2
        ));
    }

    #[test]
    fn empty_requirement_list_passes() -> Result<()> {
        assert!(check_required(&[])?.is_empty());
        Ok(())
    }
}
