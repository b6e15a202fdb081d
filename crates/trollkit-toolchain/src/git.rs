//! Source acquisition through `git clone`.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{ToolchainError, ToolchainResult};
use crate::runner::{CommandRunner, CommandSpec};

const STEP: &str = "clone_source";

/// Repository branch cloned into the workspace.
#[derive(Debug, Clone, Copy)]
pub struct SourceCheckout<'a> {
    /// Remote repository URL.
    pub repo_url: &'a str,
    /// Branch to check out.
    pub branch: &'a str,
    /// Directory name created inside the workspace.
    pub directory: &'a str,
}

impl SourceCheckout<'_> {
    /// `git clone -b <branch> <url> <directory>` run inside `workspace`.
    #[must_use]
    pub fn command(&self, workspace: &Path) -> CommandSpec {
        CommandSpec::new(STEP, "git", workspace).args([
            "clone",
            "-b",
            self.branch,
            self.repo_url,
            self.directory,
        ])
    }
}

/// Clone the checkout into `workspace` and return the repository directory.
///
/// # Errors
///
/// Propagates runner failures, and returns [`ToolchainError::MissingOutput`]
/// when git succeeded without creating the directory.
pub async fn clone_branch(
    runner: &dyn CommandRunner,
    checkout: &SourceCheckout<'_>,
    workspace: &Path,
) -> ToolchainResult<PathBuf> {
    runner.run(&checkout.command(workspace)).await?;

    let repo_dir = workspace.join(checkout.directory);
    if !repo_dir.is_dir() {
        return Err(ToolchainError::MissingOutput {
            step: STEP,
            path: repo_dir,
        });
    }
    info!(
        branch = checkout.branch,
        repo_dir = %repo_dir.display(),
        "cloned source repository"
    );
    Ok(repo_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::SystemRunner;
    use anyhow::Result;
    use std::ffi::OsString;
    use trollkit_test_support::fixtures::program_available;

    const CHECKOUT: SourceCheckout<'static> = SourceCheckout {
        repo_url: "https://github.com/LiteLDev/LeviLamina.git",
        branch: "header",
        directory: "LeviLamina",
    };

    #[test]
    fn command_follows_clone_contract() {
        let spec = CHECKOUT.command(Path::new("/work"));
        assert_eq!(spec.program, OsString::from("git"));
        assert_eq!(
            spec.args,
            ["clone", "-b", "header", "https://github.com/LiteLDev/LeviLamina.git", "LeviLamina"]
                .map(OsString::from)
        );
        assert_eq!(spec.cwd, PathBuf::from("/work"));
        assert_eq!(spec.step, "clone_source");
    }

    #[tokio::test]
    async fn cloning_an_unreachable_repository_fails() -> Result<()> {
        if !program_available("git") {
            return Ok(());
        }
        let workspace = tempfile::tempdir()?;
        let origin = workspace.path().join("no-such-origin");
        let origin = origin.to_string_lossy();
        let checkout = SourceCheckout {
            repo_url: &origin,
            branch: "header",
            directory: "LeviLamina",
        };
        let err = clone_branch(&SystemRunner, &checkout, workspace.path())
            .await
            .expect_err("clone must fail");
        assert!(matches!(
            err,
            ToolchainError::CommandFailed {
                step: "clone_source",
                ..
            }
        ));
        assert!(!workspace.path().join("LeviLamina").exists());
        Ok(())
    }
}
