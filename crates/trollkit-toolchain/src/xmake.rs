//! Build metadata generation through `xmake project`.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ToolchainResult;
use crate::runner::{CommandRunner, CommandSpec};

const STEP: &str = "build_metadata";

/// `xmake project -y -P . -k compile_commands <build_dir>` run inside `repo_dir`.
#[must_use]
pub fn compile_commands_command(repo_dir: &Path, build_dir: &str) -> CommandSpec {
    CommandSpec::new(STEP, "xmake", repo_dir).args([
        "project",
        "-y",
        "-P",
        ".",
        "-k",
        "compile_commands",
        build_dir,
    ])
}

/// Generate `compile_commands.json` and return the directory it was written to.
///
/// # Errors
///
/// Propagates runner failures.
pub async fn generate_compile_commands(
    runner: &dyn CommandRunner,
    repo_dir: &Path,
    build_dir: &str,
) -> ToolchainResult<PathBuf> {
    runner.run(&compile_commands_command(repo_dir, build_dir)).await?;
    let output = repo_dir.join(build_dir);
    info!(build_dir = %output.display(), "generated compile commands");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn command_targets_compile_commands_generator() {
        let spec = compile_commands_command(Path::new("/work/LeviLamina"), "build");
        assert_eq!(spec.program, OsString::from("xmake"));
        assert_eq!(
            spec.args,
            ["project", "-y", "-P", ".", "-k", "compile_commands", "build"].map(OsString::from)
        );
        assert_eq!(spec.cwd, PathBuf::from("/work/LeviLamina"));
    }
}
