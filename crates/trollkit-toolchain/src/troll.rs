//! Patch tool invocation.
//!
//! The tool is opaque: it receives the compile-commands directory, the
//! aggregate header, the server binary, an output directory and an output
//! name, plus an optional symbol list. It concatenates the output directory
//! and name as strings, so the directory argument keeps its trailing separator.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{ToolchainError, ToolchainResult};
use crate::runner::{CommandRunner, CommandSpec};

const STEP: &str = "generate_pdb";

/// Arguments for one patch tool run. Relative paths resolve against the
/// repository directory the tool runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchInvocation {
    /// Patch tool executable, relative to the repository directory.
    pub tool: String,
    /// Optional program the tool is launched through.
    pub runner: Option<String>,
    /// Compile-commands directory.
    pub compile_commands_dir: String,
    /// Aggregate header.
    pub header: String,
    /// Dedicated server executable.
    pub server_binary: String,
    /// Output directory, passed verbatim.
    pub output_dir: String,
    /// Output artifact name.
    pub output_name: String,
    /// Absolute path of an external symbol list.
    pub symbol_list: Option<PathBuf>,
}

impl PatchInvocation {
    /// Positional arguments handed to the tool itself.
    #[must_use]
    pub fn tool_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            &self.compile_commands_dir,
            &self.header,
            &self.server_binary,
            &self.output_dir,
            &self.output_name,
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        if let Some(symbol_list) = &self.symbol_list {
            args.push(symbol_list.clone().into_os_string());
        }
        args
    }

    /// Full command, including the runner prefix when one is configured.
    #[must_use]
    pub fn command(&self, repo_dir: &Path) -> CommandSpec {
        let tool = repo_dir.join(&self.tool);
        match &self.runner {
            Some(runner) => CommandSpec::new(STEP, runner.as_str(), repo_dir)
                .args(std::iter::once(tool.into_os_string()).chain(self.tool_args())),
            None => CommandSpec::new(STEP, tool, repo_dir).args(self.tool_args()),
        }
    }

    /// Where the tool writes its artifact.
    #[must_use]
    pub fn artifact_path(&self, repo_dir: &Path) -> PathBuf {
        repo_dir
            .join(&self.output_dir)
            .join(&self.output_name)
            .components()
            .collect()
    }
}

/// Run the patch tool and return the absolute path of the generated artifact.
///
/// # Errors
///
/// Propagates runner failures, and returns [`ToolchainError::MissingOutput`]
/// when the tool exits successfully without writing the artifact.
pub async fn run_patch_tool(
    runner: &dyn CommandRunner,
    invocation: &PatchInvocation,
    repo_dir: &Path,
) -> ToolchainResult<PathBuf> {
    runner.run(&invocation.command(repo_dir)).await?;

    let artifact = invocation.artifact_path(repo_dir);
    if !artifact.is_file() {
        return Err(ToolchainError::MissingOutput {
            step: STEP,
            path: artifact,
        });
    }
    let artifact = std::path::absolute(&artifact).map_err(|source| ToolchainError::Io {
        operation: "patch.absolute",
        path: artifact.clone(),
        source,
    })?;
    info!(artifact = %artifact.display(), "patch tool produced artifact");
    Ok(artifact)
}
