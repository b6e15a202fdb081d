//! Process execution seam.
//!
//! # Design
//! - Every invocation carries an explicit working directory; the process cwd
//!   is never consulted or changed.
//! - Output is captured and the exit status is always inspected.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::error::{ToolchainError, ToolchainResult};

/// One external command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Pipeline step the command belongs to.
    pub step: &'static str,
    /// Program to launch.
    pub program: OsString,
    /// Arguments, in order.
    pub args: Vec<OsString>,
    /// Working directory of the child process.
    pub cwd: PathBuf,
}

impl CommandSpec {
    /// Start a command for `step` running `program` inside `cwd`.
    #[must_use]
    pub fn new(step: &'static str, program: impl Into<OsString>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            step,
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    /// Append arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Program name for logs and errors.
    #[must_use]
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

/// Runs external commands on behalf of the pipeline.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `spec` to completion.
    ///
    /// # Errors
    ///
    /// Implementations return [`ToolchainError::Spawn`] when the program cannot
    /// start and [`ToolchainError::CommandFailed`] on a non-zero exit.
    async fn run(&self, spec: &CommandSpec) -> ToolchainResult<CommandOutput>;
}

/// [`CommandRunner`] backed by real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> ToolchainResult<CommandOutput> {
        let program = spec.program_name();
        info!(
            step = spec.step,
            program = %program,
            args = ?spec.args,
            cwd = %spec.cwd.display(),
            "running external tool"
        );

        let output = Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ToolchainError::Spawn {
                step: spec.step,
                program: program.clone(),
                source,
            })?;

        let captured = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !output.status.success() {
            error!(
                step = spec.step,
                program = %program,
                code = ?output.status.code(),
                "external tool failed"
            );
            return Err(ToolchainError::CommandFailed {
                step: spec.step,
                program,
                code: output.status.code(),
                stderr: captured.stderr,
            });
        }

        debug!(step = spec.step, stdout = %captured.stdout.trim_end(), "external tool output");
        Ok(captured)
    }
}
