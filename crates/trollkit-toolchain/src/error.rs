//! # Design
//!
//! - Every failure names the pipeline step and program involved.
//! - Captured standard error travels with the error instead of being logged twice.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for toolchain operations.
pub type ToolchainResult<T> = Result<T, ToolchainError>;

/// Errors produced while resolving or running external tools.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// One or more required commands did not resolve on `PATH`.
    #[error("required command not found")]
    MissingCommands {
        /// Commands that could not be resolved.
        commands: Vec<String>,
    },
    /// The program could not be started.
    #[error("failed to start external tool")]
    Spawn {
        /// Pipeline step that launched the program.
        step: &'static str,
        /// Program that failed to start.
        program: String,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The program ran and exited unsuccessfully.
    #[error("external tool exited unsuccessfully")]
    CommandFailed {
        /// Pipeline step that launched the program.
        step: &'static str,
        /// Program that failed.
        program: String,
        /// Exit code, absent when terminated by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },
    /// The program succeeded but the expected output is missing.
    #[error("external tool did not produce expected output")]
    MissingOutput {
        /// Pipeline step that launched the program.
        step: &'static str,
        /// Output that was expected.
        path: PathBuf,
    },
    /// Resolving an output path failed.
    #[error("toolchain io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl ToolchainError {
    /// Pipeline step the error is attributed to, when it concerns a single step.
    #[must_use]
    pub const fn step(&self) -> Option<&'static str> {
        match self {
            Self::Spawn { step, .. }
            | Self::CommandFailed { step, .. }
            | Self::MissingOutput { step, .. } => Some(*step),
            Self::MissingCommands { .. } | Self::Io { .. } => None,
        }
    }
}
