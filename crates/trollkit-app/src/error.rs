//! # Design
//!
//! - Wrap each subsystem error with the operation that surfaced it.
//! - Keep messages constant; context lives in fields and in [`AppError::details`].
//! - Map every failure kind to a distinct process exit code.

use std::path::Path;

use thiserror::Error;
use tokio::task::JoinError;
use trollkit_config::ConfigError;
use trollkit_fetch::FetchError;
use trollkit_fsops::FsOpsError;
use trollkit_toolchain::ToolchainError;

/// Result alias for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Process exit codes, one per failure kind.
pub mod exit_code {
    /// The run produced its artifact.
    pub const SUCCESS: u8 = 0;
    /// Configuration or arguments were invalid.
    pub const INVALID_CONFIG: u8 = 2;
    /// A required external command is missing.
    pub const MISSING_COMMAND: u8 = 10;
    /// The symbol list file does not exist.
    pub const MISSING_SYMBOL_LIST: u8 = 11;
    /// No release matched the marker suffix.
    pub const NO_RELEASE: u8 = 20;
    /// An HTTP request failed or returned a non-success status.
    pub const TRANSPORT: u8 = 30;
    /// An external tool failed or could not be started.
    pub const EXTERNAL_TOOL: u8 = 40;
    /// A downloaded archive was corrupt or incomplete.
    pub const CORRUPT_ARCHIVE: u8 = 50;
    /// Any other filesystem failure.
    pub const FILESYSTEM: u8 = 60;
    /// The pipeline reached an inconsistent internal state.
    pub const INTERNAL: u8 = 70;
}

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration operations failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: ConfigError,
    },
    /// External tool operations failed.
    #[error("external tool operation failed")]
    Toolchain {
        /// Operation identifier.
        operation: &'static str,
        /// Source toolchain error.
        source: ToolchainError,
    },
    /// Network operations failed.
    #[error("network operation failed")]
    Fetch {
        /// Operation identifier.
        operation: &'static str,
        /// Source fetch error.
        source: FetchError,
    },
    /// Filesystem operations failed.
    #[error("filesystem operation failed")]
    FsOps {
        /// Operation identifier.
        operation: &'static str,
        /// Source fsops error.
        source: FsOpsError,
    },
    /// The release listing had no release tagged with the marker suffix.
    #[error("no matching release found")]
    NoRelease {
        /// Listing that was searched.
        listing_url: String,
        /// Tag suffix searched for.
        suffix: String,
    },
    /// A blocking filesystem task did not complete.
    #[error("blocking task failed")]
    Join {
        /// Operation identifier.
        operation: &'static str,
        /// Source join error.
        source: JoinError,
    },
    /// A step ran before the state it depends on was recorded.
    #[error("missing state")]
    MissingState {
        /// State field that was missing.
        field: &'static str,
    },
}

impl AppError {
    pub(crate) const fn config(operation: &'static str, source: ConfigError) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn toolchain(operation: &'static str, source: ToolchainError) -> Self {
        Self::Toolchain { operation, source }
    }

    pub(crate) const fn fetch(operation: &'static str, source: FetchError) -> Self {
        Self::Fetch { operation, source }
    }

    pub(crate) const fn fsops(operation: &'static str, source: FsOpsError) -> Self {
        Self::FsOps { operation, source }
    }

    /// Exit code the process should terminate with for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config {
                source: ConfigError::MissingSymbolList { .. },
                ..
            } => exit_code::MISSING_SYMBOL_LIST,
            Self::Config { .. } => exit_code::INVALID_CONFIG,
            Self::Toolchain { source, .. } => match source {
                ToolchainError::MissingCommands { .. } => exit_code::MISSING_COMMAND,
                ToolchainError::Spawn { .. }
                | ToolchainError::CommandFailed { .. }
                | ToolchainError::MissingOutput { .. } => exit_code::EXTERNAL_TOOL,
                ToolchainError::Io { .. } => exit_code::FILESYSTEM,
            },
            Self::Fetch { source, .. } => match source {
                FetchError::Client { .. } | FetchError::Http { .. } | FetchError::Status { .. } => {
                    exit_code::TRANSPORT
                }
                FetchError::Io { .. } => exit_code::FILESYSTEM,
            },
            Self::FsOps { source, .. } => match source {
                FsOpsError::CorruptArchive { .. } | FsOpsError::MissingMember { .. } => {
                    exit_code::CORRUPT_ARCHIVE
                }
                FsOpsError::Io { .. }
                | FsOpsError::Walkdir { .. }
                | FsOpsError::InvalidInput { .. } => exit_code::FILESYSTEM,
            },
            Self::NoRelease { .. } => exit_code::NO_RELEASE,
            Self::Join { .. } | Self::MissingState { .. } => exit_code::INTERNAL,
        }
    }

    /// Context fields worth showing to an operator, as `(label, value)` pairs.
    #[must_use]
    pub fn details(&self) -> Vec<(&'static str, String)> {
        let mut details = Vec::new();
        match self {
            Self::Config { operation, source } => {
                details.push(("operation", (*operation).to_string()));
                config_details(source, &mut details);
            }
            Self::Toolchain { operation, source } => {
                details.push(("operation", (*operation).to_string()));
                toolchain_details(source, &mut details);
            }
            Self::Fetch { operation, source } => {
                details.push(("operation", (*operation).to_string()));
                fetch_details(source, &mut details);
            }
            Self::FsOps { operation, source } => {
                details.push(("operation", (*operation).to_string()));
                fsops_details(source, &mut details);
            }
            Self::NoRelease {
                listing_url,
                suffix,
            } => {
                details.push(("listing", listing_url.clone()));
                details.push(("suffix", suffix.clone()));
            }
            Self::Join { operation, .. } => details.push(("operation", (*operation).to_string())),
            Self::MissingState { field } => details.push(("field", (*field).to_string())),
        }
        details
    }
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

fn config_details(source: &ConfigError, details: &mut Vec<(&'static str, String)>) {
    match source {
        ConfigError::Io { path, .. }
        | ConfigError::Yaml { path, .. }
        | ConfigError::MissingSymbolList { path } => details.push(("path", display_path(path))),
        ConfigError::InvalidField {
            section,
            field,
            reason,
            value,
        } => {
            details.push(("field", format!("{section}.{field}")));
            details.push(("reason", (*reason).to_string()));
            if let Some(value) = value {
                details.push(("value", value.clone()));
            }
        }
    }
}

fn toolchain_details(source: &ToolchainError, details: &mut Vec<(&'static str, String)>) {
    match source {
        ToolchainError::MissingCommands { commands } => {
            details.push(("commands", commands.join(", ")));
        }
        ToolchainError::Spawn { step, program, .. } => {
            details.push(("step", (*step).to_string()));
            details.push(("program", program.clone()));
        }
        ToolchainError::CommandFailed {
            step,
            program,
            code,
            stderr,
        } => {
            details.push(("step", (*step).to_string()));
            details.push(("program", program.clone()));
            details.push((
                "exit_code",
                code.map_or_else(|| "terminated by signal".to_string(), |code| code.to_string()),
            ));
            let stderr = stderr.trim();
            if !stderr.is_empty() {
                details.push(("stderr", stderr.to_string()));
            }
        }
        ToolchainError::MissingOutput { step, path } => {
            details.push(("step", (*step).to_string()));
            details.push(("path", display_path(path)));
        }
        ToolchainError::Io { path, .. } => details.push(("path", display_path(path))),
    }
}

fn fetch_details(source: &FetchError, details: &mut Vec<(&'static str, String)>) {
    match source {
        FetchError::Client { .. } => {}
        FetchError::Http { url, .. } => details.push(("url", url.clone())),
        FetchError::Status { url, status, .. } => {
            details.push(("url", url.clone()));
            details.push(("status", status.to_string()));
        }
        FetchError::Io { path, .. } => details.push(("path", display_path(path))),
    }
}

fn fsops_details(source: &FsOpsError, details: &mut Vec<(&'static str, String)>) {
    match source {
        FsOpsError::Io { path, .. } | FsOpsError::Walkdir { path, .. } => {
            details.push(("path", display_path(path)));
        }
        FsOpsError::CorruptArchive { path, .. } => {
            details.push(("archive", display_path(path)));
            details.push(("hint", "the download was likely truncated".to_string()));
        }
        FsOpsError::MissingMember { path, member } => {
            details.push(("archive", display_path(path)));
            details.push(("member", member.clone()));
        }
        FsOpsError::InvalidInput {
            field,
            reason,
            value,
        } => {
            details.push(("field", (*field).to_string()));
            details.push(("reason", (*reason).to_string()));
            if let Some(value) = value {
                details.push(("value", value.clone()));
            }
        }
    }
}
