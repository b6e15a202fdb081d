//! # Design
//!
//! - Provide structured, constant-message errors for network operations.
//! - Keep the URL and the failing operation as fields, never in the message.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for network operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors produced while talking to remote endpoints.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to build http client")]
    Client {
        /// Underlying client error.
        source: reqwest::Error,
    },
    /// Transport or decoding failures reported by the HTTP client.
    #[error("fetch http failure")]
    Http {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// URL being requested.
        url: String,
        /// Underlying client error.
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("fetch unexpected status")]
    Status {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// URL being requested.
        url: String,
        /// Status code returned by the server.
        status: u16,
    },
    /// IO failures while writing a download to disk.
    #[error("fetch io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
}

impl FetchError {
    pub(crate) fn http(operation: &'static str, url: &str, source: reqwest::Error) -> Self {
        Self::Http {
            operation,
            url: url.to_string(),
            source,
        }
    }

    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Status code carried by the error, if the server answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
