//! # Design
//!
//! - Provide structured, constant-message errors for configuration handling.
//! - Capture the offending section, field and value without interpolating them.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO failures while reading configuration inputs.
    #[error("config io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// YAML parsing failures for the override file.
    #[error("config yaml failure")]
    Yaml {
        /// Path of the YAML document.
        path: PathBuf,
        /// Underlying YAML error.
        source: serde_yaml::Error,
    },
    /// A field failed validation.
    #[error("invalid configuration field")]
    InvalidField {
        /// Section containing the field.
        section: &'static str,
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
    /// The external symbol list does not exist.
    #[error("symbol list file not found")]
    MissingSymbolList {
        /// Path supplied by the caller.
        path: PathBuf,
    },
}

impl ConfigError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(
        section: &'static str,
        field: &'static str,
        reason: &'static str,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            section,
            field,
            reason,
            value: Some(value.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_helpers_build_variants() {
        let io_err = ConfigError::io("read", "trollkit.yaml", io::Error::other("io"));
        assert!(matches!(io_err, ConfigError::Io { .. }));
        assert!(io_err.source().is_some());
        assert_eq!(io_err.to_string(), "config io failure");

        let invalid = ConfigError::invalid("source", "branch", "empty", "");
        assert!(matches!(
            invalid,
            ConfigError::InvalidField {
                section: "source",
                field: "branch",
                reason: "empty",
                ..
            }
        ));
        assert!(invalid.source().is_none());
    }
}
