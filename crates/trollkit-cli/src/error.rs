//! CLI error type and exit-code mapping.

use std::fmt::{self, Display, Formatter, Write as _};

use trollkit_app::{AppError, exit_code};

/// Errors surfaced to the operator.
#[derive(Debug)]
pub(crate) enum CliError {
    /// Invalid arguments or configuration, detected before the pipeline starts.
    Validation(String),
    /// The pipeline failed.
    Pipeline(AppError),
    /// Anything else.
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) fn exit_code(&self) -> i32 {
        let code = match self {
            Self::Validation(_) => exit_code::INVALID_CONFIG,
            Self::Pipeline(error) => error.exit_code(),
            Self::Failure(_) => exit_code::INTERNAL,
        };
        i32::from(code)
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Pipeline(error) => {
                let mut message = error.to_string();
                let mut source = std::error::Error::source(error);
                while let Some(cause) = source {
                    let _ = write!(message, ": {cause}");
                    source = cause.source();
                }
                for (label, value) in error.details() {
                    let _ = write!(message, "\n  {label}: {value}");
                }
                message
            }
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<AppError> for CliError {
    fn from(error: AppError) -> Self {
        Self::Pipeline(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use trollkit_config::ConfigError;

    #[test]
    fn pipeline_errors_keep_their_exit_code() {
        let error = CliError::from(AppError::Config {
            operation: "config.symbol_list",
            source: ConfigError::MissingSymbolList {
                path: PathBuf::from("symbols.txt"),
            },
        });
        assert_eq!(error.exit_code(), 11);
        let message = error.display_message();
        assert!(message.starts_with("configuration operation failed: symbol list file not found"));
        assert!(message.contains("path: symbols.txt"));
    }

    #[test]
    fn validation_errors_use_argument_exit_code() {
        let error = CliError::validation("--log-level must not be empty");
        assert_eq!(error.exit_code(), 2);
        assert_eq!(error.display_message(), "--log-level must not be empty");
    }
}
