//! # Design
//!
//! - Provide structured, constant-message errors for workspace and archive handling.
//! - Capture operation context (paths, members) to make failures reproducible in tests.
//! - Preserve source errors without interpolating context into error messages.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use zip::result::ZipError;

/// Result type for filesystem operations.
pub type FsOpsResult<T> = Result<T, FsOpsError>;

/// Errors produced by filesystem operations.
#[derive(Debug, Error)]
pub enum FsOpsError {
    /// IO failures while interacting with the filesystem.
    #[error("fsops io failure")]
    Io {
        /// Operation that triggered the IO failure.
        operation: &'static str,
        /// Path involved in the IO failure.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Walkdir traversal failures.
    #[error("fsops walkdir failure")]
    Walkdir {
        /// Operation that triggered the walkdir failure.
        operation: &'static str,
        /// Path involved in the walkdir failure.
        path: PathBuf,
        /// Underlying walkdir error.
        source: walkdir::Error,
    },
    /// The archive could not be decoded; usually a truncated download.
    #[error("archive is incomplete or corrupted")]
    CorruptArchive {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Archive that failed to decode.
        path: PathBuf,
        /// Underlying zip error.
        source: ZipError,
    },
    /// The requested member is not present in the archive.
    #[error("archive member not found")]
    MissingMember {
        /// Archive that was searched.
        path: PathBuf,
        /// Member name requested.
        member: String,
    },
    /// Input validation failures.
    #[error("fsops invalid input")]
    InvalidInput {
        /// Field that failed validation.
        field: &'static str,
        /// Static reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

impl FsOpsError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn walkdir(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: walkdir::Error,
    ) -> Self {
        Self::Walkdir {
            operation,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn zip(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: ZipError,
    ) -> Self {
        Self::CorruptArchive {
            operation,
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use walkdir::WalkDir;

    #[test]
    fn fsops_error_helpers_build_variants() -> Result<(), Box<dyn Error>> {
        let io_err = FsOpsError::io("read", "path", io::Error::other("io"));
        assert!(matches!(io_err, FsOpsError::Io { .. }));
        assert!(io_err.source().is_some());

        let temp = tempfile::tempdir()?;
        let missing = temp.path().join("missing");
        let walkdir_error = WalkDir::new(&missing)
            .into_iter()
            .next()
            .and_then(Result::err)
            .ok_or_else(|| io::Error::other("expected walkdir error"))?;
        let walk_err = FsOpsError::walkdir("walk", &missing, walkdir_error);
        assert!(matches!(walk_err, FsOpsError::Walkdir { .. }));
        assert!(walk_err.source().is_some());

        let corrupt = FsOpsError::zip(
            "decode",
            "archive.zip",
            ZipError::InvalidArchive("bad"),
        );
        assert!(matches!(corrupt, FsOpsError::CorruptArchive { .. }));
        assert_eq!(corrupt.to_string(), "archive is incomplete or corrupted");
        assert!(corrupt.source().is_some());
        Ok(())
    }
}
