#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Filesystem operations for a pipeline run.
//!
//! Layout:
//! - `workspace.rs`: destructive workspace reset
//! - `archive.rs`: zip extraction (full and single member)
//! - `headers.rs`: aggregate header generation
//! - `error.rs`: error types

pub mod archive;
pub mod error;
pub mod headers;
pub mod workspace;

pub use archive::{extract_all, extract_member};
pub use error::{FsOpsError, FsOpsResult, ZipError};
pub use headers::{HeaderAggregation, HeaderSummary, aggregate_headers};
pub use workspace::{Workspace, reset_workspace};
