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

//! Trollkit pipeline orchestration.
//!
//! Layout: `pipeline.rs` (step sequencing and run context), `error.rs`
//! (application errors and exit codes).

pub mod error;
pub mod pipeline;

pub use error::{AppError, AppResult, exit_code};
pub use pipeline::{Pipeline, RunReport, StepKind};
