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

//! Configuration model for a trollkit pipeline run.
//!
//! Layout:
//! - `defaults.rs`: fixed endpoints, file names and tool arguments
//! - `model.rs`: the `PipelineConfig` value handed to the pipeline
//! - `loader.rs`: YAML override loading
//! - `validate.rs`: validation and path resolution
//! - `error.rs`: error types

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::load_from_path;
pub use model::{
    ArtifactSettings, EndpointSettings, HeaderSettings, PatchSettings, PipelineConfig,
    PreflightSettings, SourceSettings,
};
pub use validate::{resolve_symbol_list, validate};
