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

//! Network access for the pipeline: artifact downloads and release lookup.
//!
//! Layout:
//! - `client.rs`: shared HTTP client construction
//! - `download.rs`: streaming downloads with progress events
//! - `release.rs`: release listing lookup and version derivation
//! - `error.rs`: error types

pub mod client;
pub mod download;
pub mod error;
pub mod release;

pub use client::build_client;
pub use download::{DownloadReport, DownloadTask, Downloader};
pub use error::{FetchError, FetchResult};
pub use release::{
    ReleaseAsset, ReleaseDescriptor, ReleaseRecord, derive_version, resolve_release,
    select_release,
};
