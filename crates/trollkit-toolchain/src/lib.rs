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

//! External tool invocation for a pipeline run.
//!
//! Layout:
//! - `preflight.rs`: resolving required commands on `PATH`
//! - `runner.rs`: the `CommandRunner` seam and its process-backed implementation
//! - `git.rs`, `xmake.rs`, `troll.rs`: argument contracts of each tool
//! - `error.rs`: error types

pub mod error;
pub mod git;
pub mod preflight;
pub mod runner;
pub mod troll;
pub mod xmake;

pub use error::{ToolchainError, ToolchainResult};
pub use git::{SourceCheckout, clone_branch};
pub use preflight::{CommandProbe, check_required, find_command, probe_commands};
pub use runner::{CommandOutput, CommandRunner, CommandSpec, SystemRunner};
pub use troll::{PatchInvocation, run_patch_tool};
pub use xmake::generate_compile_commands;
