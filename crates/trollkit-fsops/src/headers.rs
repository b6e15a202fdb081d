//! Aggregate header generation.
//!
//! # Design
//! - Include paths are relative to the source directory and always use `/`.
//! - Entries are sorted so the generated file is identical across platforms.
//! - The output is rewritten from scratch on every run.
//! - A header is any file whose name ends in `.<extension>`, including a file
//!   named exactly `.h`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;

use crate::error::{FsOpsError, FsOpsResult};

/// Inputs describing one aggregate header.
#[derive(Debug, Clone, Copy)]
pub struct HeaderAggregation<'a> {
    /// Repository root the other paths are relative to.
    pub root: &'a Path,
    /// Directory walked for headers.
    pub source_dir: &'a str,
    /// Aggregate header written.
    pub output: &'a str,
    /// Header file extension without the leading dot.
    pub extension: &'a str,
}

/// Result of writing an aggregate header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderSummary {
    /// Path of the generated file.
    pub output: PathBuf,
    /// Include paths written, in file order.
    pub includes: Vec<String>,
}

/// Write one `#include "<path>"` line per header found under the source directory.
///
/// # Errors
///
/// Returns [`FsOpsError::InvalidInput`] when the source directory is missing,
/// traversal errors while walking it, and IO errors when the output cannot be
/// written.
pub fn aggregate_headers(request: &HeaderAggregation<'_>) -> FsOpsResult<HeaderSummary> {
    let source_root = request.root.join(request.source_dir);
    if !source_root.is_dir() {
        return Err(FsOpsError::InvalidInput {
            field: "source_dir",
            reason: "not_a_directory",
            value: Some(source_root.to_string_lossy().into_owned()),
        });
    }
    let output = request.root.join(request.output);

    let suffix = format!(".{}", request.extension);
    let mut includes = Vec::new();
    for entry in WalkDir::new(&source_root).follow_links(false) {
        let entry = entry
            .map_err(|source| FsOpsError::walkdir("headers.walk", &source_root, source))?;
        if !entry.file_type().is_file()
            || !entry.file_name().to_string_lossy().ends_with(&suffix)
            || entry.path() == output
        {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(&source_root) {
            includes.push(include_path(relative));
        }
    }
    includes.sort();

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .map_err(|source| FsOpsError::io("headers.create_parent", parent, source))?;
    }
    let file =
        File::create(&output).map_err(|source| FsOpsError::io("headers.create", &output, source))?;
    let mut writer = BufWriter::new(file);
    for include in &includes {
        writeln!(writer, "#include \"{include}\"")
            .map_err(|source| FsOpsError::io("headers.write", &output, source))?;
    }
    writer
        .flush()
        .map_err(|source| FsOpsError::io("headers.flush", &output, source))?;

    info!(
        output = %output.display(),
        headers = includes.len(),
        "generated aggregate header"
    );
    Ok(HeaderSummary { output, includes })
}

fn include_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
