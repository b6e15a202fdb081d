//! Test fixtures and environment helpers.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use zip::ZipWriter;
use zip::write::FileOptions;

/// Write a zip archive at `path` containing `entries` as `(name, contents)` pairs.
///
/// # Errors
///
/// Returns an error when the archive cannot be created or written.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = ZipWriter::new(file);
    for (name, contents) in entries {
        writer
            .start_file(*name, FileOptions::default())
            .with_context(|| format!("start entry {name}"))?;
        writer
            .write_all(contents)
            .with_context(|| format!("write entry {name}"))?;
    }
    writer.finish().context("finish archive")?;
    Ok(())
}

/// Encode `entries` as an in-memory zip archive, for serving from mock HTTP endpoints.
///
/// # Errors
///
/// Returns an error when the archive cannot be assembled.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, FileOptions::default())
            .with_context(|| format!("start entry {name}"))?;
        writer
            .write_all(contents)
            .with_context(|| format!("write entry {name}"))?;
    }
    Ok(writer.finish().context("finish archive")?.into_inner())
}

/// Returns `true` if `program` can be launched with `--version`.
#[must_use]
pub fn program_available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}
