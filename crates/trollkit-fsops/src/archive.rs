//! Zip extraction for downloaded distributions.
//!
//! Both entry points consume the archive: it is deleted once extraction
//! succeeds and left in place when extraction fails.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use tracing::{debug, info};
use zip::ZipArchive;
use zip::read::ZipFile;
use zip::result::ZipError;

use crate::error::{FsOpsError, FsOpsResult};

/// Extract every entry of `archive` below `target`, then delete the archive.
///
/// Returns the files written, in archive order. Existing files are overwritten.
///
/// # Errors
///
/// Returns [`FsOpsError::CorruptArchive`] when the archive cannot be decoded,
/// [`FsOpsError::InvalidInput`] for entries escaping `target`, and IO errors
/// for write failures.
pub fn extract_all(archive: &Path, target: &Path) -> FsOpsResult<Vec<PathBuf>> {
    let written = {
        let mut zip = open_archive(archive, "extract_all")?;
        let mut written = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let mut entry = zip
                .by_index(index)
                .map_err(|source| FsOpsError::zip("extract_all.read_entry", archive, source))?;
            let relative = sanitize_entry_path(entry.name())?;
            let destination = target.join(&relative);

            if entry.is_dir() {
                fs::create_dir_all(&destination).map_err(|source| {
                    FsOpsError::io("extract_all.create_dir", &destination, source)
                })?;
                continue;
            }

            write_entry(&mut entry, &destination, "extract_all")?;
            written.push(destination);
        }
        written
    };

    remove_archive(archive, "extract_all")?;
    info!(
        archive = %archive.display(),
        files = written.len(),
        "extracted archive"
    );
    Ok(written)
}

/// Extract the single entry named `member` into `target` and delete the archive.
///
/// The member is written as `target/<member>`; nothing else is extracted.
///
/// # Errors
///
/// Returns [`FsOpsError::MissingMember`] when the archive has no such entry,
/// [`FsOpsError::CorruptArchive`] when it cannot be decoded, and IO errors for
/// write failures.
pub fn extract_member(archive: &Path, member: &str, target: &Path) -> FsOpsResult<PathBuf> {
    let relative = sanitize_entry_path(member)?;
    let destination = target.join(relative);

    {
        let mut zip = open_archive(archive, "extract_member")?;
        let mut entry = match zip.by_name(member) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => {
                return Err(FsOpsError::MissingMember {
                    path: archive.to_path_buf(),
                    member: member.to_string(),
                });
            }
            Err(source) => return Err(FsOpsError::zip("extract_member.lookup", archive, source)),
        };
        write_entry(&mut entry, &destination, "extract_member")?;
    }

    remove_archive(archive, "extract_member")?;
    info!(
        archive = %archive.display(),
        member,
        destination = %destination.display(),
        "extracted archive member"
    );
    Ok(destination)
}

fn open_archive(archive: &Path, operation: &'static str) -> FsOpsResult<ZipArchive<File>> {
    let file = File::open(archive).map_err(|source| FsOpsError::io(operation, archive, source))?;
    ZipArchive::new(file).map_err(|source| FsOpsError::zip(operation, archive, source))
}

fn write_entry(entry: &mut ZipFile<'_>, destination: &Path, operation: &'static str) -> FsOpsResult<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|source| FsOpsError::io(operation, parent, source))?;
    }

    let mut output =
        File::create(destination).map_err(|source| FsOpsError::io(operation, destination, source))?;
    io::copy(entry, &mut output).map_err(|source| match source.kind() {
        // Decompression errors surface as InvalidData from the entry reader.
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => {
            FsOpsError::zip(operation, destination, ZipError::Io(source))
        }
        _ => FsOpsError::io(operation, destination, source),
    })?;

    #[cfg(unix)]
    if let Some(mode) = entry.unix_mode() {
        fs::set_permissions(destination, fs::Permissions::from_mode(mode))
            .map_err(|source| FsOpsError::io(operation, destination, source))?;
    }

    debug!(entry = entry.name(), destination = %destination.display(), "wrote archive entry");
    Ok(())
}

fn remove_archive(archive: &Path, operation: &'static str) -> FsOpsResult<()> {
    fs::remove_file(archive).map_err(|source| FsOpsError::io(operation, archive, source))
}

fn sanitize_entry_path(entry: &str) -> FsOpsResult<PathBuf> {
    let path = Path::new(entry);
    if path.is_absolute() {
        return Err(FsOpsError::InvalidInput {
            field: "archive_entry",
            reason: "absolute_path",
            value: Some(entry.to_string()),
        });
    }

    let mut sanitized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(segment) => sanitized.push(segment),
            Component::CurDir => {}
            _ => {
                return Err(FsOpsError::InvalidInput {
                    field: "archive_entry",
                    reason: "invalid_segment",
                    value: Some(entry.to_string()),
                });
            }
        }
    }

    if sanitized.as_os_str().is_empty() {
        return Err(FsOpsError::InvalidInput {
            field: "archive_entry",
            reason: "empty",
            value: Some(entry.to_string()),
        });
    }
    Ok(sanitized)
}
