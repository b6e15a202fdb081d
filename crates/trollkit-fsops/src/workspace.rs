//! Destructive workspace reset.
//!
//! # Design
//! - The workspace is an explicit value handed to later steps; the process
//!   working directory is never changed.
//! - Read-only attributes are cleared before removal so no permission error escapes.
//! - Paths without a final component (filesystem roots, `.`, `..`) are refused.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use crate::error::{FsOpsError, FsOpsResult};

/// Root directory of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Absolute path of the workspace root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` against the workspace root.
    #[must_use]
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }
}

/// Delete `path` if it exists, recreate it empty, and return it as a workspace.
///
/// Everything below `path` is destroyed.
///
/// # Errors
///
/// Returns [`FsOpsError::InvalidInput`] for paths without a final component and
/// IO or traversal errors when the previous contents cannot be removed.
pub fn reset_workspace(path: &Path) -> FsOpsResult<Workspace> {
    if path.file_name().is_none() {
        return Err(FsOpsError::InvalidInput {
            field: "work_dir",
            reason: "no_final_component",
            value: Some(path.to_string_lossy().into_owned()),
        });
    }

    let root = std::path::absolute(path)
        .map_err(|source| FsOpsError::io("workspace.absolute", path, source))?;

    match fs::symlink_metadata(&root) {
        Ok(metadata) if metadata.is_dir() => {
            warn!(path = %root.display(), "removing existing workspace");
            clear_readonly_tree(&root)?;
            fs::remove_dir_all(&root)
                .map_err(|source| FsOpsError::io("workspace.remove_dir", &root, source))?;
        }
        Ok(metadata) => {
            warn!(path = %root.display(), "replacing file at workspace path");
            make_writable(&root, &metadata)
                .map_err(|source| FsOpsError::io("workspace.clear_readonly", &root, source))?;
            fs::remove_file(&root)
                .map_err(|source| FsOpsError::io("workspace.remove_file", &root, source))?;
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => return Err(FsOpsError::io("workspace.inspect", &root, source)),
    }

    fs::create_dir_all(&root)
        .map_err(|source| FsOpsError::io("workspace.create_dir", &root, source))?;
    info!(path = %root.display(), "workspace ready");
    Ok(Workspace { root })
}

fn clear_readonly_tree(root: &Path) -> FsOpsResult<()> {
    // Parents are yielded before their children, so directories become
    // writable before their entries need unlinking.
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|source| FsOpsError::walkdir("workspace.walk", root, source))?;
        if entry.file_type().is_symlink() {
            continue;
        }
        let metadata = entry
            .metadata()
            .map_err(|source| FsOpsError::walkdir("workspace.metadata", entry.path(), source))?;
        make_writable(entry.path(), &metadata)
            .map_err(|source| FsOpsError::io("workspace.clear_readonly", entry.path(), source))?;
    }
    Ok(())
}

#[cfg(unix)]
fn make_writable(path: &Path, metadata: &fs::Metadata) -> io::Result<()> {
    let mode = metadata.permissions().mode() & 0o7777;
    if mode & 0o200 != 0 {
        return Ok(());
    }
    fs::set_permissions(path, fs::Permissions::from_mode(mode | 0o200))
}

#[cfg(not(unix))]
fn make_writable(path: &Path, metadata: &fs::Metadata) -> io::Result<()> {
    let mut permissions = metadata.permissions();
    if !permissions.readonly() {
        return Ok(());
    }
    #[allow(clippy::permissions_set_readonly_false)]
    permissions.set_readonly(false);
    fs::set_permissions(path, permissions)
}
