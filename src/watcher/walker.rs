//! One-shot directory enumeration that seeds the watch table.
//!
//! The walk is depth-first, never follows symbolic links and never leaves the
//! root's filesystem. Directories created after it finishes are not watched.
//! A root that is itself a symbolic link is resolved first, so the root and
//! everything below it are registered under the same real path.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use super::backend::WatchBackend;
use super::registry::WatchRegistry;
use crate::error::WatcherError;
use crate::Result;

/// Outcome of the initial walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Directories registered.
    pub directories: usize,
    /// Non-directory entries passed over (files, symlinks, sockets).
    pub skipped: usize,
}

/// Register a watch for every directory under `root`, `root` included.
///
/// # Errors
///
/// Returns an error if any entry cannot be read or any watch cannot be
/// registered. The walk stops at the first failure.
pub fn walk_tree<B: WatchBackend>(
    root: &Path,
    registry: &mut WatchRegistry<B>,
) -> Result<WalkSummary> {
    let mut summary = WalkSummary::default();
    let resolved = resolve_root(root)?;
    let root: &Path = &resolved;

    tracing::info!(root = %root.display(), "Starting directory walk");

    let walker = WalkDir::new(root)
        .follow_links(false)
        .same_file_system(true);

    for entry in walker {
        let entry = entry.map_err(|e| WatcherError::Walk {
            path: e
                .path()
                .unwrap_or(root)
                .display()
                .to_string(),
            reason: e.to_string(),
        })?;

        if entry.file_type().is_dir() {
            registry.register(entry.path())?;
            summary.directories += 1;
        } else {
            summary.skipped += 1;
        }
    }

    tracing::info!(
        root = %root.display(),
        directories = summary.directories,
        skipped = summary.skipped,
        "Watching directories"
    );

    Ok(summary)
}

fn resolve_root(root: &Path) -> Result<Cow<'_, Path>> {
    match fs::symlink_metadata(root) {
        Ok(meta) if meta.file_type().is_symlink() => {
            let real = fs::canonicalize(root).map_err(|e| WatcherError::Walk {
                path: root.display().to_string(),
                reason: e.to_string(),
            })?;
            tracing::debug!(
                link = %root.display(),
                target = %real.display(),
                "Resolved symlinked root"
            );
            Ok(Cow::Owned(real))
        }
        // Anything else, including a missing root, is reported by the walk.
        _ => Ok(Cow::Borrowed(root)),
    }
}
