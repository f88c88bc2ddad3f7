//! Utility functions for file operations

use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// Delete a file, treating "already gone" as success
///
/// Returns whether a file was actually removed.
pub async fn remove_file_if_exists(path: &Path) -> io::Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Delete every path in `paths`, logging failures instead of returning them
///
/// Used where a stale file must not survive but there is nothing better to do
/// than carry on if the filesystem refuses.
pub async fn remove_files(paths: &[&Path]) {
    for path in paths {
        match remove_file_if_exists(path).await {
            Ok(true) => debug!(?path, "removed file"),
            Ok(false) => {}
            Err(e) => warn!(?path, error = %e, "could not remove file"),
        }
    }
}

/// Whether a path exists, with I/O errors counted as "no"
pub async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
