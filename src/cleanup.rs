//! Library sweep: remove icon files that fail validation

use crate::error::{Error, Result};
use crate::types::AssetKind;
use crate::validation::AssetValidator;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Counters for one sweep
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// `.svg` / `.png` files checked
    pub scanned: usize,
    /// Invalid files removed
    pub deleted: usize,
    /// Invalid files that could not be removed
    pub failed_deletes: usize,
}

/// Validate every icon file below `root` and delete the broken ones
///
/// Only files inside subdirectories are considered; anything sitting directly
/// in `root` is left alone. Files without an icon extension are ignored.
pub async fn sweep(root: &Path, validator: &dyn AssetValidator) -> Result<SweepReport> {
    use tokio::fs;

    let is_dir = fs::metadata(root)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    if !is_dir {
        return Err(Error::config(
            format!("icon directory {} does not exist", root.display()),
            "icon_dir",
        ));
    }

    let mut candidates = Vec::new();
    let mut entries = fs::read_dir(root).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await.map(|ft| ft.is_dir()).unwrap_or(false) {
            collect_icon_files(&entry.path(), &mut candidates).await;
        }
    }

    let mut report = SweepReport::default();
    for (path, kind) in candidates {
        report.scanned += 1;
        if validator.is_valid(&path, kind) {
            continue;
        }
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!(?path, %kind, "deleted invalid icon file");
                report.deleted += 1;
            }
            Err(e) => {
                warn!(?path, error = %e, "failed to delete invalid icon file");
                report.failed_deletes += 1;
            }
        }
    }

    info!(
        root = ?root,
        scanned = report.scanned,
        deleted = report.deleted,
        failed_deletes = report.failed_deletes,
        "sweep complete"
    );
    Ok(report)
}

/// Recursively collect `.svg` / `.png` files under `path`
fn collect_icon_files<'a>(
    path: &'a Path,
    found: &'a mut Vec<(PathBuf, AssetKind)>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
    Box::pin(async move {
        let mut entries = match tokio::fs::read_dir(path).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(?path, error = %e, "failed to read directory during sweep");
                return;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let entry_path = entry.path();
            let file_type = match entry.file_type().await {
                Ok(ft) => ft,
                Err(_) => continue,
            };

            if file_type.is_dir() {
                collect_icon_files(&entry_path, found).await;
            } else if file_type.is_file()
                && let Some(kind) = AssetKind::from_path(&entry_path)
            {
                found.push((entry_path, kind));
            } else {
                debug!(path = ?entry_path, "not an icon file");
            }
        }
    })
}
