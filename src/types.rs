//! Core types for icon-dl

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Variant assigned when a detail-page URL carries no style tag
pub const DEFAULT_VARIANT: &str = "normal";

/// Identity of one icon variant, derived from its detail-page URL
///
/// `(base_name, variant)` decides where the files land; the same pair may
/// appear more than once in a run, later occurrences simply re-validate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetIdentity {
    /// Site-assigned numeric identifier (kept as text)
    pub numeric_id: String,
    /// Lowercased icon name with trailing underscores and the configured prefix removed
    pub base_name: String,
    /// Style tag, or [`DEFAULT_VARIANT`]
    pub variant: String,
}

impl AssetIdentity {
    /// Folder holding every variant of this icon: `<root>/<base_name>`
    pub fn folder(&self, root: &Path) -> PathBuf {
        root.join(&self.base_name)
    }

    /// Destination of one file of the pair: `<root>/<base_name>/<variant>.<ext>`
    pub fn path(&self, root: &Path, kind: AssetKind) -> PathBuf {
        self.folder(root)
            .join(format!("{}.{}", self.variant, kind.extension()))
    }

    /// Destination of the SVG file
    pub fn vector_path(&self, root: &Path) -> PathBuf {
        self.path(root, AssetKind::Vector)
    }

    /// Destination of the PNG file
    pub fn raster_path(&self, root: &Path) -> PathBuf {
        self.path(root, AssetKind::Raster)
    }
}

impl std::fmt::Display for AssetIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.base_name, self.variant)
    }
}

/// File format of one half of an asset pair
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// PNG bitmap
    Raster,
    /// SVG document
    Vector,
}

impl AssetKind {
    /// File extension used on disk
    pub fn extension(self) -> &'static str {
        match self {
            AssetKind::Raster => "png",
            AssetKind::Vector => "svg",
        }
    }

    /// Kind of a file judged by its extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("png") {
            Some(AssetKind::Raster)
        } else if ext.eq_ignore_ascii_case("svg") {
            Some(AssetKind::Vector)
        } else {
            None
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Terminal state of [`IconDownloader::process`](crate::IconDownloader::process)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// A fresh, valid pair was written
    Success,
    /// A valid pair was already on disk; nothing was requested
    Skipped,
    /// The site refused the icon as premium content; no files are left behind
    PremiumSkipped,
    /// Every attempt produced a missing or corrupted file
    Failed,
}

/// Counters for one batch run
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// URLs handed to the run
    pub total: usize,
    /// Pairs downloaded and validated
    pub succeeded: usize,
    /// Pairs already valid on disk
    pub skipped: usize,
    /// Premium icons abandoned
    pub premium: usize,
    /// Pairs that exhausted their attempts
    pub failed: usize,
    /// URLs that did not match the identifier pattern
    pub unparseable: usize,
    /// Whether the run stopped early on an interruption
    pub interrupted: bool,
}

impl RunSummary {
    /// Record the outcome of one asset
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.succeeded += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::PremiumSkipped => self.premium += 1,
            Outcome::Failed => self.failed += 1,
        }
    }

    /// URLs that reached a terminal state (including unparseable ones)
    pub fn processed(&self) -> usize {
        self.succeeded + self.skipped + self.premium + self.failed + self.unparseable
    }
}
