//! Assertions over the icon library on disk

use icon_dl::{AssetKind, AssetValidator, FormatValidator};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Every `.svg` / `.png` file under `root`, sorted, relative to `root`
pub fn icon_files(root: &Path) -> Vec<PathBuf> {
    if !root.exists() {
        return Vec::new();
    }
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| AssetKind::from_path(entry.path()).is_some())
        .map(|entry| entry.path().strip_prefix(root).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}

/// Assert that both files of `<base>/<variant>` exist and validate
pub fn assert_pair_valid(root: &Path, base: &str, variant: &str) {
    for kind in [AssetKind::Vector, AssetKind::Raster] {
        let path = root.join(base).join(format!("{variant}.{}", kind.extension()));
        assert!(path.exists(), "{} is missing", path.display());
        assert!(
            FormatValidator.is_valid(&path, kind),
            "{} does not validate",
            path.display()
        );
    }
}

/// Assert that neither file of `<base>/<variant>` exists
pub fn assert_pair_absent(root: &Path, base: &str, variant: &str) {
    for ext in ["svg", "png"] {
        let path = root.join(base).join(format!("{variant}.{ext}"));
        assert!(!path.exists(), "{} should not exist", path.display());
    }
}
