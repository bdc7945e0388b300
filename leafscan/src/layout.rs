//! On-disk layout of a scan directory.
//!
//! ```text
//! <root>/
//!   scan_01.jpg ...          raw scans
//!   mask/mask_scan_01.jpg    inverted masks
//!   res/res_scan_01.csv      particle tables
//!   leafnumbers.csv          automatic counts
//!   leafnumbers_.csv         review ledger
//!   leafarea.csv             count and total area per scan
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const MASK_DIR: &str = "mask";
pub const RESULT_DIR: &str = "res";
pub const LEAF_NUMBERS_FILE: &str = "leafnumbers.csv";
pub const LEDGER_FILE: &str = "leafnumbers_.csv";
pub const AREA_SUMMARY_FILE: &str = "leafarea.csv";

/// Paths of every artifact derived from a scan directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanLayout {
    root: PathBuf,
}

impl ScanLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mask_dir(&self) -> PathBuf {
        self.root.join(MASK_DIR)
    }

    pub fn result_dir(&self) -> PathBuf {
        self.root.join(RESULT_DIR)
    }

    /// `mask/mask_<filename>`, keeping the scan's extension.
    pub fn mask_path(&self, filename: &str) -> PathBuf {
        self.mask_dir().join(format!("mask_{filename}"))
    }

    /// `res/res_<stem>.csv`.
    pub fn table_path(&self, filename: &str) -> PathBuf {
        let stem = Path::new(filename)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(filename);
        self.result_dir().join(format!("res_{stem}.csv"))
    }

    pub fn leaf_numbers_path(&self) -> PathBuf {
        self.root.join(LEAF_NUMBERS_FILE)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(LEDGER_FILE)
    }

    pub fn area_summary_path(&self) -> PathBuf {
        self.root.join(AREA_SUMMARY_FILE)
    }

    /// Creates `mask/` and `res/` if they do not exist.
    pub fn create_output_dirs(&self) -> Result<()> {
        for dir in [self.mask_dir(), self.result_dir()] {
            fs::create_dir_all(&dir).map_err(|source| Error::Io { path: dir, source })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_names_follow_scan_name() {
        let layout = ScanLayout::new("/scans");

        assert_eq!(
            layout.mask_path("葉 01.jpg"),
            PathBuf::from("/scans/mask/mask_葉 01.jpg")
        );
        assert_eq!(
            layout.table_path("葉 01.jpg"),
            PathBuf::from("/scans/res/res_葉 01.csv")
        );
        assert_eq!(
            layout.table_path("archive.tar.jpg"),
            PathBuf::from("/scans/res/res_archive.tar.csv")
        );
        assert_eq!(layout.ledger_path(), PathBuf::from("/scans/leafnumbers_.csv"));
    }

    #[test]
    fn create_output_dirs_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = ScanLayout::new(dir.path());

        layout.create_output_dirs().unwrap();
        layout.create_output_dirs().unwrap();

        assert!(layout.mask_dir().is_dir());
        assert!(layout.result_dir().is_dir());
    }
}
