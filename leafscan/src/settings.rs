//! Run settings for measurement and review batches.

use std::fs;
use std::path::{Path, PathBuf};

use common::FileFormat;
use serde::{Deserialize, Serialize};

use crate::calibration::Calibration;
use crate::error::{Error, Result};
use crate::layout::ScanLayout;
use crate::segmentation::{SegmentationParams, ShapeParams, ThresholdMethod};

/// Settings for a scan directory.
///
/// Missing fields in a settings file take the defaults below, which describe
/// a 600 dpi scan measured in cm² with a 0.5 cm² minimum particle size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the scans.
    pub root: PathBuf,
    /// Pixels spanning `distance_units`.
    pub distance_px: f64,
    pub distance_units: f64,
    pub unit: String,
    /// Smallest particle kept, in calibrated area units.
    pub min_size: f64,
    /// Largest particle kept; unbounded when absent.
    pub max_size: Option<f64>,
    /// Wildcard selecting scan files inside `root`.
    pub pattern: String,
    pub threshold: ThresholdMethod,
    pub ignore_black: bool,
    pub ignore_white: bool,
    pub log_threshold: bool,
    /// Cluster count for leaf/noise separation; no filtering when absent.
    pub noise_clusters: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            distance_px: 600.0,
            distance_units: 2.54,
            unit: "cm".to_string(),
            min_size: 0.5,
            max_size: None,
            pattern: "*.jpg".to_string(),
            threshold: ThresholdMethod::Minimum,
            ignore_black: false,
            ignore_white: false,
            log_threshold: true,
            noise_clusters: None,
        }
    }
}

impl Settings {
    /// Loads settings from a `.yaml`/`.yml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let settings_error = |reason: String| Error::SettingsFile {
            path: path.to_path_buf(),
            reason,
        };

        let format = FileFormat::from_path(path).map_err(|e| settings_error(e.to_string()))?;
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings =
            common::deserialize(&text, format).map_err(|e| settings_error(e.to_string()))?;

        tracing::debug!(path = %path.display(), "Settings loaded");
        Ok(settings)
    }

    /// Checks values that would otherwise fail deep inside a batch.
    pub fn validate(&self) -> Result<()> {
        self.calibration().validate()?;
        if self.noise_clusters == Some(0) {
            return Err(Error::InvalidSettings {
                reason: "noise_clusters must be at least 1".to_string(),
            });
        }
        let shape = self.shape_params();
        if !(shape.min_size <= shape.max_size) {
            return Err(Error::InvalidSettings {
                reason: format!(
                    "min_size {} exceeds max_size {}",
                    shape.min_size, shape.max_size
                ),
            });
        }
        Ok(())
    }

    pub fn calibration(&self) -> Calibration {
        Calibration::new(self.distance_px, self.distance_units, self.unit.clone())
    }

    pub fn segmentation_params(&self) -> SegmentationParams {
        SegmentationParams {
            method: self.threshold,
            ignore_black: self.ignore_black,
            ignore_white: self.ignore_white,
            log_threshold: self.log_threshold,
        }
    }

    pub fn shape_params(&self) -> ShapeParams {
        ShapeParams {
            min_size: self.min_size,
            max_size: self.max_size.unwrap_or(f64::INFINITY),
        }
    }

    pub fn layout(&self) -> ScanLayout {
        ScanLayout::new(&self.root)
    }
}
