//! Segmentation and particle-analysis primitives.
//!
//! The measurement pipeline only depends on the [`Segmenter`] and
//! [`ShapeAnalyzer`] traits. The default implementations are:
//!
//! - [`HistogramThreshold`]: global threshold picked from the 8-bit histogram,
//!   dark pixels (leaves on a light scanner bed) become foreground.
//! - [`ParticleAnalyzer`]: 8-connected particles traced from the mask and
//!   described by area, perimeter, circularity, aspect ratio, roundness and
//!   solidity.

mod particles;
mod threshold;


use image::GrayImage;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::calibration::Calibration;
use crate::descriptor::Morphometrics;

pub use particles::ParticleAnalyzer;
pub use threshold::{histogram, minimum_threshold, otsu_threshold, HistogramThreshold};

/// Mask value for foreground (particle) pixels.
pub const FOREGROUND: u8 = 255;
/// Mask value for background pixels.
pub const BACKGROUND: u8 = 0;

/// Automatic threshold selection method.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum ThresholdMethod {
    /// Smooth the histogram until it has exactly two peaks and cut at the valley.
    #[default]
    Minimum,
    /// Maximize between-class variance.
    Otsu,
}

/// Parameters handed to the [`Segmenter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentationParams {
    pub method: ThresholdMethod,
    /// Leave the black (0) bin out of the histogram.
    pub ignore_black: bool,
    /// Leave the white (255) bin out of the histogram.
    pub ignore_white: bool,
    /// Log the selected threshold for every image.
    pub log_threshold: bool,
}

impl Default for SegmentationParams {
    fn default() -> Self {
        Self {
            method: ThresholdMethod::Minimum,
            ignore_black: false,
            ignore_white: false,
            log_threshold: true,
        }
    }
}

/// Inclusive particle size bounds in calibrated area units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeParams {
    pub min_size: f64,
    pub max_size: f64,
}

impl ShapeParams {
    pub fn contains(&self, area: f64) -> bool {
        area >= self.min_size && area <= self.max_size
    }
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            min_size: 0.0,
            max_size: f64::INFINITY,
        }
    }
}

/// Binary mask produced by a [`Segmenter`].
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Selected gray level; pixels `<= threshold` are foreground.
    pub threshold: u8,
    /// [`FOREGROUND`] for particle pixels, [`BACKGROUND`] elsewhere.
    pub mask: GrayImage,
}

/// Threshold + region-to-mask conversion.
pub trait Segmenter {
    /// Returns `None` when the method cannot find a threshold for this image.
    fn segment(&self, gray: &GrayImage, params: &SegmentationParams) -> Option<Segmentation>;
}

/// Particle-shape measurement on a binary mask.
pub trait ShapeAnalyzer {
    /// Measures every particle whose calibrated area lies within `params`,
    /// in detection order.
    fn analyze(
        &self,
        mask: &GrayImage,
        calibration: &Calibration,
        params: &ShapeParams,
    ) -> Vec<Morphometrics>;
}
