//! Synthetic scans and fixtures shared by unit tests.

use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};

use crate::descriptor::{Morphometrics, ShapeDescriptor};

/// Gray level of the scanner bed.
pub const PAPER: u8 = 230;
/// Gray level of leaf pixels.
pub const LEAF: u8 = 40;

/// Axis-aligned dark rectangle `(x, y, width, height)`.
pub type Rect = (u32, u32, u32, u32);

/// Light background with dark rectangles painted on it.
pub fn synthetic_scan(width: u32, height: u32, leaves: &[Rect]) -> GrayImage {
    let mut image = GrayImage::from_pixel(width, height, Luma([PAPER]));
    for &(x0, y0, w, h) in leaves {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                image.put_pixel(x, y, Luma([LEAF]));
            }
        }
    }
    image
}

/// Saves a synthetic scan as a lossless PNG in `dir`.
pub fn write_scan(dir: &Path, name: &str, leaves: &[Rect]) -> PathBuf {
    let path = dir.join(name);
    synthetic_scan(120, 80, leaves)
        .save(&path)
        .expect("Failed to save synthetic scan");
    path
}

/// Descriptor with the given area and simple derived values.
pub fn descriptor(filename: &str, area: f64) -> ShapeDescriptor {
    ShapeDescriptor::new(
        filename,
        Morphometrics {
            area,
            perimeter: area / 2.0,
            circularity: 0.5,
            aspect_ratio: 1.25,
            roundness: 0.8,
            solidity: 0.95,
        },
    )
    .expect("non-negative area")
}

pub fn descriptors(filename: &str, areas: &[f64]) -> Vec<ShapeDescriptor> {
    areas.iter().map(|&area| descriptor(filename, area)).collect()
}

pub fn areas(descriptors: &[ShapeDescriptor]) -> Vec<f64> {
    descriptors.iter().map(ShapeDescriptor::area).collect()
}
