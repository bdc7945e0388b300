//! Scan measurement: calibrated image in, particle descriptors out.

use std::path::{Path, PathBuf};

use image::GrayImage;

use crate::calibration::Calibration;
use crate::descriptor::ShapeDescriptor;
use crate::error::{Error, Result};
use crate::segmentation::{
    HistogramThreshold, ParticleAnalyzer, SegmentationParams, Segmenter, ShapeAnalyzer,
    ShapeParams,
};

/// Output of measuring one scan.
///
/// Descriptors are in detection order. The mask is owned here until it is
/// saved; [`SegmentationResult::into_descriptors`] drops it.
#[derive(Debug, Clone)]
pub struct SegmentationResult {
    filename: String,
    threshold: u8,
    mask: GrayImage,
    descriptors: Vec<ShapeDescriptor>,
}

impl SegmentationResult {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn mask(&self) -> &GrayImage {
        &self.mask
    }

    pub fn descriptors(&self) -> &[ShapeDescriptor] {
        &self.descriptors
    }

    pub fn particle_count(&self) -> usize {
        self.descriptors.len()
    }

    /// Saves the mask with inverted polarity: particles dark, background light.
    pub fn save_mask(&self, path: &Path) -> Result<()> {
        let mut inverted = self.mask.clone();
        image::imageops::invert(&mut inverted);
        inverted.save(path).map_err(|source| Error::MaskSave {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Mask image saved");
        Ok(())
    }

    pub fn into_descriptors(self) -> Vec<ShapeDescriptor> {
        self.descriptors
    }
}

/// File name component of `path` as UTF-8 text.
///
/// File names are carried as `String` everywhere (tables, ledger, derived
/// mask/result names), so names that are not valid UTF-8 are rejected up front.
pub fn file_name_of(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_owned)
        .ok_or_else(|| Error::FileName {
            path: path.to_path_buf(),
        })
}

/// Runs segmentation and particle analysis on scans.
#[derive(Debug, Clone, Default)]
pub struct Measurer<S = HistogramThreshold, A = ParticleAnalyzer> {
    segmenter: S,
    analyzer: A,
}

impl Measurer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<S: Segmenter, A: ShapeAnalyzer> Measurer<S, A> {
    pub fn with_primitives(segmenter: S, analyzer: A) -> Self {
        Self {
            segmenter,
            analyzer,
        }
    }

    /// Measures one scan.
    ///
    /// The calibration is validated before the image is opened. The image is
    /// converted to 8-bit gray before thresholding; color is discarded.
    /// A particle reported with a negative or NaN area fails the scan with
    /// [`Error::InvalidParticle`] so the descriptor count always matches the
    /// analyzer's particle count.
    pub fn measure(
        &self,
        image_path: &Path,
        calibration: &Calibration,
        segmentation: &SegmentationParams,
        shape: &ShapeParams,
    ) -> Result<SegmentationResult> {
        calibration.validate()?;
        let filename = file_name_of(image_path)?;

        tracing::info!(path = %image_path.display(), "Input file");
        let gray = image::open(image_path)
            .map_err(|source| Error::ImageLoad {
                path: image_path.to_path_buf(),
                source,
            })?
            .to_luma8();

        let segmented =
            self.segmenter
                .segment(&gray, segmentation)
                .ok_or_else(|| Error::ThresholdFailed {
                    path: PathBuf::from(image_path),
                    method: segmentation.method.to_string(),
                })?;
        drop(gray);

        let descriptors = self
            .analyzer
            .analyze(&segmented.mask, calibration, shape)
            .into_iter()
            .enumerate()
            .map(|(index, metrics)| {
                ShapeDescriptor::new(filename.as_str(), metrics).ok_or_else(|| {
                    Error::InvalidParticle {
                        path: image_path.to_path_buf(),
                        index,
                        area: metrics.area,
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            filename = %filename,
            particles = descriptors.len(),
            "Particles measured"
        );

        Ok(SegmentationResult {
            filename,
            threshold: segmented.threshold,
            mask: segmented.mask,
            descriptors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Morphometrics;
    use crate::segmentation::{Segmentation, ThresholdMethod, FOREGROUND};
    use crate::testing::write_scan;
    use common::EPSILON;

    fn quiet_params() -> SegmentationParams {
        SegmentationParams {
            log_threshold: false,
            ..Default::default()
        }
    }

    #[test]
    fn measure_reports_particles_with_filename() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scan(dir.path(), "Blätter_01.png", &[(10, 10, 20, 10), (60, 40, 5, 5)]);

        let result = Measurer::new()
            .measure(
                &path,
                &Calibration::pixels(),
                &quiet_params(),
                &ShapeParams::default(),
            )
            .unwrap();

        assert_eq!(result.filename(), "Blätter_01.png");
        assert_eq!(result.particle_count(), 2);
        assert!(result
            .descriptors()
            .iter()
            .all(|d| d.filename() == "Blätter_01.png"));
        assert!((result.descriptors()[0].area() - 200.0).abs() < EPSILON);
        assert!(result.threshold() > 0);
    }

    #[test]
    fn measure_converts_color_scans_to_gray() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("color.png");
        let mut rgb = image::RgbImage::from_pixel(40, 30, image::Rgb([235, 240, 230]));
        for y in 5..15 {
            for x in 5..15 {
                rgb.put_pixel(x, y, image::Rgb([20, 90, 30]));
            }
        }
        rgb.save(&path).unwrap();

        let result = Measurer::new()
            .measure(
                &path,
                &Calibration::pixels(),
                &quiet_params(),
                &ShapeParams::default(),
            )
            .unwrap();

        assert_eq!(result.particle_count(), 1);
        assert!((result.descriptors()[0].area() - 100.0).abs() < EPSILON);
    }

    #[test]
    fn invalid_calibration_fails_before_opening_image() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");

        let err = Measurer::new()
            .measure(
                &missing,
                &Calibration::new(0.0, 2.54, "cm"),
                &quiet_params(),
                &ShapeParams::default(),
            )
            .unwrap_err();

        assert!(matches!(err, Error::InvalidCalibration { .. }));
    }

    #[test]
    fn unreadable_image_is_image_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.png");
        std::fs::write(&bogus, b"not an image").unwrap();

        for path in [bogus, dir.path().join("missing.png")] {
            let err = Measurer::new()
                .measure(
                    &path,
                    &Calibration::default(),
                    &quiet_params(),
                    &ShapeParams::default(),
                )
                .unwrap_err();
            assert!(matches!(err, Error::ImageLoad { .. }), "{err}");
        }
    }

    #[test]
    fn blank_scan_fails_threshold_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scan(dir.path(), "blank.png", &[]);

        let err = Measurer::new()
            .measure(
                &path,
                &Calibration::default(),
                &quiet_params(),
                &ShapeParams::default(),
            )
            .unwrap_err();

        assert!(matches!(err, Error::ThresholdFailed { .. }));
    }

    struct FixedSegmenter;

    impl Segmenter for FixedSegmenter {
        fn segment(&self, gray: &GrayImage, _: &SegmentationParams) -> Option<Segmentation> {
            Some(Segmentation {
                threshold: 128,
                mask: GrayImage::from_pixel(gray.width(), gray.height(), image::Luma([FOREGROUND])),
            })
        }
    }

    struct FixedAnalyzer(Vec<f64>);

    impl ShapeAnalyzer for FixedAnalyzer {
        fn analyze(&self, _: &GrayImage, _: &Calibration, _: &ShapeParams) -> Vec<Morphometrics> {
            self.0
                .iter()
                .map(|&area| Morphometrics {
                    area,
                    ..Default::default()
                })
                .collect()
        }
    }

    #[test]
    fn measure_keeps_primitive_detection_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scan(dir.path(), "order.png", &[]);

        let measurer =
            Measurer::with_primitives(FixedSegmenter, FixedAnalyzer(vec![3.0, 9.0, 1.0]));
        let result = measurer
            .measure(
                &path,
                &Calibration::pixels(),
                &SegmentationParams {
                    method: ThresholdMethod::Otsu,
                    ..quiet_params()
                },
                &ShapeParams::default(),
            )
            .unwrap();

        let areas: Vec<f64> = result.descriptors().iter().map(|d| d.area()).collect();
        assert_eq!(areas, vec![3.0, 9.0, 1.0]);
        assert_eq!(result.threshold(), 128);
    }

    #[test]
    fn negative_particle_area_fails_the_scan() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scan(dir.path(), "broken.png", &[]);

        let measurer =
            Measurer::with_primitives(FixedSegmenter, FixedAnalyzer(vec![3.0, -1.0, 1.0]));
        let err = measurer
            .measure(
                &path,
                &Calibration::pixels(),
                &quiet_params(),
                &ShapeParams::default(),
            )
            .unwrap_err();

        match err {
            Error::InvalidParticle { index, area, .. } => {
                assert_eq!(index, 1);
                assert_eq!(area, -1.0);
            }
            other => panic!("expected an invalid particle, got {other}"),
        }
    }

    #[test]
    fn saved_mask_has_inverted_polarity() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_scan(dir.path(), "scan.png", &[(10, 10, 4, 4)]);
        let result = Measurer::new()
            .measure(
                &path,
                &Calibration::pixels(),
                &quiet_params(),
                &ShapeParams::default(),
            )
            .unwrap();

        let mask_path = dir.path().join("mask_scan.png");
        result.save_mask(&mask_path).unwrap();

        let saved = image::open(&mask_path).unwrap().to_luma8();
        assert_eq!(saved.get_pixel(11, 11).0[0], 0);
        assert_eq!(saved.get_pixel(0, 0).0[0], 255);
        // In-memory mask is untouched.
        assert_eq!(result.mask().get_pixel(11, 11).0[0], FOREGROUND);
    }
}
