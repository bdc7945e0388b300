//! Linear pixel-to-physical-unit calibration.

use crate::error::{Error, Result};

/// Scale applied uniformly to both image axes.
///
/// Expressed the way it is measured on a scan: `distance_px` pixels span
/// `distance_units` physical units (e.g. 600 px per 2.54 cm for a 600 dpi scan).
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    distance_px: f64,
    distance_units: f64,
    unit: String,
}

impl Calibration {
    pub fn new(distance_px: f64, distance_units: f64, unit: impl Into<String>) -> Self {
        Self {
            distance_px,
            distance_units,
            unit: unit.into(),
        }
    }

    /// Identity calibration: one unit per pixel.
    pub fn pixels() -> Self {
        Self::new(1.0, 1.0, "pixel")
    }

    /// Rejects calibrations that cannot produce finite, positive pixel sizes.
    pub fn validate(&self) -> Result<()> {
        if !(self.distance_px > 0.0 && self.distance_px.is_finite()) {
            return Err(Error::InvalidCalibration {
                reason: format!(
                    "pixel distance must be a positive finite number, got {}",
                    self.distance_px
                ),
            });
        }
        if !(self.distance_units > 0.0 && self.distance_units.is_finite()) {
            return Err(Error::InvalidCalibration {
                reason: format!(
                    "physical distance must be a positive finite number, got {}",
                    self.distance_units
                ),
            });
        }
        Ok(())
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Physical length of one pixel side.
    pub fn pixel_size(&self) -> f64 {
        self.distance_units / self.distance_px
    }

    /// Physical area covered by one pixel.
    pub fn pixel_area(&self) -> f64 {
        let size = self.pixel_size();
        size * size
    }
}

impl Default for Calibration {
    /// 600 dpi scan measured in centimetres.
    fn default() -> Self {
        Self::new(600.0, 2.54, "cm")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::EPSILON;

    #[test]
    fn default_is_600_dpi_in_cm() {
        let cal = Calibration::default();
        cal.validate().unwrap();
        assert!((cal.pixel_size() - 2.54 / 600.0).abs() < EPSILON);
        assert!((cal.pixel_area() - (2.54f64 / 600.0).powi(2)).abs() < 1e-12);
        assert_eq!(cal.unit(), "cm");
    }

    #[test]
    fn zero_pixel_distance_is_rejected() {
        let err = Calibration::new(0.0, 2.54, "cm").validate().unwrap_err();
        assert!(matches!(err, Error::InvalidCalibration { .. }));
    }

    #[test]
    fn non_finite_and_negative_values_are_rejected() {
        assert!(Calibration::new(f64::NAN, 2.54, "cm").validate().is_err());
        assert!(Calibration::new(-600.0, 2.54, "cm").validate().is_err());
        assert!(Calibration::new(600.0, 0.0, "cm").validate().is_err());
        assert!(Calibration::new(600.0, f64::INFINITY, "cm").validate().is_err());
    }
}
