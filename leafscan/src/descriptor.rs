//! Per-particle shape descriptors.

/// Measured attributes of one particle, in calibrated units.
///
/// `circularity`, `roundness` and `solidity` are conventionally in `[0, 1]`
/// but are carried as measured.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Morphometrics {
    pub area: f64,
    pub perimeter: f64,
    pub circularity: f64,
    pub aspect_ratio: f64,
    pub roundness: f64,
    pub solidity: f64,
}

impl Morphometrics {
    /// Values in result-table column order.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.area,
            self.perimeter,
            self.circularity,
            self.aspect_ratio,
            self.roundness,
            self.solidity,
        ]
    }

    pub fn from_array(values: [f64; 6]) -> Self {
        let [area, perimeter, circularity, aspect_ratio, roundness, solidity] = values;
        Self {
            area,
            perimeter,
            circularity,
            aspect_ratio,
            roundness,
            solidity,
        }
    }
}

/// One detected particle tagged with the scan it came from.
///
/// Descriptors are never edited; corrections produce a new, shorter list.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDescriptor {
    filename: String,
    metrics: Morphometrics,
}

impl ShapeDescriptor {
    /// Returns `None` when `area` is negative or NaN.
    pub fn new(filename: impl Into<String>, metrics: Morphometrics) -> Option<Self> {
        if metrics.area >= 0.0 {
            Some(Self {
                filename: filename.into(),
                metrics,
            })
        } else {
            None
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn metrics(&self) -> &Morphometrics {
        &self.metrics
    }

    pub fn area(&self) -> f64 {
        self.metrics.area
    }
}

/// Re-ranks descriptors by descending area and keeps the first `keep`.
///
/// The sort is stable, so equal areas keep their original relative order.
pub fn rank_by_area(mut descriptors: Vec<ShapeDescriptor>, keep: usize) -> Vec<ShapeDescriptor> {
    descriptors.sort_by(|a, b| b.area().total_cmp(&a.area()));
    descriptors.truncate(keep);
    descriptors
}
