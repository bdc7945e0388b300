//! Particle extraction and shape measurement.

use std::collections::HashMap;
use std::f64::consts::PI;

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::{arc_length, convex_hull};
use imageproc::point::Point;
use imageproc::region_labelling::{connected_components, Connectivity};

use super::{ShapeAnalyzer, ShapeParams, BACKGROUND, FOREGROUND};
use crate::calibration::Calibration;
use crate::descriptor::Morphometrics;

/// Default [`ShapeAnalyzer`] built on `imageproc` labeling and contour tracing.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParticleAnalyzer;

impl ShapeAnalyzer for ParticleAnalyzer {
    fn analyze(
        &self,
        mask: &GrayImage,
        calibration: &Calibration,
        params: &ShapeParams,
    ) -> Vec<Morphometrics> {
        collect_particles(mask)
            .iter()
            .map(|particle| particle.measure(calibration))
            .filter(|metrics| params.contains(metrics.area))
            .collect()
    }
}

/// Pixels of one 8-connected component and its bounding box.
#[derive(Debug)]
struct Particle {
    pixels: Vec<(u32, u32)>,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

impl Particle {
    fn new(x: u32, y: u32) -> Self {
        Self {
            pixels: vec![(x, y)],
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    fn push(&mut self, x: u32, y: u32) {
        self.pixels.push((x, y));
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// Particle alone in its bounding box, with a one-pixel background border
    /// so the contour tracer always sees a closed outline.
    fn crop(&self) -> GrayImage {
        let width = self.max_x - self.min_x + 3;
        let height = self.max_y - self.min_y + 3;
        let mut crop = GrayImage::from_pixel(width, height, Luma([BACKGROUND]));
        for &(x, y) in &self.pixels {
            crop.put_pixel(x - self.min_x + 1, y - self.min_y + 1, Luma([FOREGROUND]));
        }
        crop
    }

    fn measure(&self, calibration: &Calibration) -> Morphometrics {
        let pixel_count = self.pixels.len() as f64;

        let outline = outer_contour(&self.crop());
        let perimeter_px = if outline.len() > 1 {
            arc_length(&outline, true)
        } else {
            0.0
        };

        let circularity = if perimeter_px > 0.0 {
            (4.0 * PI * pixel_count / (perimeter_px * perimeter_px)).min(1.0)
        } else {
            0.0
        };

        let (major, minor) = self.ellipse_axes();

        let hull_area = if outline.len() >= 3 {
            polygon_area(&convex_hull(&outline[..]))
        } else {
            0.0
        };
        // Lines and single pixels have no enclosed area; treat them as solid.
        let solidity = if hull_area > 0.0 {
            polygon_area(&outline) / hull_area
        } else {
            1.0
        };

        Morphometrics {
            area: pixel_count * calibration.pixel_area(),
            perimeter: perimeter_px * calibration.pixel_size(),
            circularity,
            aspect_ratio: major / minor,
            roundness: 4.0 * pixel_count / (PI * major * major),
            solidity,
        }
    }

    /// Major and minor axis of the ellipse with the same second moments,
    /// scaled so its area equals the pixel count.
    fn ellipse_axes(&self) -> (f64, f64) {
        let n = self.pixels.len() as f64;
        let (sum_x, sum_y) = self
            .pixels
            .iter()
            .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x as f64, sy + y as f64));
        let (mean_x, mean_y) = (sum_x / n, sum_y / n);

        // Each pixel is a unit square, hence the 1/12 term.
        let (mut mu20, mut mu02, mut mu11) = (1.0 / 12.0, 1.0 / 12.0, 0.0);
        for &(x, y) in &self.pixels {
            let dx = x as f64 - mean_x;
            let dy = y as f64 - mean_y;
            mu20 += dx * dx / n;
            mu02 += dy * dy / n;
            mu11 += dx * dy / n;
        }

        let half_trace = (mu20 + mu02) / 2.0;
        let spread = (((mu20 - mu02) / 2.0).powi(2) + mu11 * mu11).sqrt();
        let major = 4.0 * (half_trace + spread).sqrt();
        let minor = 4.0 * (half_trace - spread).max(0.0).sqrt();

        let minor = minor.max(f64::EPSILON);
        let scale = (n / (PI / 4.0 * major * minor)).sqrt();
        (major * scale, minor * scale)
    }
}

/// Groups foreground pixels into particles, ordered by the raster position of
/// each particle's first pixel.
fn collect_particles(mask: &GrayImage) -> Vec<Particle> {
    let labels = connected_components(mask, Connectivity::Eight, Luma([BACKGROUND]));

    let mut index_of_label: HashMap<u32, usize> = HashMap::new();
    let mut particles: Vec<Particle> = Vec::new();

    for (x, y, label) in labels.enumerate_pixels() {
        let label = label.0[0];
        if label == 0 {
            continue;
        }
        match index_of_label.get(&label) {
            Some(&index) => particles[index].push(x, y),
            None => {
                index_of_label.insert(label, particles.len());
                particles.push(Particle::new(x, y));
            }
        }
    }

    particles
}

fn outer_contour(crop: &GrayImage) -> Vec<Point<i32>> {
    find_contours::<i32>(crop)
        .into_iter()
        .find(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .map(|contour| contour.points)
        .unwrap_or_default()
}

/// Shoelace area of a closed polygon.
fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice_area: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    (twice_area as f64).abs() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_area_of_square() {
        let square = [
            Point::new(0, 0),
            Point::new(4, 0),
            Point::new(4, 4),
            Point::new(0, 4),
        ];
        assert_eq!(polygon_area(&square), 16.0);
        assert_eq!(polygon_area(&square[..2]), 0.0);
    }

    #[test]
    fn particles_are_in_raster_order() {
        let mut mask = GrayImage::new(10, 10);
        // Second particle starts lower but further left.
        mask.put_pixel(7, 1, Luma([FOREGROUND]));
        mask.put_pixel(8, 1, Luma([FOREGROUND]));
        mask.put_pixel(1, 5, Luma([FOREGROUND]));

        let particles = collect_particles(&mask);
        assert_eq!(particles.len(), 2);
        assert_eq!(particles[0].pixels.len(), 2);
        assert_eq!(particles[1].pixels[0], (1, 5));
    }

    #[test]
    fn diagonal_pixels_form_one_particle() {
        let mut mask = GrayImage::new(5, 5);
        mask.put_pixel(1, 1, Luma([FOREGROUND]));
        mask.put_pixel(2, 2, Luma([FOREGROUND]));
        mask.put_pixel(3, 3, Luma([FOREGROUND]));

        assert_eq!(collect_particles(&mask).len(), 1);
    }
}
