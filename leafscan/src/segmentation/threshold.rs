//! Histogram-based global thresholding.

use image::GrayImage;

use super::{
    Segmentation, SegmentationParams, Segmenter, ThresholdMethod, BACKGROUND, FOREGROUND,
};

/// Gives up on bimodal smoothing after this many passes.
const MAX_SMOOTHING_PASSES: usize = 10_000;

/// Default [`Segmenter`]: global threshold from the gray-level histogram.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistogramThreshold;

impl Segmenter for HistogramThreshold {
    fn segment(&self, gray: &GrayImage, params: &SegmentationParams) -> Option<Segmentation> {
        let hist = histogram(gray, params.ignore_black, params.ignore_white);
        let threshold = match params.method {
            ThresholdMethod::Minimum => minimum_threshold(&hist),
            ThresholdMethod::Otsu if params.ignore_black || params.ignore_white => {
                otsu_threshold(&hist)
            }
            ThresholdMethod::Otsu => full_range_otsu(gray, &hist),
        }?;

        if params.log_threshold {
            tracing::info!(method = %params.method, threshold, "Threshold selected");
        }

        let mask = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            if gray.get_pixel(x, y).0[0] <= threshold {
                image::Luma([FOREGROUND])
            } else {
                image::Luma([BACKGROUND])
            }
        });

        Some(Segmentation { threshold, mask })
    }
}

/// 256-bin gray-level histogram, optionally dropping the extreme bins.
pub fn histogram(gray: &GrayImage, ignore_black: bool, ignore_white: bool) -> [u64; 256] {
    let mut hist = [0u64; 256];
    let counts = imageproc::stats::histogram(gray);
    for (bin, &count) in hist.iter_mut().zip(&counts.channels[0]) {
        *bin = u64::from(count);
    }
    if ignore_black {
        hist[0] = 0;
    }
    if ignore_white {
        hist[255] = 0;
    }
    hist
}

/// Histogram has exactly two strict local maxima.
fn is_bimodal(y: &[f64]) -> bool {
    let mut modes = 0;
    for k in 1..y.len() - 1 {
        if y[k - 1] < y[k] && y[k + 1] < y[k] {
            modes += 1;
            if modes > 2 {
                return false;
            }
        }
    }
    modes == 2
}

/// Three-point running mean; the end bins average with their only neighbour.
fn smooth(y: &[f64]) -> Vec<f64> {
    let last = y.len() - 1;
    let mut out = vec![0.0; y.len()];
    out[0] = (y[0] + y[1]) / 3.0;
    for i in 1..last {
        out[i] = (y[i - 1] + y[i] + y[i + 1]) / 3.0;
    }
    out[last] = (y[last - 1] + y[last]) / 3.0;
    out
}

/// Minimum method: smooth until bimodal, then take the valley between the peaks.
///
/// Returns `None` for empty histograms and for histograms that never become
/// bimodal (e.g. a single gray level).
pub fn minimum_threshold(hist: &[u64; 256]) -> Option<u8> {
    let max_bin = hist.iter().rposition(|&count| count > 0)?;

    let mut y: Vec<f64> = hist.iter().map(|&count| count as f64).collect();
    let mut passes = 0;
    while !is_bimodal(&y) {
        y = smooth(&y);
        passes += 1;
        if passes > MAX_SMOOTHING_PASSES {
            return None;
        }
    }

    (1..max_bin)
        .find(|&i| y[i - 1] > y[i] && y[i + 1] >= y[i])
        .map(|i| i as u8)
}

/// Otsu over the whole gray range via `imageproc`.
///
/// `otsu_level` answers 0 for single-level images, so those are rejected here
/// from the histogram.
fn full_range_otsu(gray: &GrayImage, hist: &[u64; 256]) -> Option<u8> {
    let occupied = hist.iter().filter(|&&count| count > 0).count();
    (occupied >= 2).then(|| imageproc::contrast::otsu_level(gray))
}

/// Otsu's method on a histogram. Class 0 is `[0, threshold]`.
///
/// Used when extreme bins are left out, which `otsu_level` cannot do.
/// Returns `None` when no split separates two non-empty classes.
pub fn otsu_threshold(hist: &[u64; 256]) -> Option<u8> {
    let total: u64 = hist.iter().sum();
    if total == 0 {
        return None;
    }
    let total_f = total as f64;
    let sum_all: f64 = hist
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut best: Option<(u8, f64)> = None;
    let mut weight_low = 0.0;
    let mut sum_low = 0.0;

    for (level, &count) in hist.iter().enumerate().take(255) {
        weight_low += count as f64;
        sum_low += level as f64 * count as f64;
        let weight_high = total_f - weight_low;
        if weight_low == 0.0 || weight_high == 0.0 {
            continue;
        }

        let mean_low = sum_low / weight_low;
        let mean_high = (sum_all - sum_low) / weight_high;
        let between = weight_low * weight_high * (mean_low - mean_high).powi(2);

        if best.is_none_or(|(_, best_between)| between > best_between) {
            best = Some((level as u8, between));
        }
    }

    best.map(|(level, _)| level)
}
