//! Leafscan - leaf area and leaf count measurement from scanned plant images.
//!
//! A batch runs in three passes over one scan directory:
//! - `measure`: threshold each scan, measure its particles, optionally drop
//!   noise by clustering particle areas, and save a mask and a result table
//! - `check`: show each mask to the operator, cut tables down to the confirmed
//!   leaf count and write the review ledger
//! - `summarize`: total count and area per scan
//!
//! ```rust,ignore
//! use leafscan::{AutoConfirm, BatchRunner, CountReconciler, ExpectedCount, Settings};
//!
//! let runner = BatchRunner::new(Settings::load("scans.yaml".as_ref())?);
//! runner.measure_all()?;
//! let reconciler = CountReconciler::new(runner.layout().clone(), ExpectedCount::Automatic);
//! runner.review(&reconciler, &mut AutoConfirm)?;
//! runner.summarize()?;
//! ```

mod batch;
mod calibration;
mod cluster;
mod descriptor;
mod error;
mod layout;
mod measure;
mod noise_filter;
mod reconcile;
pub mod segmentation;
mod settings;
pub mod store;

#[cfg(test)]
mod testing;

pub use batch::{BatchRunner, MeasureReport, MeasuredScan};
pub use calibration::Calibration;
pub use cluster::{kmeans, Clustering};
pub use descriptor::{rank_by_area, Morphometrics, ShapeDescriptor};
pub use error::{Error, Result};
pub use layout::ScanLayout;
pub use measure::{Measurer, SegmentationResult};
pub use noise_filter::{filter_noise, split_noise, NoiseSplit, DEFAULT_CLUSTERS};
pub use reconcile::{
    AutoConfirm, CountAnswer, CountReconciler, CountRequest, ExpectedCount, MaskView,
    PromptResponse, Prompter, ReviewOutcome, ReviewState, ScriptedPrompter, TerminalPrompter,
    ViewTracker,
};
pub use settings::Settings;
