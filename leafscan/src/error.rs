use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreError;

/// Errors raised by the measurement and review pipeline.
///
/// Operator cancellation is not an error; see [`crate::ReviewOutcome`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to load image '{path}': {source}")]
    ImageLoad {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("File name of '{path}' is not valid UTF-8")]
    FileName { path: PathBuf },

    #[error("Invalid calibration: {reason}")]
    InvalidCalibration { reason: String },

    #[error("Clustering needs at least one cluster")]
    NoClusters,

    #[error("Cannot form {clusters} clusters from {samples} particles")]
    InsufficientSamples { samples: usize, clusters: usize },

    #[error("Cannot {action} while the review is in state {state}")]
    ReviewTransition { state: String, action: &'static str },

    #[error("Result table '{path}' is missing or unreadable: {source}")]
    ResultTableMissing { path: PathBuf, source: StoreError },

    #[error("Threshold method {method} could not split the histogram of '{path}'")]
    ThresholdFailed { path: PathBuf, method: String },

    #[error("Particle {index} of '{path}' has invalid area {area}")]
    InvalidParticle {
        path: PathBuf,
        index: usize,
        area: f64,
    },

    #[error("Failed to save mask '{path}': {source}")]
    MaskSave {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid settings file '{path}': {reason}")]
    SettingsFile { path: PathBuf, reason: String },

    #[error("Invalid settings: {reason}")]
    InvalidSettings { reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, Error>;
