//! Directory-level drivers: measure every scan, review the counts, summarize.
//!
//! All three passes are sequential and fail fast. The first error aborts the
//! pass and nothing after it is written.


use std::collections::HashSet;
use std::path::Path;

use common::file_utils::files_matching;

use crate::error::{Error, Result};
use crate::layout::ScanLayout;
use crate::measure::Measurer;
use crate::noise_filter::filter_noise;
use crate::reconcile::{CountReconciler, Prompter, ReviewOutcome};
use crate::segmentation::{HistogramThreshold, ParticleAnalyzer, Segmenter, ShapeAnalyzer};
use crate::settings::Settings;
use crate::store::{
    read_leaf_numbers, read_table, write_area_summary, write_leaf_numbers, write_ledger,
    write_table, AreaSummary, LeafCount, TableHeader,
};

/// What measurement did to one scan.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredScan {
    pub filename: String,
    pub threshold: u8,
    /// Particles reported by shape analysis.
    pub detected: usize,
    /// Particles written to the result table.
    pub kept: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasureReport {
    pub scans: Vec<MeasuredScan>,
}

impl MeasureReport {
    pub fn leaf_counts(&self) -> Vec<LeafCount> {
        self.scans
            .iter()
            .map(|scan| LeafCount {
                filename: scan.filename.clone(),
                count: scan.kept,
            })
            .collect()
    }
}

/// Runs the measurement, review and summary passes over one scan directory.
#[derive(Debug, Clone)]
pub struct BatchRunner<S = HistogramThreshold, A = ParticleAnalyzer> {
    settings: Settings,
    layout: ScanLayout,
    measurer: Measurer<S, A>,
}

impl BatchRunner {
    pub fn new(settings: Settings) -> Self {
        Self::with_measurer(settings, Measurer::new())
    }
}

impl<S: Segmenter, A: ShapeAnalyzer> BatchRunner<S, A> {
    pub fn with_measurer(settings: Settings, measurer: Measurer<S, A>) -> Self {
        let layout = settings.layout();
        Self {
            settings,
            layout,
            measurer,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn layout(&self) -> &ScanLayout {
        &self.layout
    }

    /// Measures every scan matching the settings' pattern, in file name order.
    ///
    /// Writes a mask and a result table per scan, then `leafnumbers.csv`.
    pub fn measure_all(&self) -> Result<MeasureReport> {
        self.settings.validate()?;
        self.layout.create_output_dirs()?;

        let root = self.layout.root();
        let scans = files_matching(root, &self.settings.pattern).map_err(|source| Error::Io {
            path: root.to_path_buf(),
            source,
        })?;
        if scans.is_empty() {
            tracing::warn!(
                root = %root.display(),
                pattern = %self.settings.pattern,
                "No scans match the pattern"
            );
        } else {
            tracing::info!(root = %root.display(), scans = scans.len(), "Measuring scans");
        }

        let mut report = MeasureReport::default();
        for scan in &scans {
            report.scans.push(self.measure_scan(scan)?);
        }

        write_leaf_numbers(&self.layout.leaf_numbers_path(), &report.leaf_counts())?;
        Ok(report)
    }

    /// Measures one scan and persists its mask and result table.
    pub fn measure_scan(&self, scan: &Path) -> Result<MeasuredScan> {
        let result = self.measurer.measure(
            scan,
            &self.settings.calibration(),
            &self.settings.segmentation_params(),
            &self.settings.shape_params(),
        )?;

        let filename = result.filename().to_owned();
        let threshold = result.threshold();
        result.save_mask(&self.layout.mask_path(&filename))?;

        let descriptors = result.into_descriptors();
        let detected = descriptors.len();
        let kept = match self.settings.noise_clusters {
            Some(clusters) if detected >= clusters => filter_noise(&descriptors, clusters)?,
            Some(clusters) => {
                tracing::debug!(
                    filename = %filename,
                    detected,
                    clusters,
                    "Too few particles to cluster, noise filter skipped"
                );
                descriptors
            }
            None => descriptors,
        };

        let table_path = self.layout.table_path(&filename);
        write_table(&table_path, &TableHeader::default(), &kept)?;
        tracing::info!(
            filename = %filename,
            detected,
            kept = kept.len(),
            table = %table_path.display(),
            "Scan measured"
        );

        Ok(MeasuredScan {
            filename,
            threshold,
            detected,
            kept: kept.len(),
        })
    }

    /// Reviews every scan listed in `leafnumbers.csv`.
    ///
    /// The ledger is written only when every scan was confirmed. A filename
    /// listed twice is reviewed once, at its first position.
    pub fn review(
        &self,
        reconciler: &CountReconciler,
        prompter: &mut dyn Prompter,
    ) -> Result<ReviewOutcome> {
        let scans = read_leaf_numbers(&self.layout.leaf_numbers_path())?;
        tracing::info!(scans = scans.len(), "Reviewing leaf counts");

        let mut records = Vec::with_capacity(scans.len());
        let mut seen = HashSet::with_capacity(scans.len());
        for scan in &scans {
            if !seen.insert(scan.filename.as_str()) {
                tracing::warn!(
                    filename = %scan.filename,
                    "Scan listed more than once in leaf numbers; later entry skipped"
                );
                continue;
            }
            match reconciler.review(scan, prompter)? {
                Some(record) => records.push(record),
                None => {
                    tracing::warn!(
                        reviewed = records.len(),
                        "Review cancelled, ledger not written"
                    );
                    return Ok(ReviewOutcome::Cancelled {
                        reviewed: records.len(),
                    });
                }
            }
        }

        write_ledger(&self.layout.ledger_path(), &records)?;
        Ok(ReviewOutcome::Completed(records))
    }

    /// Totals particle count and area per scan into `leafarea.csv`.
    pub fn summarize(&self) -> Result<Vec<AreaSummary>> {
        let scans = read_leaf_numbers(&self.layout.leaf_numbers_path())?;

        let mut rows = Vec::with_capacity(scans.len());
        for scan in &scans {
            let path = self.layout.table_path(&scan.filename);
            let (_, descriptors) =
                read_table(&path).map_err(|source| Error::ResultTableMissing {
                    path: path.clone(),
                    source,
                })?;
            rows.push(AreaSummary {
                filename: scan.filename.clone(),
                count: descriptors.len(),
                total_area: descriptors.iter().map(|d| d.area()).sum(),
            });
        }

        write_area_summary(&self.layout.area_summary_path(), &rows)?;
        Ok(rows)
    }
}
