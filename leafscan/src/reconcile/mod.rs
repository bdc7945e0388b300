//! Operator review of automatic leaf counts.
//!
//! Each scan listed in `leafnumbers.csv` is shown to the operator with its
//! mask. A lower confirmed count cuts the result table down to its largest
//! particles; every confirmed scan yields one ledger record.

mod mask_view;
mod prompt;
mod state;


use std::collections::HashMap;
use std::path::Path;

pub use mask_view::{MaskView, ViewTracker};
pub use prompt::{
    AutoConfirm, CountAnswer, CountRequest, PromptResponse, Prompter, ScriptedPrompter,
    TerminalPrompter,
};
pub use state::ReviewState;

use crate::descriptor::rank_by_area;
use crate::error::{Error, Result};
use crate::layout::ScanLayout;
use crate::store::{read_leaf_numbers, read_table, replace_table, LeafCount, LeafCountRecord};

/// Source of the count offered to the operator as the default answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExpectedCount {
    /// Offer the automatic count.
    #[default]
    Automatic,
    /// Offer the same count for every scan.
    Fixed(usize),
    /// Per-scan counts, e.g. from a manual tally. Scans not listed fall back
    /// to the automatic count.
    Table(HashMap<String, usize>),
}

impl ExpectedCount {
    /// Loads per-scan counts from a file in `leafnumbers.csv` format.
    pub fn from_file(path: &Path) -> Result<Self> {
        let counts = read_leaf_numbers(path)?;
        Ok(Self::Table(
            counts
                .into_iter()
                .map(|entry| (entry.filename, entry.count))
                .collect(),
        ))
    }

    pub fn suggestion(&self, filename: &str, auto_count: usize) -> usize {
        match self {
            Self::Automatic => auto_count,
            Self::Fixed(count) => *count,
            Self::Table(counts) => counts.get(filename).copied().unwrap_or(auto_count),
        }
    }
}

/// Result of a review pass over a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// Every scan was confirmed; records are in review order.
    Completed(Vec<LeafCountRecord>),
    /// The operator stopped the pass. Records gathered so far are dropped.
    Cancelled { reviewed: usize },
}

/// Reviews scans one at a time against their persisted masks and tables.
#[derive(Debug, Clone)]
pub struct CountReconciler {
    layout: ScanLayout,
    expected: ExpectedCount,
    tracker: ViewTracker,
}

impl CountReconciler {
    pub fn new(layout: ScanLayout, expected: ExpectedCount) -> Self {
        Self {
            layout,
            expected,
            tracker: ViewTracker::new(),
        }
    }

    pub fn layout(&self) -> &ScanLayout {
        &self.layout
    }

    pub fn tracker(&self) -> &ViewTracker {
        &self.tracker
    }

    /// Reviews one scan. Returns `None` when the operator cancels.
    ///
    /// The mask view is released on every return path.
    pub fn review(
        &self,
        scan: &LeafCount,
        prompter: &mut dyn Prompter,
    ) -> Result<Option<LeafCountRecord>> {
        let filename = scan.filename.as_str();
        let suggested = self.expected.suggestion(filename, scan.count);
        let state = ReviewState::measured(scan.count).await_confirmation(suggested)?;

        let mask_path = self.layout.mask_path(filename);
        let view = MaskView::open(&mask_path, &self.tracker)?;
        tracing::info!(
            filename,
            auto_count = scan.count,
            suggested,
            mask = %mask_path.display(),
            "Reviewing scan"
        );

        let request = CountRequest {
            filename,
            auto_count: scan.count,
            suggested,
            mask: &view,
        };
        let answer = match prompter.confirm_count(&request) {
            PromptResponse::Confirmed(answer) => answer,
            PromptResponse::Cancelled => {
                tracing::info!(filename, "Review cancelled by operator");
                return Ok(None);
            }
        };

        let state = state.confirm(filename, answer)?;
        if let Some(keep) = state.truncate_to() {
            self.truncate_table(filename, keep)?;
        }

        let record = state.record(filename);
        drop(view);
        Ok(record)
    }

    /// Cuts the result table of `filename` to its `keep` largest particles.
    /// Equal areas keep their stored order.
    fn truncate_table(&self, filename: &str, keep: usize) -> Result<()> {
        let path = self.layout.table_path(filename);
        let (header, descriptors) =
            read_table(&path).map_err(|source| Error::ResultTableMissing {
                path: path.clone(),
                source,
            })?;

        let before = descriptors.len();
        let kept = rank_by_area(descriptors, keep);
        replace_table(&path, &header, &kept)?;
        tracing::info!(
            path = %path.display(),
            before,
            after = kept.len(),
            "Result table truncated"
        );
        Ok(())
    }
}
