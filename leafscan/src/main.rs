use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use common::log_setup::{setup_logging, LogConfig};
use leafscan::segmentation::ThresholdMethod;
use leafscan::{
    AutoConfirm, BatchRunner, CountReconciler, ExpectedCount, ReviewOutcome, Settings,
    TerminalPrompter,
};

/// Exit code when the operator stops a review.
const CANCELLED: u8 = 2;

/// Measure leaf area and leaf count in a directory of scans
#[derive(Parser, Debug)]
#[command(name = "leafscan", version, about, long_about = None)]
struct Cli {
    /// Settings file (.yaml, .yml or .json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Threshold every scan and write masks, result tables and leafnumbers.csv
    Measure(MeasureArgs),
    /// Confirm leaf counts scan by scan and write the review ledger
    Check(CheckArgs),
    /// Write count and total leaf area per scan to leafarea.csv
    Summarize(RootArg),
}

#[derive(Args, Debug)]
struct RootArg {
    /// Directory holding the scans
    #[arg(short, long)]
    root: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct MeasureArgs {
    #[command(flatten)]
    root: RootArg,

    /// Wildcard selecting scan files, e.g. "*.jpg"
    #[arg(short, long)]
    pattern: Option<String>,

    /// Pixels spanning the known distance
    #[arg(long)]
    distance_px: Option<f64>,

    /// Known distance in calibrated units
    #[arg(long)]
    distance_units: Option<f64>,

    /// Name of the calibrated unit
    #[arg(long)]
    unit: Option<String>,

    /// Smallest particle kept, in calibrated area units
    #[arg(long)]
    min_size: Option<f64>,

    /// Largest particle kept, in calibrated area units
    #[arg(long)]
    max_size: Option<f64>,

    /// Threshold method: Minimum or Otsu
    #[arg(short, long)]
    threshold: Option<ThresholdMethod>,

    /// Drop noise by clustering particle areas into this many groups
    #[arg(long)]
    noise_clusters: Option<usize>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    root: RootArg,

    /// Expected counts per scan, in leafnumbers.csv format
    #[arg(long, conflicts_with = "expected_count")]
    expected: Option<PathBuf>,

    /// Expected count offered for every scan
    #[arg(long)]
    expected_count: Option<usize>,

    /// Accept every suggested count without prompting
    #[arg(short, long)]
    yes: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if common::is_debug() { "debug" } else { "info" };
    let filter = cli.log_level.as_deref().unwrap_or(default_level);
    setup_logging(&LogConfig::new(filter, Path::new("logs"), "leafscan"))?;

    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    match cli.command {
        Command::Measure(args) => {
            args.apply(&mut settings);
            let report = BatchRunner::new(settings).measure_all()?;
            tracing::info!(scans = report.scans.len(), "Measurement finished");
        }
        Command::Check(args) => {
            let expected = args.expected_count()?;
            args.root.apply(&mut settings);
            let runner = BatchRunner::new(settings);
            let reconciler = CountReconciler::new(runner.layout().clone(), expected);

            let outcome = if args.yes {
                runner.review(&reconciler, &mut AutoConfirm)?
            } else {
                let mut prompter = TerminalPrompter::new(io::stdin().lock(), io::stdout());
                runner.review(&reconciler, &mut prompter)?
            };

            match outcome {
                ReviewOutcome::Completed(records) => {
                    tracing::info!(scans = records.len(), "Review finished");
                }
                ReviewOutcome::Cancelled { reviewed } => {
                    tracing::warn!(reviewed, "Review aborted");
                    return Ok(ExitCode::from(CANCELLED));
                }
            }
        }
        Command::Summarize(root) => {
            root.apply(&mut settings);
            let rows = BatchRunner::new(settings).summarize()?;
            tracing::info!(scans = rows.len(), "Summary finished");
        }
    }

    Ok(ExitCode::SUCCESS)
}

impl RootArg {
    fn apply(self, settings: &mut Settings) {
        if let Some(root) = self.root {
            settings.root = root;
        }
    }
}

impl MeasureArgs {
    fn apply(self, settings: &mut Settings) {
        self.root.apply(settings);
        if let Some(pattern) = self.pattern {
            settings.pattern = pattern;
        }
        if let Some(distance_px) = self.distance_px {
            settings.distance_px = distance_px;
        }
        if let Some(distance_units) = self.distance_units {
            settings.distance_units = distance_units;
        }
        if let Some(unit) = self.unit {
            settings.unit = unit;
        }
        if let Some(min_size) = self.min_size {
            settings.min_size = min_size;
        }
        if self.max_size.is_some() {
            settings.max_size = self.max_size;
        }
        if let Some(threshold) = self.threshold {
            settings.threshold = threshold;
        }
        if self.noise_clusters.is_some() {
            settings.noise_clusters = self.noise_clusters;
        }
    }
}

impl CheckArgs {
    fn expected_count(&self) -> Result<ExpectedCount> {
        if let Some(path) = &self.expected {
            return ExpectedCount::from_file(path)
                .with_context(|| format!("Failed to load expected counts from {}", path.display()));
        }
        Ok(self
            .expected_count
            .map_or(ExpectedCount::Automatic, ExpectedCount::Fixed))
    }
}
