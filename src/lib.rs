//! # imgshrink
//!
//! Re-encode images as JPEG at a chosen quality, optionally scaled to a target
//! width, and keep the result only when it is actually smaller than the source.
//!
//! The library is independent of any user interface: callers hand it a list
//! of paths plus a quality and optional width, and receive one outcome per
//! file in input order. The `imgshrink` and `imgshrink-gui` binaries are thin
//! shells over [`ShrinkCore`].

pub mod config;
pub mod converter;
pub mod core;
pub mod error;
pub mod progress;
pub mod stats;
pub mod utils;

// Re-export commonly used types
pub use config::{CompressionOptions, Config, ProfileConfig};
pub use converter::{ColorMode, ImageCompressor};
pub use crate::core::{run_batch, run_batch_with, ShrinkCore};
pub use error::CompressError;
pub use progress::{render_log_entry, ProgressReporter};
pub use stats::BatchStats;
pub use utils::{compute_output_path, format_duration, OUTPUT_SUFFIX};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// JPEG quality in 1..=100. Higher keeps more detail and produces larger files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32")]
pub struct Quality(u8);

impl Quality {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 100;

    pub fn new(value: u32) -> Result<Self, CompressError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(CompressError::InvalidQuality(value.to_string()))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u32> for Quality {
    type Error = CompressError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(80)
    }
}

impl FromStr for Quality {
    type Err = CompressError;

    /// Accepts only plain decimal digits, so `"+80"`, `" 80"` and `"80.0"` are rejected.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CompressError::InvalidQuality(raw.to_string()));
        }
        let value: u32 = raw
            .parse()
            .map_err(|_| CompressError::InvalidQuality(raw.to_string()))?;
        Self::new(value)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.width, self.height)
    }
}

/// Everything needed to compress one file.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionRequest {
    pub input_path: PathBuf,
    pub quality: Quality,
    pub target_width: Option<u32>,
}

/// Result of compressing one file.
///
/// `succeeded == false` means the re-encoded file was not smaller than the
/// source; in that case the output has already been removed from disk and
/// `new_size` records the size it had before removal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionOutcome {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub original_size: u64,
    pub new_size: u64,
    pub original_dimensions: Dimensions,
    pub new_dimensions: Dimensions,
    pub succeeded: bool,
}

impl CompressionOutcome {
    /// Percentage of the original size removed. Negative when the file grew.
    pub fn reduction_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (self.original_size as f64 - self.new_size as f64) / self.original_size as f64 * 100.0
    }

}

/// Per-file entry of a batch: an outcome, or the error that prevented one.
pub type FileResult = std::result::Result<CompressionOutcome, CompressError>;

/// Status of one file in a [`BatchReport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatus {
    Compressed,
    NotSmaller,
    Failed,
}

/// Flat per-file row, shared by the JSON and CSV reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub input_path: String,
    pub output_path: Option<String>,
    pub status: FileStatus,
    pub original_size: Option<u64>,
    pub new_size: Option<u64>,
    pub original_width: Option<u32>,
    pub original_height: Option<u32>,
    pub new_width: Option<u32>,
    pub new_height: Option<u32>,
    pub reduction_percent: Option<f64>,
    pub error: Option<String>,
}

impl FileRecord {
    pub fn from_result(input_path: &Path, result: &FileResult) -> Self {
        match result {
            Ok(outcome) => Self {
                input_path: input_path.display().to_string(),
                output_path: outcome
                    .succeeded
                    .then(|| outcome.output_path.display().to_string()),
                status: if outcome.succeeded {
                    FileStatus::Compressed
                } else {
                    FileStatus::NotSmaller
                },
                original_size: Some(outcome.original_size),
                new_size: Some(outcome.new_size),
                original_width: Some(outcome.original_dimensions.width),
                original_height: Some(outcome.original_dimensions.height),
                new_width: Some(outcome.new_dimensions.width),
                new_height: Some(outcome.new_dimensions.height),
                reduction_percent: Some(outcome.reduction_percent()),
                error: None,
            },
            Err(e) => Self {
                input_path: input_path.display().to_string(),
                output_path: None,
                status: FileStatus::Failed,
                original_size: None,
                new_size: None,
                original_width: None,
                original_height: None,
                new_width: None,
                new_height: None,
                reduction_percent: None,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Summary of one batch run
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchReport {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: Duration,
    pub total_files: u64,
    pub compressed_files: u64,
    pub rejected_files: u64,
    pub failed_files: u64,
    pub original_size: u64,
    pub compressed_size: u64,
    pub space_saved: u64,
    pub compression_ratio: f64,
    pub quality: Quality,
    pub target_width: Option<u32>,
    pub files: Vec<FileRecord>,
    pub errors: Vec<String>,
}

/// Report output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
}

impl ReportFormat {
    pub fn file_name(self) -> &'static str {
        match self {
            ReportFormat::Json => "imgshrink_report.json",
            ReportFormat::Csv => "imgshrink_report.csv",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "csv" => Ok(ReportFormat::Csv),
            other => anyhow::bail!("Unknown report format: {other} (expected json or csv)"),
        }
    }
}

/// Write `report` into `dir` in the given format and return the file written.
pub fn generate_report(report: &BatchReport, format: ReportFormat, dir: &Path) -> Result<PathBuf> {
    let report_path = dir.join(format.file_name());
    match format {
        ReportFormat::Json => generate_json_report(report, &report_path)?,
        ReportFormat::Csv => generate_csv_report(report, &report_path)?,
    }
    log::info!("Report saved to: {}", report_path.display());
    Ok(report_path)
}

fn generate_json_report(report: &BatchReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(())
}

fn generate_csv_report(report: &BatchReport, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create report: {}", path.display()))?;
    for record in &report.files {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
