use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::{
    config::CompressionOptions,
    converter::{compress_request, MAX_JPEG_DIMENSION},
    progress::ProgressReporter,
    stats::BatchStats, BatchReport, CompressError, CompressionRequest, FileRecord, FileResult,
    Quality,
};

/// Compress every file in `inputs`, one after another, and return one result
/// per input in the same order.
///
/// `quality` and `target_width` are checked before any file is touched; a bad
/// value aborts the whole batch. After that, failures stay with their file
/// and the batch always runs to the end.
pub fn run_batch(
    inputs: &[PathBuf],
    quality: u32,
    target_width: Option<u32>,
) -> Result<Vec<FileResult>, CompressError> {
    run_batch_with(inputs, quality, target_width, |_, _| {})
}

/// Like [`run_batch`], calling `on_result` as soon as each file is done.
pub fn run_batch_with<F>(
    inputs: &[PathBuf],
    quality: u32,
    target_width: Option<u32>,
    mut on_result: F,
) -> Result<Vec<FileResult>, CompressError>
where
    F: FnMut(&Path, &FileResult),
{
    let quality = validate_parameters(quality, target_width)?;
    let mut results = Vec::with_capacity(inputs.len());

    for input_path in inputs {
        let request = CompressionRequest {
            input_path: input_path.clone(),
            quality,
            target_width,
        };
        let result = compress_request(&request);
        match &result {
            Ok(outcome) if outcome.succeeded => log::debug!(
                "Compressed {} ({:.2}% smaller)",
                input_path.display(),
                outcome.reduction_percent()
            ),
            Ok(_) => {}
            Err(e) => log::error!("Failed to compress {}: {}", input_path.display(), e),
        }

        on_result(input_path, &result);
        results.push(result);
    }

    Ok(results)
}

fn validate_parameters(quality: u32, target_width: Option<u32>) -> Result<Quality, CompressError> {
    let quality = Quality::new(quality)?;
    match target_width {
        Some(width) if width == 0 || width > MAX_JPEG_DIMENSION => {
            return Err(CompressError::InvalidWidth(width.to_string()));
        }
        _ => {}
    }
    Ok(quality)
}

/// Drives a batch for an interactive shell: keeps statistics, feeds a
/// [`ProgressReporter`] and produces a [`BatchReport`].
pub struct ShrinkCore {
    options: CompressionOptions,
    stats: BatchStats,
}

impl ShrinkCore {
    /// Create a new core engine with the given options
    pub fn new(options: CompressionOptions) -> Self {
        Self {
            options,
            stats: BatchStats::new(),
        }
    }

    pub fn options(&self) -> &CompressionOptions {
        &self.options
    }

    /// Run a batch without progress reporting
    pub fn run(&mut self, inputs: &[PathBuf]) -> Result<BatchReport, CompressError> {
        self.run_with_progress(inputs, None)
    }

    /// Run a batch, reporting each file to `progress_reporter` as it finishes
    pub fn run_with_progress(
        &mut self,
        inputs: &[PathBuf],
        progress_reporter: Option<Box<dyn ProgressReporter>>,
    ) -> Result<BatchReport, CompressError> {
        let start_time = Instant::now();
        let start_time_utc = Utc::now();
        self.stats = BatchStats::new();

        let quality = validate_parameters(self.options.quality, self.options.target_width)?;

        if let Some(reporter) = &progress_reporter {
            reporter.set_total_files(inputs.len());
            reporter.start_batch();
        }

        let stats = &mut self.stats;
        let results = run_batch_with(
            inputs,
            self.options.quality,
            self.options.target_width,
            |input_path, result| {
                stats.record(input_path, result);
                if let Some(reporter) = &progress_reporter {
                    reporter.report_result(input_path, result);
                    reporter.update_progress(
                        stats.total_files() as usize,
                        stats.failed_count() as usize,
                    );
                }
            },
        )?;

        if let Some(reporter) = &progress_reporter {
            reporter.finish_batch();
        }

        let files = inputs
            .iter()
            .zip(&results)
            .map(|(input_path, result)| FileRecord::from_result(input_path, result))
            .collect();

        let mut errors = self.stats.get_errors();
        if inputs.is_empty() {
            errors.push("No image files were selected".to_string());
        }

        Ok(BatchReport {
            start_time: start_time_utc,
            end_time: Utc::now(),
            duration: start_time.elapsed(),
            total_files: inputs.len() as u64,
            compressed_files: self.stats.compressed_count,
            rejected_files: self.stats.rejected_count,
            failed_files: self.stats.error_count,
            original_size: self.stats.original_size,
            compressed_size: self.stats.compressed_size,
            space_saved: self.stats.get_space_saved(),
            compression_ratio: self.stats.get_compression_ratio(),
            quality,
            target_width: self.options.target_width,
            files,
            errors,
        })
    }

    /// Get statistics of the last run
    pub fn get_stats(&self) -> &BatchStats {
        &self.stats
    }
}
