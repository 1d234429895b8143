use std::path::Path;
use std::time::SystemTime;

use crate::FileResult;

/// Running totals for one batch.
///
/// Sizes only include files that were actually compressed; rejected files
/// leave nothing on disk and so do not count towards the savings.
#[derive(Debug, Clone, Default)]
pub struct BatchStats {
    pub compressed_count: u64,
    pub rejected_count: u64,
    pub error_count: u64,
    pub original_size: u64,
    pub compressed_size: u64,
    errors: Vec<ErrorRecord>,
}

#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub file_path: String,
    pub error_message: String,
    pub timestamp: SystemTime,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one per-file result into the totals.
    pub fn record(&mut self, input_path: &Path, result: &FileResult) {
        match result {
            Ok(outcome) if outcome.succeeded => {
                self.record_success(outcome.original_size, outcome.new_size)
            }
            Ok(_) => self.record_rejected(),
            Err(e) => self.record_error(input_path.display().to_string(), e.to_string()),
        }
    }

    pub fn record_success(&mut self, original_size: u64, compressed_size: u64) {
        self.compressed_count += 1;
        self.original_size += original_size;
        self.compressed_size += compressed_size;
    }

    pub fn record_rejected(&mut self) {
        self.rejected_count += 1;
    }

    pub fn record_error(&mut self, file_path: String, error: String) {
        self.error_count += 1;
        self.errors.push(ErrorRecord {
            file_path,
            error_message: error,
            timestamp: SystemTime::now(),
        });
    }

    /// New size as a fraction of the original, over compressed files only.
    pub fn get_compression_ratio(&self) -> f64 {
        if self.original_size > 0 {
            self.compressed_size as f64 / self.original_size as f64
        } else {
            0.0
        }
    }

    pub fn get_space_saved(&self) -> u64 {
        self.original_size.saturating_sub(self.compressed_size)
    }

    pub fn get_errors(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.file_path, e.error_message))
            .collect()
    }

    pub fn get_error_records(&self) -> &[ErrorRecord] {
        &self.errors
    }

    /// Files that did not end up compressed, for whatever reason
    pub fn failed_count(&self) -> u64 {
        self.rejected_count + self.error_count
    }

    pub fn total_files(&self) -> u64 {
        self.compressed_count + self.rejected_count + self.error_count
    }

    pub fn is_empty(&self) -> bool {
        self.total_files() == 0
    }
}
