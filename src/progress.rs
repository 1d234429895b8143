use std::path::Path;

use crate::FileResult;

const SEPARATOR: &str = "---------------------------------------------";

/// Render the human-readable log block for one processed file.
///
/// Sizes are in KB (1024 bytes) with two decimals. The block always ends
/// with a newline so blocks can be appended to a log panel as they arrive.
pub fn render_log_entry(input_path: &Path, result: &FileResult) -> String {
    match result {
        Ok(outcome) if outcome.succeeded => {
            let file_name = input_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| input_path.display().to_string());
            format!(
                "Original file name: {}\n\
                 Original size: {:.2} KB\n\
                 New size: {:.2} KB\n\
                 Original dimensions: {}\n\
                 New dimensions: {}\n\
                 Percentage reduced: {:.2}%\n\
                 {}\n",
                file_name,
                outcome.original_size as f64 / 1024.0,
                outcome.new_size as f64 / 1024.0,
                outcome.original_dimensions,
                outcome.new_dimensions,
                outcome.reduction_percent(),
                SEPARATOR
            )
        }
        Ok(_) => format!(
            "File cannot be compressed at this level.\nCompression failed for {}\n",
            input_path.display()
        ),
        Err(_) => format!("Compression failed for {}\n", input_path.display()),
    }
}

/// Trait for reporting batch progress
/// This allows different interfaces (CLI, GUI) to implement their own progress display
pub trait ProgressReporter: Send + Sync {
    /// Set the total number of files to be processed
    fn set_total_files(&self, total: usize);

    /// Update current progress
    fn update_progress(&self, done: usize, failed: usize);

    /// Report that the batch has started
    fn start_batch(&self) {}

    /// Report that the batch has finished
    fn finish_batch(&self) {}

    /// Called once per file, in input order, right after it was processed
    fn report_result(&self, _input_path: &Path, _result: &FileResult) {}
}

/// Console-based progress reporter using indicatif
#[cfg(feature = "cli")]
pub struct ConsoleProgressReporter {
    progress_bar: indicatif::ProgressBar,
}

#[cfg(feature = "cli")]
impl Default for ConsoleProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "cli")]
impl ConsoleProgressReporter {
    pub fn new() -> Self {
        let progress_bar = indicatif::ProgressBar::new(0);
        let style = indicatif::ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_bar())
            .progress_chars("#>-");
        progress_bar.set_style(style);

        Self { progress_bar }
    }

    /// Log blocks only, no bar
    pub fn plain() -> Self {
        Self {
            progress_bar: indicatif::ProgressBar::hidden(),
        }
    }
}

#[cfg(feature = "cli")]
impl ProgressReporter for ConsoleProgressReporter {
    fn set_total_files(&self, total: usize) {
        self.progress_bar.set_length(total as u64);
    }

    fn update_progress(&self, done: usize, _failed: usize) {
        self.progress_bar.set_position(done as u64);
    }

    fn start_batch(&self) {
        self.progress_bar.set_message("Compressing images...");
    }

    fn finish_batch(&self) {
        self.progress_bar.finish_with_message("Done");
    }

    fn report_result(&self, input_path: &Path, result: &FileResult) {
        // `println` is swallowed by hidden bars; `suspend` always prints.
        let entry = render_log_entry(input_path, result);
        self.progress_bar.suspend(|| print!("{entry}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompressError, CompressionOutcome, Dimensions};
    use std::path::PathBuf;

    fn outcome(succeeded: bool) -> CompressionOutcome {
        CompressionOutcome {
            input_path: PathBuf::from("shots/beach.jpg"),
            output_path: PathBuf::from("shots/beach-s.jpg"),
            original_size: 5 * 1024 * 1024,
            new_size: if succeeded { 1024 * 1024 } else { 6 * 1024 * 1024 },
            original_dimensions: Dimensions::new(3000, 2000),
            new_dimensions: Dimensions::new(1500, 1000),
            succeeded,
        }
    }

    #[test]
    fn success_block_lists_sizes_dimensions_and_reduction() {
        let entry = render_log_entry(Path::new("shots/beach.jpg"), &Ok(outcome(true)));
        let lines: Vec<&str> = entry.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Original file name: beach.jpg",
                "Original size: 5120.00 KB",
                "New size: 1024.00 KB",
                "Original dimensions: (3000, 2000)",
                "New dimensions: (1500, 1000)",
                "Percentage reduced: 80.00%",
                SEPARATOR,
            ]
        );
        assert!(entry.ends_with('\n'));
    }

    #[test]
    fn not_smaller_block_explains_and_fails() {
        let entry = render_log_entry(Path::new("shots/beach.jpg"), &Ok(outcome(false)));
        assert_eq!(
            entry,
            "File cannot be compressed at this level.\nCompression failed for shots/beach.jpg\n"
        );
    }

    #[test]
    fn error_block_is_a_single_line() {
        let err = CompressError::InvalidWidth("x".to_string());
        let entry = render_log_entry(Path::new("shots/beach.jpg"), &Err(err));
        assert_eq!(entry, "Compression failed for shots/beach.jpg\n");
    }
}
