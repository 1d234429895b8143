use anyhow::{Context, Result};
use std::collections::HashSet;
use std::ffi::OsString;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

/// Inserted between the base name and the extension of every output file.
pub const OUTPUT_SUFFIX: &str = "-s";

/// Derive the output path for `input`: `dir/name.ext` becomes `dir/name-s.ext`.
///
/// Directory and extension are kept as they are. No I/O happens here and an
/// existing file at the returned path will be overwritten by the compressor.
pub fn compute_output_path(input: &Path) -> PathBuf {
    let Some(stem) = input.file_stem() else {
        let mut raw = input.as_os_str().to_os_string();
        raw.push(OUTPUT_SUFFIX);
        return PathBuf::from(raw);
    };

    let mut file_name = OsString::from(stem);
    file_name.push(OUTPUT_SUFFIX);
    if let Some(extension) = input.extension() {
        file_name.push(".");
        file_name.push(extension);
    }

    match input.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Whether `path` looks like something [`compute_output_path`] produced.
pub fn is_compressed_output(path: &Path) -> bool {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.ends_with(OUTPUT_SUFFIX))
}

/// Interpret a free-text width field: plain digits and non-zero, else no resize.
pub fn parse_width_field(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok().filter(|&width| width > 0)
}

/// Format duration in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else if total_seconds > 0 {
        format!("{}s", seconds)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

/// Expand the paths given by the user into the list of files to compress.
///
/// Files are kept verbatim, even if they are not images, so that a bad
/// selection shows up as a per-file failure. Directories contribute only
/// valid images that are not themselves earlier outputs; subdirectories are
/// visited when `recursive` is set. Duplicates are dropped, order is kept.
pub fn collect_input_files(paths: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for path in paths {
        if !path.is_dir() {
            if seen.insert(path.clone()) {
                files.push(path.clone());
            }
            continue;
        }

        let walker = WalkDir::new(path)
            .follow_links(false)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .sort_by_file_name();

        for entry in walker {
            let entry = entry
                .with_context(|| format!("Failed to read directory entry in {}", path.display()))?;
            let candidate = entry.path();

            if !entry.file_type().is_file() {
                continue;
            }
            if is_compressed_output(candidate) {
                log::debug!("Skipping earlier output {}", candidate.display());
                continue;
            }
            if let Err(e) = validate_image_file(candidate) {
                log::debug!("Skipping {}: {}", candidate.display(), e);
                continue;
            }

            let candidate = candidate.to_path_buf();
            if seen.insert(candidate.clone()) {
                files.push(candidate);
            }
        }
    }

    Ok(files)
}

/// Extensions offered by the file picker and accepted during directory scans.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

/// Get file extension (lowercase)
fn get_file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Error types for image validation
#[derive(Debug)]
pub enum ImageValidationError {
    InvalidExtension,
    FileNotFound,
    IoError(io::Error),
    InvalidHeader,
    FileTooSmall,
}

impl From<io::Error> for ImageValidationError {
    fn from(error: io::Error) -> Self {
        Self::IoError(error)
    }
}

impl fmt::Display for ImageValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageValidationError::InvalidExtension => write!(f, "Invalid file extension"),
            ImageValidationError::FileNotFound => write!(f, "File not found"),
            ImageValidationError::IoError(e) => write!(f, "IO error: {}", e),
            ImageValidationError::InvalidHeader => write!(f, "Invalid image header"),
            ImageValidationError::FileTooSmall => write!(f, "File too small to be a valid image"),
        }
    }
}

impl std::error::Error for ImageValidationError {}

/// Validate image file with detailed error information
pub fn validate_image_file(path: &Path) -> Result<(), ImageValidationError> {
    if !path.exists() {
        return Err(ImageValidationError::FileNotFound);
    }

    let extension = get_file_extension(path).ok_or(ImageValidationError::InvalidExtension)?;

    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ImageValidationError::InvalidExtension);
    }

    validate_image_header(path, &extension)
}

/// Check the magic number so renamed or truncated files are not picked up
fn validate_image_header(path: &Path, extension: &str) -> Result<(), ImageValidationError> {
    let mut file = File::open(path)?;

    let header_size = match extension {
        "png" => 8,
        "gif" => 6,
        _ => 2,
    };

    let mut header = vec![0u8; header_size];
    let bytes_read = file.read(&mut header)?;

    if bytes_read < header_size {
        return Err(ImageValidationError::FileTooSmall);
    }

    let is_valid = match extension {
        "jpg" | "jpeg" => header[0] == 0xFF && header[1] == 0xD8,
        "png" => header == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A],
        "gif" => header[0..6] == *b"GIF87a" || header[0..6] == *b"GIF89a",
        "bmp" => header[0..2] == *b"BM",
        _ => return Err(ImageValidationError::InvalidExtension),
    };

    if is_valid {
        Ok(())
    } else {
        Err(ImageValidationError::InvalidHeader)
    }
}
