use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::{Quality, ReportFormat};

/// Main configuration structure loaded from config files
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub compression: Option<CompressionConfig>,
    pub output: Option<OutputConfig>,
    pub profiles: Option<HashMap<String, ProfileConfig>>,
}

/// Configuration profile for predefined settings
#[derive(Debug, Deserialize, Clone)]
pub struct ProfileConfig {
    pub description: Option<String>,
    pub quality: Option<u32>,
    pub width: Option<u32>,
}

/// Compression-related configuration
#[derive(Debug, Deserialize)]
pub struct CompressionConfig {
    pub quality: Option<u32>,
    pub width: Option<u32>,
}

/// Output and reporting configuration
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    pub verbose: Option<bool>,
    pub quiet: Option<bool>,
    pub recursive: Option<bool>,
    pub generate_report: Option<bool>,
    pub report_format: Option<String>,
}

impl Config {
    /// Parse the TOML file at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// `<config dir>/imgshrink/config.toml`, e.g. `~/.config/imgshrink/config.toml` on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("imgshrink").join("config.toml"))
    }

    /// Load the file at [`Config::default_path`] if there is one
    pub fn load_default() -> Result<Option<Self>> {
        match Self::default_path() {
            Some(path) if path.is_file() => {
                log::debug!("Loading config from {}", path.display());
                Self::load(&path).map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn profile(&self, name: &str) -> Result<&ProfileConfig> {
        self.profiles
            .as_ref()
            .and_then(|profiles| profiles.get(name))
            .with_context(|| {
                let mut known: Vec<&str> = self
                    .profiles
                    .iter()
                    .flat_map(|profiles| profiles.keys().map(String::as_str))
                    .collect();
                known.sort_unstable();
                format!("Unknown profile '{name}' (available: {})", known.join(", "))
            })
    }

    /// Layer this file's `[compression]`/`[output]` sections and then the
    /// named profile on top of `options`.
    pub fn apply(&self, mut options: CompressionOptions, profile: Option<&str>) -> Result<CompressionOptions> {
        if let Some(compression) = &self.compression {
            if let Some(quality) = compression.quality {
                options = options.with_quality(quality);
            }
            if let Some(width) = compression.width {
                options = options.with_target_width(Some(width));
            }
        }

        if let Some(output) = &self.output {
            if let Some(generate_report) = output.generate_report {
                options = options.with_report(generate_report);
            }
            if let Some(format) = &output.report_format {
                options = options.with_report_format(format.parse()?);
            }
        }

        if let Some(name) = profile {
            let profile = self.profile(name)?;
            if let Some(quality) = profile.quality {
                options = options.with_quality(quality);
            }
            if let Some(width) = profile.width {
                options = options.with_target_width(Some(width));
            }
        }

        Ok(options)
    }

    pub fn verbose(&self) -> bool {
        self.output.as_ref().and_then(|o| o.verbose).unwrap_or(false)
    }

    pub fn quiet(&self) -> bool {
        self.output.as_ref().and_then(|o| o.quiet).unwrap_or(false)
    }

    pub fn recursive(&self) -> bool {
        self.output.as_ref().and_then(|o| o.recursive).unwrap_or(false)
    }
}

/// Options that can be passed to the core library
///
/// `quality` is kept raw here and validated when a batch starts, so a bad
/// value from any source is reported the same way.
#[derive(Debug, Clone)]
pub struct CompressionOptions {
    pub quality: u32,
    pub target_width: Option<u32>,
    pub generate_report: bool,
    pub report_format: ReportFormat,
    pub report_dir: Option<PathBuf>,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            quality: Quality::default().value() as u32,
            target_width: None,
            generate_report: false,
            report_format: ReportFormat::Json,
            report_dir: None,
        }
    }
}

impl CompressionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern for setting quality
    pub fn with_quality(mut self, quality: u32) -> Self {
        self.quality = quality;
        self
    }

    /// Builder pattern for setting the target width; `None` keeps the original size
    pub fn with_target_width(mut self, target_width: Option<u32>) -> Self {
        self.target_width = target_width;
        self
    }

    /// Builder pattern for enabling report generation
    pub fn with_report(mut self, generate_report: bool) -> Self {
        self.generate_report = generate_report;
        self
    }

    /// Builder pattern for setting the report format
    pub fn with_report_format(mut self, report_format: ReportFormat) -> Self {
        self.report_format = report_format;
        self
    }

    /// Builder pattern for setting where reports are written
    pub fn with_report_dir(mut self, report_dir: PathBuf) -> Self {
        self.report_dir = Some(report_dir);
        self
    }

    /// Get the effective report directory (current directory if not set)
    pub fn get_report_dir(&self) -> PathBuf {
        self.report_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
[compression]
quality = 70
width = 1920

[output]
verbose = true
generate_report = true
report_format = "csv"

[profiles.web]
description = "Small files for the blog"
quality = 60
width = 1280

[profiles.archive]
quality = 95
"#;

    #[test]
    fn defaults_match_the_dialog() {
        let options = CompressionOptions::new();
        assert_eq!(options.quality, 80);
        assert_eq!(options.target_width, None);
        assert!(!options.generate_report);
        assert_eq!(options.get_report_dir(), PathBuf::from("."));
    }

    #[test]
    fn config_sections_override_defaults() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        let options = config.apply(CompressionOptions::new(), None).unwrap();

        assert_eq!(options.quality, 70);
        assert_eq!(options.target_width, Some(1920));
        assert!(options.generate_report);
        assert_eq!(options.report_format, ReportFormat::Csv);
        assert!(config.verbose());
        assert!(!config.quiet());
    }

    #[test]
    fn profile_overrides_sections() {
        let config: Config = toml::from_str(SAMPLE).unwrap();

        let web = config.apply(CompressionOptions::new(), Some("web")).unwrap();
        assert_eq!((web.quality, web.target_width), (60, Some(1280)));

        // A profile without a width keeps the section's width.
        let archive = config.apply(CompressionOptions::new(), Some("archive")).unwrap();
        assert_eq!((archive.quality, archive.target_width), (95, Some(1920)));
    }

    #[test]
    fn unknown_profile_lists_known_ones() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        let err = config
            .apply(CompressionOptions::new(), Some("print"))
            .unwrap_err()
            .to_string();
        assert!(err.contains("print"));
        assert!(err.contains("archive, web"));
    }

    #[test]
    fn empty_config_changes_nothing() {
        let config = Config::default();
        let options = config
            .apply(CompressionOptions::new().with_quality(33), None)
            .unwrap();
        assert_eq!(options.quality, 33);
        assert!(!config.recursive());
    }

    #[test]
    fn load_reports_the_failing_path() {
        let tmp = TempDir::new().unwrap();
        let good = tmp.path().join("good.toml");
        std::fs::write(&good, SAMPLE).unwrap();
        assert!(Config::load(&good).unwrap().profiles.is_some());

        let bad = tmp.path().join("bad.toml");
        std::fs::write(&bad, "[compression\nquality = ").unwrap();
        let err = format!("{:#}", Config::load(&bad).unwrap_err());
        assert!(err.contains("bad.toml"));

        assert!(Config::load(&tmp.path().join("missing.toml")).is_err());
    }
}
