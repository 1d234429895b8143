use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, ValueEnum};
use std::path::PathBuf;

use imgshrink::{
    config::{CompressionOptions, Config},
    generate_report,
    progress::ConsoleProgressReporter,
    utils::{collect_input_files, format_duration},
    BatchReport, ProgressReporter, ReportFormat, ShrinkCore,
};

/// imgshrink - shrink images by re-encoding them as JPEG
///
/// Each input `dir/name.ext` is written next to itself as `dir/name-s.ext`.
/// Results that are not smaller than the original are deleted again.
#[derive(Parser)]
#[command(name = "imgshrink")]
#[command(about = "imgshrink - shrink images by re-encoding them as JPEG")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = r#"
imgshrink re-encodes images (JPEG, PNG, GIF, BMP) as JPEG at the chosen
quality, optionally scaling them to a target width, and reports how much
space was saved.

Output files are named after their input with a "-s" suffix and are kept
only when they are strictly smaller than the original.
"#)]
pub struct Args {
    /// Image files or directories to compress
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// JPEG quality (1-100) [default: 80]
    #[arg(short, long, value_name = "QUALITY")]
    pub quality: Option<u32>,

    /// Resize to this width in pixels, keeping the aspect ratio
    #[arg(short, long, value_name = "PIXELS")]
    pub width: Option<u32>,

    /// Also look for images in subdirectories of directory arguments
    #[arg(short, long)]
    pub recursive: bool,

    /// Verbose output mode
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode (per-file results only)
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write a batch report
    #[arg(long)]
    pub report: bool,

    /// Report output format
    #[arg(long, value_enum)]
    pub report_format: Option<ReportFormatArg>,

    /// Directory the report is written to (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub report_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Use a predefined configuration profile
    #[arg(long, value_name = "PROFILE")]
    pub profile: Option<String>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ReportFormatArg {
    Json,
    Csv,
}

impl From<ReportFormatArg> for ReportFormat {
    fn from(format: ReportFormatArg) -> Self {
        match format {
            ReportFormatArg::Json => ReportFormat::Json,
            ReportFormatArg::Csv => ReportFormat::Csv,
        }
    }
}

fn main() -> Result<()> {
    if std::env::args().len() == 1 {
        print_banner();
        Args::command().print_help()?;
        println!();
        std::process::exit(0);
    }

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?.unwrap_or_default(),
    };

    let verbose = args.verbose || (config.verbose() && !args.quiet);
    let quiet = args.quiet || (config.quiet() && !args.verbose);

    // Initialize logging
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else if !quiet {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    // Defaults < config file < profile < command line
    let mut options = config.apply(CompressionOptions::new(), args.profile.as_deref())?;
    if let Some(quality) = args.quality {
        options = options.with_quality(quality);
    }
    if args.width.is_some() {
        options = options.with_target_width(args.width);
    }
    if args.report {
        options = options.with_report(true);
    }
    if let Some(format) = args.report_format {
        options = options.with_report_format(format.into());
    }
    if let Some(dir) = args.report_dir {
        options = options.with_report_dir(dir);
    }

    let inputs = collect_input_files(&args.paths, args.recursive || config.recursive())
        .context("Failed to collect input files")?;
    log::debug!("{} file(s) to compress", inputs.len());

    if !quiet {
        print_banner();
    }

    let reporter: Box<dyn ProgressReporter> = if quiet {
        Box::new(ConsoleProgressReporter::plain())
    } else {
        Box::new(ConsoleProgressReporter::new())
    };

    let mut core = ShrinkCore::new(options.clone());
    let report = core.run_with_progress(&inputs, Some(reporter))?;

    if options.generate_report {
        let path = generate_report(&report, options.report_format, &options.get_report_dir())?;
        if !quiet {
            println!("Report saved to: {}", path.display());
        }
    }

    if !quiet {
        print_results_summary(&report);
    }

    Ok(())
}

fn print_banner() {
    println!("imgshrink v{} - JPEG re-encoder\n", env!("CARGO_PKG_VERSION"));
}

fn print_results_summary(report: &BatchReport) {
    use humansize::{format_size, DECIMAL};

    println!("\nSummary:");
    println!("  Compressed: {} files", report.compressed_files);
    if report.rejected_files > 0 {
        println!("  Not smaller: {} files", report.rejected_files);
    }
    if report.failed_files > 0 {
        println!("  Failed: {} files", report.failed_files);
    }

    if report.original_size > 0 {
        println!("\nSpace:");
        println!("  Original size: {}", format_size(report.original_size, DECIMAL));
        println!("  Compressed size: {}", format_size(report.compressed_size, DECIMAL));
        println!(
            "  Saved: {} ({:.1}%)",
            format_size(report.space_saved, DECIMAL),
            (1.0 - report.compression_ratio) * 100.0
        );
    }

    println!("\nDuration: {}", format_duration(report.duration));

    if !report.errors.is_empty() && report.errors.len() <= 5 {
        println!("\nErrors:");
        for error in &report.errors {
            println!("  - {}", error);
        }
    } else if report.errors.len() > 5 {
        println!("\n{} errors occurred (use --report for full details)", report.errors.len());
    }
}
