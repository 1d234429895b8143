use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use imgshrink::{
    compute_output_path, generate_report, render_log_entry, run_batch, CompressError,
    CompressionOptions, Dimensions, FileStatus, ReportFormat, ShrinkCore,
};

/// Smooth gradient stored as BMP, which JPEG beats by a wide margin.
fn write_photo(path: &Path, width: u32, height: u32) {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width) as u8,
            (y * 255 / height) as u8,
            ((x + y) % 256) as u8 / 2 + 64,
        ])
    })
    .save(path)
    .unwrap();
}

fn write_dot(path: &Path) {
    RgbImage::from_pixel(1, 1, Rgb([10, 200, 90])).save(path).unwrap();
}

#[test]
fn resize_scenario_halves_dimensions_and_shrinks() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("landscape.bmp");
    write_photo(&input, 600, 400);

    let results = run_batch(&[input.clone()], 80, Some(300)).unwrap();
    let outcome = results[0].as_ref().unwrap();

    assert!(outcome.succeeded);
    assert_eq!(outcome.original_dimensions, Dimensions::new(600, 400));
    assert_eq!(outcome.new_dimensions, Dimensions::new(300, 200));
    assert!(outcome.new_size < outcome.original_size);
    assert!(outcome.reduction_percent() > 0.0);
    assert_eq!(outcome.output_path, tmp.path().join("landscape-s.bmp"));
    assert!(outcome.output_path.exists());
}

#[test]
fn resize_height_is_rounded() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("odd.bmp");
    write_photo(&input, 300, 200);

    // 100 * 200 / 300 = 66.67
    let results = run_batch(&[input], 70, Some(100)).unwrap();
    assert_eq!(
        results[0].as_ref().unwrap().new_dimensions,
        Dimensions::new(100, 67)
    );
}

#[test]
fn successful_outputs_are_always_smaller() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("photo.bmp");
    write_photo(&input, 200, 150);

    for quality in [1, 30, 60, 95, 100] {
        let results = run_batch(&[input.clone()], quality, None).unwrap();
        let outcome = results[0].as_ref().unwrap();
        if outcome.succeeded {
            assert!(outcome.new_size < outcome.original_size, "quality {quality}");
            assert!(outcome.output_path.exists());
        } else {
            assert!(!outcome.output_path.exists());
        }
    }
}

#[test]
fn tiny_png_at_full_quality_leaves_nothing_behind() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("dot.png");
    write_dot(&input);

    let results = run_batch(&[input.clone()], 100, None).unwrap();
    let outcome = results[0].as_ref().unwrap();

    assert!(!outcome.succeeded);
    assert!(!compute_output_path(&input).exists());
    assert!(input.exists());
    assert_eq!(
        render_log_entry(&input, &results[0]).lines().last().unwrap(),
        format!("Compression failed for {}", input.display())
    );
}

#[test]
fn repeated_runs_produce_identical_output() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("photo.bmp");
    write_photo(&input, 160, 120);

    let first = run_batch(&[input.clone()], 75, Some(80)).unwrap();
    let first_bytes = std::fs::read(compute_output_path(&input)).unwrap();
    let second = run_batch(&[input.clone()], 75, Some(80)).unwrap();
    let second_bytes = std::fs::read(compute_output_path(&input)).unwrap();

    let (first, second) = (first[0].as_ref().unwrap(), second[0].as_ref().unwrap());
    assert!(first.succeeded && second.succeeded);
    assert_eq!(first.new_size, second.new_size);
    assert_eq!(first_bytes, second_bytes);
}

#[test]
fn corrupt_file_in_the_middle_does_not_stop_the_batch() {
    let tmp = TempDir::new().unwrap();
    let first = tmp.path().join("one.bmp");
    let corrupt = tmp.path().join("two.jpg");
    let third = tmp.path().join("three.bmp");
    write_photo(&first, 120, 80);
    std::fs::write(&corrupt, b"\xFF\xD8 definitely not a jpeg").unwrap();
    write_photo(&third, 120, 80);

    let inputs = vec![first.clone(), corrupt.clone(), third.clone()];
    let results = run_batch(&inputs, 80, None).unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().input_path, first);
    match &results[1] {
        Err(CompressError::Load { path, .. }) => assert_eq!(path, &corrupt),
        other => panic!("expected a load error, got {other:?}"),
    }
    assert_eq!(results[2].as_ref().unwrap().input_path, third);
    assert!(!compute_output_path(&corrupt).exists());
}

#[test]
fn invalid_quality_touches_no_file() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("photo.bmp");
    write_photo(&input, 64, 64);

    for quality in [0, 101] {
        assert!(matches!(
            run_batch(&[input.clone()], quality, None),
            Err(CompressError::InvalidQuality(_))
        ));
    }
    assert!(!compute_output_path(&input).exists());
}

#[test]
fn core_report_covers_every_file_in_order() {
    let tmp = TempDir::new().unwrap();
    let photo = tmp.path().join("photo.bmp");
    let dot = tmp.path().join("dot.png");
    let missing = tmp.path().join("missing.gif");
    write_photo(&photo, 200, 100);
    write_dot(&dot);

    let inputs: Vec<PathBuf> = vec![photo.clone(), dot, missing];
    let mut core = ShrinkCore::new(CompressionOptions::new().with_quality(100));
    let report = core.run(&inputs).unwrap();

    assert_eq!(report.total_files, 3);
    assert_eq!(report.compressed_files, 1);
    assert_eq!(report.rejected_files, 1);
    assert_eq!(report.failed_files, 1);
    let statuses: Vec<FileStatus> = report.files.iter().map(|f| f.status).collect();
    assert_eq!(
        statuses,
        vec![FileStatus::Compressed, FileStatus::NotSmaller, FileStatus::Failed]
    );
    assert!(report.compression_ratio > 0.0 && report.compression_ratio < 1.0);
    assert_eq!(report.original_size, std::fs::metadata(&photo).unwrap().len());
    assert_eq!(report.space_saved, report.original_size - report.compressed_size);

    let written = generate_report(&report, ReportFormat::Csv, tmp.path()).unwrap();
    assert_eq!(std::fs::read_to_string(written).unwrap().lines().count(), 4);
}
