use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageError, ImageReader, Limits};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::utils::compute_output_path;
use crate::{CompressError, CompressionOutcome, CompressionRequest, Dimensions, FileResult, Quality};

/// Colour layout of a decoded image, as far as the JPEG encoder cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Grayscale,
    GrayscaleAlpha,
    Rgb,
    Rgba,
}

impl ColorMode {
    pub fn of(img: &DynamicImage) -> Self {
        let color = img.color();
        match (color.has_color(), color.has_alpha()) {
            (false, false) => ColorMode::Grayscale,
            (false, true) => ColorMode::GrayscaleAlpha,
            (true, false) => ColorMode::Rgb,
            (true, true) => ColorMode::Rgba,
        }
    }

    pub fn has_alpha(self) -> bool {
        matches!(self, ColorMode::GrayscaleAlpha | ColorMode::Rgba)
    }
}

/// Reduce `img` to 8-bit samples without an alpha channel.
///
/// Grayscale stays single-channel; everything else becomes RGB. Alpha is
/// dropped, not composited. Palette images are already expanded to RGB(A) by
/// the decoder, so they land in the RGB branch.
pub fn to_opaque_color_space(img: DynamicImage) -> DynamicImage {
    let mode = ColorMode::of(&img);
    if mode.has_alpha() {
        log::debug!("Dropping alpha channel of {:?} image", mode);
    }
    match mode {
        ColorMode::Grayscale => DynamicImage::ImageLuma8(img.into_luma8()),
        ColorMode::GrayscaleAlpha | ColorMode::Rgb | ColorMode::Rgba => {
            DynamicImage::ImageRgb8(img.into_rgb8())
        }
    }
}

/// Scale `original` to `target_width`, keeping the aspect ratio.
///
/// Height is `round(target_width * height / width)`, never less than one pixel.
pub fn resized_dimensions(original: Dimensions, target_width: u32) -> Dimensions {
    let height = (target_width as f64 * original.height as f64 / original.width as f64).round();
    Dimensions::new(target_width, (height as u32).max(1))
}

/// Largest width or height a baseline JPEG can describe.
pub const MAX_JPEG_DIMENSION: u32 = u16::MAX as u32;

/// Refuse targets the encoder cannot write or that would need an absurd buffer.
///
/// Uses the default `image` allocation budget, so a huge `target_width`
/// fails this one file instead of aborting the process.
fn check_target_size(target: Dimensions, channels: u64) -> Result<(), ImageError> {
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_JPEG_DIMENSION);
    limits.max_image_height = Some(MAX_JPEG_DIMENSION);
    limits.check_dimensions(target.width, target.height)?;
    limits.reserve(target.width as u64 * target.height as u64 * channels)
}

/// Decode `path`, detecting the format from its contents rather than its name.
fn load_image(path: &Path) -> Result<DynamicImage, ImageError> {
    ImageReader::open(path)?.with_guessed_format()?.decode()
}

/// Compress one request into its derived output path.
pub fn compress_request(request: &CompressionRequest) -> FileResult {
    let output_path = compute_output_path(&request.input_path);
    log::debug!("{} -> {}", request.input_path.display(), output_path.display());
    ImageCompressor::from_request(request).transcode(&request.input_path, &output_path)
}

/// Re-encodes single images as JPEG.
pub struct ImageCompressor {
    quality: Quality,
    target_width: Option<u32>,
}

impl ImageCompressor {
    pub fn new(quality: Quality, target_width: Option<u32>) -> Self {
        Self {
            quality,
            target_width,
        }
    }

    pub fn from_request(request: &CompressionRequest) -> Self {
        Self::new(request.quality, request.target_width)
    }

    /// Compress `input_path` into `output_path`.
    ///
    /// The output is kept only if it is strictly smaller than the input.
    /// Otherwise it is deleted again and the outcome comes back with
    /// `succeeded == false`. The input file is never modified.
    pub fn transcode(
        &self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<CompressionOutcome, CompressError> {
        let img = load_image(input_path).map_err(|source| CompressError::Load {
            path: input_path.to_path_buf(),
            source,
        })?;

        let (width, height) = img.dimensions();
        let original_dimensions = Dimensions::new(width, height);
        log::debug!(
            "Loaded {} {} {:?}",
            input_path.display(),
            original_dimensions,
            ColorMode::of(&img)
        );

        let img = to_opaque_color_space(img);
        let img = match self.target_width {
            Some(target_width) => {
                let target = resized_dimensions(original_dimensions, target_width);
                check_target_size(target, img.color().channel_count() as u64).map_err(
                    |source| CompressError::Encode {
                        path: input_path.to_path_buf(),
                        source,
                    },
                )?;
                img.resize_exact(target.width, target.height, FilterType::Lanczos3)
            }
            None => img,
        };
        let new_dimensions = Dimensions::new(img.width(), img.height());

        self.encode(&img, input_path, output_path)?;

        let original_size = file_size(input_path)?;
        let new_size = file_size(output_path)?;

        let succeeded = new_size < original_size;
        if !succeeded {
            log::warn!(
                "{} did not shrink at quality {} ({} -> {} bytes), removing {}",
                input_path.display(),
                self.quality,
                original_size,
                new_size,
                output_path.display()
            );
            std::fs::remove_file(output_path).map_err(|source| CompressError::Io {
                path: output_path.to_path_buf(),
                source,
            })?;
        }

        Ok(CompressionOutcome {
            input_path: input_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            original_size,
            new_size,
            original_dimensions,
            new_dimensions,
            succeeded,
        })
    }

    fn encode(
        &self,
        img: &DynamicImage,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<(), CompressError> {
        let file = File::create(output_path).map_err(|source| CompressError::Io {
            path: output_path.to_path_buf(),
            source,
        })?;

        if let Err(e) = write_jpeg(img, self.quality, file) {
            // A half-written file is worse than none.
            let _ = std::fs::remove_file(output_path);
            return Err(match e {
                ImageError::IoError(source) => CompressError::Io {
                    path: output_path.to_path_buf(),
                    source,
                },
                source => CompressError::Encode {
                    path: input_path.to_path_buf(),
                    source,
                },
            });
        }
        Ok(())
    }
}

/// Encode `img` as JPEG into `writer`, flushing so late write errors surface.
fn write_jpeg<W: Write>(img: &DynamicImage, quality: Quality, writer: W) -> Result<(), ImageError> {
    let mut writer = BufWriter::new(writer);
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, quality.value()))?;
    writer.flush()?;
    Ok(())
}

fn file_size(path: &Path) -> Result<u64, CompressError> {
    std::fs::metadata(path)
        .map(|metadata| metadata.len())
        .map_err(|source| CompressError::Io {
            path: path.to_path_buf(),
            source,
        })
}
