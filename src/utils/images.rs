use crate::utils::error::{PrepError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, ImageFormat, ImageReader};
use log::debug;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Largest side the ICO encoder accepts
const ICO_MAX_SIDE: u32 = 256;

/// Formats whose encoder takes 8-bit RGB input
fn encodes_rgb8(format: ImageFormat) -> bool {
    matches!(
        format,
        ImageFormat::Jpeg
            | ImageFormat::Png
            | ImageFormat::Bmp
            | ImageFormat::Gif
            | ImageFormat::Tiff
            | ImageFormat::WebP
            | ImageFormat::Tga
            | ImageFormat::Pnm
            | ImageFormat::Qoi
            | ImageFormat::Ico
            | ImageFormat::Avif
    )
}

/// Format every resized image is written in.
///
/// `name` is kept as given (lowercased) because it doubles as the output
/// file extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFormat {
    name: String,
    format: ImageFormat,
}

impl OutputFormat {
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim().trim_start_matches('.').to_ascii_lowercase();
        let format = ImageFormat::from_extension(&name)
            .filter(|format| format.writing_enabled() && encodes_rgb8(*format))
            .ok_or_else(|| PrepError::UnsupportedFormat(name.clone()))?;

        Ok(Self { name, format })
    }

    pub fn extension(&self) -> &str {
        &self.name
    }

    pub fn image_format(&self) -> ImageFormat {
        self.format
    }

    /// Whether the encoder honours a quality setting
    pub fn is_lossy(&self) -> bool {
        self.format == ImageFormat::Jpeg
    }
}

/// Parameters applied uniformly to every file of a resize run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeOptions {
    pub width: u32,
    pub height: u32,
    /// 0-100, only used when the output format is lossy
    pub quality: u8,
    pub format: OutputFormat,
}

impl ResizeOptions {
    pub fn new(width: u32, height: u32, quality: u8, format: &str) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PrepError::InvalidInput(format!(
                "Target size must be non-zero, got {}x{}",
                width, height
            )));
        }
        if quality > 100 {
            return Err(PrepError::InvalidInput(format!(
                "Quality must be between 0 and 100, got {}",
                quality
            )));
        }

        let format = OutputFormat::parse(format)?;
        if format.image_format() == ImageFormat::Ico
            && (width > ICO_MAX_SIDE || height > ICO_MAX_SIDE)
        {
            return Err(PrepError::InvalidInput(format!(
                "ICO output is limited to {}x{}, got {}x{}",
                ICO_MAX_SIDE, ICO_MAX_SIDE, width, height
            )));
        }

        Ok(Self {
            width,
            height,
            quality,
            format,
        })
    }

    /// Output path for `file_name` inside `dir`: same base name, output extension
    pub fn output_path(&self, dir: &Path, file_name: &Path) -> PathBuf {
        let stem = file_name
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        dir.join(format!("{}.{}", stem, self.format.extension()))
    }
}

/// Decode `source`, force it to RGB, resize it to exactly the target size and
/// write it to `target` in the configured format.
///
/// Alpha channels and palette or greyscale modes are flattened to 8-bit RGB.
/// The aspect ratio is not preserved. Nothing is written to `target` unless
/// encoding succeeds; encoder failures are returned as `PrepError::Encode`.
pub fn resize_image(source: &Path, target: &Path, options: &ResizeOptions) -> Result<()> {
    let img = ImageReader::open(source)?.with_guessed_format()?.decode()?;

    if img.color() != ColorType::Rgb8 {
        debug!(
            "Converting {} from {:?} to RGB8",
            source.display(),
            img.color()
        );
    }
    let rgb = img.into_rgb8();

    let resized = image::imageops::resize(
        &rgb,
        options.width,
        options.height,
        FilterType::Lanczos3,
    );

    let mut encoded = Cursor::new(Vec::new());
    if options.format.is_lossy() {
        JpegEncoder::new_with_quality(&mut encoded, options.quality.clamp(1, 100))
            .encode_image(&resized)
            .map_err(PrepError::Encode)?;
    } else {
        resized
            .write_to(&mut encoded, options.format.image_format())
            .map_err(PrepError::Encode)?;
    }

    fs::write(target, encoded.into_inner())?;
    Ok(())
}
