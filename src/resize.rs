use crate::utils::error::{PrepError, Result};
use crate::utils::files::{count_files, ensure_directory};
use crate::utils::images::{resize_image, ResizeOptions};
use clap::Args;
use image::ImageError;
use log::{error, info, warn};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Resize parameters
#[derive(Args, Debug, Clone)]
pub struct ResizeArgs {
    /// Directory tree holding the original images
    #[arg(short, long, default_value = "dataset_classificado/imagens")]
    pub input: PathBuf,

    /// Root the resized tree is written under
    #[arg(short, long, default_value = "coronahack_dataset_resized")]
    pub output: PathBuf,

    /// Width for resized images
    #[arg(long, default_value_t = 128)]
    pub width: u32,

    /// Height for resized images
    #[arg(long, default_value_t = 128)]
    pub height: u32,

    /// Encoder quality (0-100), only used for JPEG output
    #[arg(short, long, default_value_t = 90)]
    pub quality: u8,

    /// Output format applied to every image (jpeg, png, bmp, ...)
    #[arg(short, long, default_value = "jpeg")]
    pub format: String,
}

impl ResizeArgs {
    pub fn options(&self) -> Result<ResizeOptions> {
        ResizeOptions::new(self.width, self.height, self.quality, &self.format)
    }
}

/// Why a file produced no output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The file disappeared between listing and opening
    Missing,
    /// Content is not a decodable image
    Unrecognized(String),
    /// Any other failure while decoding, resizing or saving
    Failed(String),
}

impl From<PrepError> for SkipReason {
    fn from(err: PrepError) -> Self {
        match err {
            PrepError::Io(e) if e.kind() == io::ErrorKind::NotFound => Self::Missing,
            PrepError::Image(ImageError::IoError(e)) if e.kind() == io::ErrorKind::NotFound => {
                Self::Missing
            }
            PrepError::Image(e @ (ImageError::Unsupported(_) | ImageError::Decoding(_))) => {
                Self::Unrecognized(e.to_string())
            }
            other => Self::Failed(other.to_string()),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "file not found"),
            Self::Unrecognized(e) => write!(f, "not a recognized image: {}", e),
            Self::Failed(e) => write!(f, "unexpected error: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Aggregate outcome of a resize run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResizeSummary {
    /// Files found below the input root when the run started
    pub total_files: usize,
    pub processed: usize,
    pub skipped: Vec<SkippedFile>,
}

impl ResizeSummary {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    fn skip(&mut self, path: PathBuf, reason: SkipReason) {
        match &reason {
            SkipReason::Failed(_) => {
                error!("Error processing '{}': {}. Skipping.", path.display(), reason)
            }
            _ => warn!("Skipping '{}': {}", path.display(), reason),
        }
        self.skipped.push(SkippedFile { path, reason });
    }
}

/// Whether the processed count hits a progress checkpoint: every 100 files,
/// and every tenth of the estimated total once there are at least 10 files.
fn is_progress_checkpoint(processed: usize, total: usize) -> bool {
    processed % 100 == 0 || (total >= 10 && processed % (total / 10) == 0)
}

/// Mirror `input_root` under `output_root`, writing a resized copy of every
/// readable image.
///
/// Every directory is recreated even when none of its files can be
/// processed. Per-file failures are recorded in the summary and never stop
/// the walk. `input_root` is assumed to exist.
pub fn resize_tree(
    input_root: &Path,
    output_root: &Path,
    options: &ResizeOptions,
) -> Result<ResizeSummary> {
    ensure_directory(output_root)?;

    let mut summary = ResizeSummary {
        total_files: count_files(input_root),
        ..Default::default()
    };

    info!(
        "Resizing images from '{}' into '{}' at {}x{} as '{}'...",
        input_root.display(),
        output_root.display(),
        options.width,
        options.height,
        options.format.extension()
    );

    for entry in WalkDir::new(input_root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                summary.skip(path, SkipReason::Failed(e.to_string()));
                continue;
            }
        };

        let relative = match entry.path().strip_prefix(input_root) {
            Ok(relative) => relative,
            Err(e) => {
                let reason = SkipReason::Failed(e.to_string());
                summary.skip(entry.path().to_path_buf(), reason);
                continue;
            }
        };

        if entry.file_type().is_dir() {
            fs::create_dir_all(output_root.join(relative))?;
            continue;
        }

        let output_dir = match relative.parent() {
            Some(parent) => output_root.join(parent),
            None => output_root.to_path_buf(),
        };
        let target = options.output_path(&output_dir, Path::new(entry.file_name()));

        match resize_image(entry.path(), &target, options) {
            Ok(()) => {
                summary.processed += 1;
                if is_progress_checkpoint(summary.processed, summary.total_files) {
                    info!(
                        "Progress: {}/{} images processed.",
                        summary.processed, summary.total_files
                    );
                }
            }
            Err(e) => summary.skip(entry.path().to_path_buf(), e.into()),
        }
    }

    info!("Resizing complete!");
    info!("Images processed: {}", summary.processed);
    info!("Files skipped or failed: {}", summary.skipped_count());

    Ok(summary)
}

/// Entry point of the `resize` command: checks the input directory exists,
/// validates the options and resizes the tree.
pub fn run(args: &ResizeArgs) -> Result<ResizeSummary> {
    if !args.input.exists() {
        return Err(PrepError::MissingInput(args.input.clone()));
    }

    let options = args.options()?;
    let summary = resize_tree(&args.input, &args.output, &options)?;
    info!("Resized images are available in: {}", args.output.display());

    Ok(summary)
}
