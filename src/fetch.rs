use crate::dataset::{kaggle, DatasetHandle, DEFAULT_DATASET, IMAGES_FOLDER, METADATA_FILE};
use crate::relabel::MetadataTable;
use crate::utils::error::Result;
use crate::utils::files::{copy_file, ensure_directory, replace_dir};
use clap::Args;
use log::{error, info, warn};
use std::path::{Path, PathBuf};

const PREVIEW_ROWS: usize = 5;

/// Fetch parameters
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Directory the dataset is copied into
    #[arg(short, long, default_value = "coronahack_dataset")]
    pub path: PathBuf,

    /// Kaggle dataset handle: <owner>/<dataset>[/versions/<n>]
    #[arg(short, long, default_value = DEFAULT_DATASET)]
    pub dataset: String,
}

/// An artifact that could not be copied out of the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFailure {
    pub artifact: PathBuf,
    pub error: String,
}

/// What a fetch left in the destination directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    pub cache_dir: PathBuf,
    pub copied: Vec<PathBuf>,
    pub failures: Vec<CopyFailure>,
}

impl FetchReport {
    /// True when every artifact reached the destination
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Download the dataset into the cache and copy its metadata file and
/// image folder into `args.path`.
///
/// Download errors are returned. Copy errors are logged and collected in the
/// report so the remaining artifacts are still copied.
pub async fn fetch_dataset(args: &FetchArgs) -> Result<FetchReport> {
    let handle: DatasetHandle = args.dataset.parse()?;

    ensure_directory(&args.path)?;

    let cache_dir = kaggle::dataset_download(&handle).await?;
    info!("Dataset downloaded (cache): {}", cache_dir.display());

    let report = copy_dataset(&cache_dir, &args.path);

    preview_metadata(&args.path.join(METADATA_FILE));
    info!("Local dataset path: {}", args.path.display());

    Ok(report)
}

/// Copy the metadata file and image folder from `cache_dir` into `destination`.
///
/// An existing image folder in `destination` is removed and replaced.
pub fn copy_dataset(cache_dir: &Path, destination: &Path) -> FetchReport {
    let mut report = FetchReport {
        cache_dir: cache_dir.to_path_buf(),
        ..Default::default()
    };

    let metadata_target = destination.join(METADATA_FILE);
    match copy_file(&cache_dir.join(METADATA_FILE), &metadata_target) {
        Ok(_) => {
            info!("Metadata copied to: {}", metadata_target.display());
            report.copied.push(metadata_target);
        }
        Err(e) => {
            error!("Failed to copy metadata file: {}", e);
            report.failures.push(CopyFailure {
                artifact: metadata_target,
                error: e.to_string(),
            });
        }
    }

    let images_target = destination.join(IMAGES_FOLDER);
    match replace_dir(&cache_dir.join(IMAGES_FOLDER), &images_target) {
        Ok(files) => {
            info!(
                "Image folder copied to: {} ({} files)",
                images_target.display(),
                files
            );
            report.copied.push(images_target);
        }
        Err(e) => {
            error!("Failed to copy image folder: {}", e);
            report.failures.push(CopyFailure {
                artifact: images_target,
                error: e.to_string(),
            });
        }
    }

    report
}

fn preview_metadata(path: &Path) {
    match MetadataTable::read(path) {
        Ok(table) => {
            info!("First rows of {} ({} rows):", path.display(), table.len());
            table.log_head(PREVIEW_ROWS);
        }
        Err(e) => warn!("Could not preview {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn fake_cache(root: &Path) -> PathBuf {
        let cache = root.join("cache");
        fs::create_dir_all(cache.join(IMAGES_FOLDER).join("train")).unwrap();
        fs::create_dir_all(cache.join(IMAGES_FOLDER).join("test")).unwrap();
        fs::write(
            cache.join(METADATA_FILE),
            "X_ray_image_name,Label\nIM-0001.jpeg,Normal\n",
        )
        .unwrap();
        fs::write(cache.join(IMAGES_FOLDER).join("train/IM-0001.jpeg"), b"img").unwrap();
        cache
    }

    #[test]
    fn copies_metadata_and_images() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cache = fake_cache(temp.path());
        let destination = temp.path().join("coronahack_dataset");
        fs::create_dir_all(&destination).unwrap();

        let report = copy_dataset(&cache, &destination);

        assert!(report.is_complete());
        assert_eq!(
            report.copied,
            vec![destination.join(METADATA_FILE), destination.join(IMAGES_FOLDER)]
        );
        assert_eq!(
            fs::read(destination.join(IMAGES_FOLDER).join("train/IM-0001.jpeg")).unwrap(),
            b"img"
        );
        assert!(destination.join(IMAGES_FOLDER).join("test").is_dir());
    }

    #[test]
    fn existing_image_folder_is_replaced() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cache = fake_cache(temp.path());
        let destination = temp.path().join("dest");
        let stale = destination.join(IMAGES_FOLDER).join("stale.jpeg");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, b"old").unwrap();

        let report = copy_dataset(&cache, &destination);

        assert!(report.is_complete());
        assert!(!stale.exists());
        assert!(destination.join(IMAGES_FOLDER).join("train/IM-0001.jpeg").is_file());
    }

    #[test]
    fn missing_metadata_is_reported_and_images_still_copied() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cache = fake_cache(temp.path());
        fs::remove_file(cache.join(METADATA_FILE)).unwrap();
        let destination = temp.path().join("dest");

        let report = copy_dataset(&cache, &destination);

        assert!(!report.is_complete());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].artifact, destination.join(METADATA_FILE));
        assert_eq!(report.copied, vec![destination.join(IMAGES_FOLDER)]);
    }

    #[tokio::test]
    async fn invalid_handle_fails_before_touching_disk() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("never-created");

        let result = fetch_dataset(&FetchArgs {
            path: path.clone(),
            dataset: "not-a-handle".to_string(),
        })
        .await;

        assert!(result.is_err());
        assert!(!path.exists());
    }
}
