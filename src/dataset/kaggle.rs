use crate::dataset::DatasetHandle;
use crate::utils::error::{PrepError, Result};
use crate::utils::files::ensure_directory;
use crate::utils::http::{download_to_file, BasicAuth};
use log::{info, warn};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use zip::ZipArchive;

const API_URL: &str = "https://www.kaggle.com/api/v1";

/// Shape of `~/.kaggle/kaggle.json`
#[derive(Debug, Deserialize)]
struct KaggleCredentials {
    username: String,
    key: String,
}

/// Root of the local dataset cache: `$KAGGLEHUB_CACHE` or `~/.cache/kagglehub`
pub fn cache_root() -> Result<PathBuf> {
    if let Some(root) = env::var_os("KAGGLEHUB_CACHE") {
        return Ok(PathBuf::from(root));
    }

    let home = env::var_os("HOME").ok_or_else(|| {
        PrepError::InvalidInput("Neither KAGGLEHUB_CACHE nor HOME is set".to_string())
    })?;
    Ok(PathBuf::from(home).join(".cache").join("kagglehub"))
}

/// Directory a dataset version is extracted into
pub fn cache_dir(root: &Path, handle: &DatasetHandle) -> PathBuf {
    let version = handle
        .version
        .map_or_else(|| "latest".to_string(), |v| v.to_string());

    root.join("datasets")
        .join(&handle.owner)
        .join(&handle.dataset)
        .join("versions")
        .join(version)
}

/// `<dir>.complete`, written once the archive has been fully extracted
fn completion_marker(dir: &Path) -> PathBuf {
    let mut marker = dir.as_os_str().to_owned();
    marker.push(".complete");
    PathBuf::from(marker)
}

pub fn download_url(handle: &DatasetHandle) -> String {
    let mut url = format!(
        "{}/datasets/download/{}/{}",
        API_URL, handle.owner, handle.dataset
    );
    if let Some(version) = handle.version {
        url.push_str(&format!("?datasetVersionNumber={}", version));
    }
    url
}

/// Look up Kaggle credentials from the environment, then from `kaggle.json`.
///
/// Public datasets download without credentials, so absence is not an error.
pub fn load_credentials() -> Result<Option<BasicAuth>> {
    if let (Ok(username), Ok(key)) = (env::var("KAGGLE_USERNAME"), env::var("KAGGLE_KEY")) {
        return Ok(Some(BasicAuth {
            username,
            password: key,
        }));
    }

    let config_dir = match env::var_os("KAGGLE_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => match env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(".kaggle"),
            None => return Ok(None),
        },
    };

    credentials_from_file(&config_dir.join("kaggle.json"))
}

fn credentials_from_file(path: &Path) -> Result<Option<BasicAuth>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let credentials: KaggleCredentials = serde_json::from_str(&content)?;
    Ok(Some(BasicAuth {
        username: credentials.username,
        password: credentials.key,
    }))
}

/// Extract a zip archive into `dir`, returning the number of entries
pub fn extract_archive(archive_path: &Path, dir: &Path) -> Result<usize> {
    let file = fs::File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;
    let entries = archive.len();

    info!("Extracting {} entries into {}", entries, dir.display());
    archive.extract(dir)?;

    Ok(entries)
}

/// Download `handle` into the default cache and return its local directory
pub async fn dataset_download(handle: &DatasetHandle) -> Result<PathBuf> {
    download_into(&cache_root()?, handle).await
}

/// Download and extract `handle` under `root` unless a completed copy is cached
pub async fn download_into(root: &Path, handle: &DatasetHandle) -> Result<PathBuf> {
    let dir = cache_dir(root, handle);
    let marker = completion_marker(&dir);

    if marker.exists() && dir.is_dir() {
        info!("Using cached dataset {} at {}", handle, dir.display());
        return Ok(dir);
    }

    if let Some(parent) = dir.parent() {
        ensure_directory(parent)?;
    }
    if dir.exists() {
        warn!("Removing incomplete download at {}", dir.display());
        fs::remove_dir_all(&dir)?;
    }

    let mut archive_path = dir.as_os_str().to_owned();
    archive_path.push(".zip");
    let archive_path = PathBuf::from(archive_path);

    let credentials = load_credentials()?;
    if credentials.is_none() {
        info!("No Kaggle credentials found, downloading anonymously");
    }

    download_to_file(&download_url(handle), &archive_path, credentials.as_ref()).await?;

    fs::create_dir_all(&dir)?;
    extract_archive(&archive_path, &dir)?;
    fs::remove_file(&archive_path)?;
    fs::write(&marker, b"")?;

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn handle(version: Option<u32>) -> DatasetHandle {
        DatasetHandle {
            owner: "praveengovi".to_string(),
            dataset: "coronahack-chest-xraydataset".to_string(),
            version,
        }
    }

    #[test]
    fn cache_dir_follows_versioned_layout() {
        let root = Path::new("/cache");
        assert_eq!(
            cache_dir(root, &handle(Some(3))),
            PathBuf::from("/cache/datasets/praveengovi/coronahack-chest-xraydataset/versions/3")
        );
        assert_eq!(
            cache_dir(root, &handle(None)),
            PathBuf::from("/cache/datasets/praveengovi/coronahack-chest-xraydataset/versions/latest")
        );
    }

    #[test]
    fn marker_sits_next_to_cache_dir() {
        assert_eq!(
            completion_marker(Path::new("/cache/versions/3")),
            PathBuf::from("/cache/versions/3.complete")
        );
    }

    #[test]
    fn download_url_adds_version_query() {
        assert_eq!(
            download_url(&handle(None)),
            "https://www.kaggle.com/api/v1/datasets/download/praveengovi/coronahack-chest-xraydataset"
        );
        assert!(download_url(&handle(Some(2))).ends_with("?datasetVersionNumber=2"));
    }

    #[test]
    fn credentials_are_read_from_kaggle_json() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("kaggle.json");
        fs::write(&path, r#"{"username": "alice", "key": "s3cret"}"#).unwrap();

        let auth = credentials_from_file(&path).unwrap().unwrap();
        assert_eq!(auth.username, "alice");
        assert_eq!(auth.password, "s3cret");

        assert_eq!(credentials_from_file(&temp.path().join("missing.json")).unwrap(), None);
    }

    #[test]
    fn malformed_kaggle_json_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("kaggle.json");
        fs::write(&path, "{not json").unwrap();

        assert!(matches!(credentials_from_file(&path), Err(PrepError::Json(_))));
    }

    #[test]
    fn extract_archive_unpacks_nested_entries() {
        let temp = tempfile::tempdir().expect("tempdir");
        let archive_path = temp.path().join("dataset.zip");

        {
            let file = fs::File::create(&archive_path).unwrap();
            let mut zip = zip::ZipWriter::new(file);
            zip.start_file("Chest_xray_Corona_Metadata.csv", SimpleFileOptions::default())
                .unwrap();
            zip.write_all(b"X_ray_image_name,Label\n").unwrap();
            zip.start_file(
                "Coronahack-Chest-XRay-Dataset/train/a.jpeg",
                SimpleFileOptions::default(),
            )
            .unwrap();
            zip.write_all(b"jpeg").unwrap();
            zip.finish().unwrap();
        }

        let out = temp.path().join("out");
        fs::create_dir_all(&out).unwrap();
        let entries = extract_archive(&archive_path, &out).unwrap();

        assert_eq!(entries, 2);
        assert!(out.join("Chest_xray_Corona_Metadata.csv").is_file());
        assert_eq!(
            fs::read(out.join("Coronahack-Chest-XRay-Dataset/train/a.jpeg")).unwrap(),
            b"jpeg"
        );
    }

    #[tokio::test]
    async fn completed_cache_is_reused_without_download() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = cache_dir(temp.path(), &handle(Some(1)));
        fs::create_dir_all(&dir).unwrap();
        fs::write(completion_marker(&dir), b"").unwrap();

        let resolved = download_into(temp.path(), &handle(Some(1))).await.unwrap();
        assert_eq!(resolved, dir);
    }
}
