use log::{debug, info};
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Ensure a directory exists, creating it and any missing parents
pub fn ensure_directory(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        info!("Created directory: {}", path.display());
    }
    Ok(())
}

/// Copy a single file, creating the target's parent directory if needed
pub fn copy_file(source: &Path, target: &Path) -> io::Result<u64> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, target)
}

/// Replace `target` with a full copy of the `source` directory tree.
///
/// An existing `target` is removed first; nothing is merged. Returns the
/// number of files copied.
pub fn replace_dir(source: &Path, target: &Path) -> io::Result<usize> {
    if !source.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Source directory not found: {}", source.display()),
        ));
    }

    if target.exists() {
        debug!("Removing existing directory: {}", target.display());
        fs::remove_dir_all(target)?;
    }

    let mut copied = 0;
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let destination = target.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&destination)?;
        } else {
            fs::copy(entry.path(), &destination)?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Count every non-directory entry below `root`
pub fn count_files(root: &Path) -> usize {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| !entry.file_type().is_dir())
        .count()
}
