pub mod kaggle;

use crate::utils::error::PrepError;
use std::fmt;
use std::str::FromStr;

/// The CoronaHack chest X-ray dataset on Kaggle
pub const DEFAULT_DATASET: &str = "praveengovi/coronahack-chest-xraydataset";

/// Metadata table shipped at the root of the dataset archive
pub const METADATA_FILE: &str = "Chest_xray_Corona_Metadata.csv";

/// Folder holding the X-ray images inside the dataset archive
pub const IMAGES_FOLDER: &str = "Coronahack-Chest-XRay-Dataset";

/// A Kaggle dataset reference: `<owner>/<dataset>[/versions/<n>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetHandle {
    pub owner: String,
    pub dataset: String,
    pub version: Option<u32>,
}

impl FromStr for DatasetHandle {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PrepError::InvalidHandle(s.to_string());
        let parts: Vec<&str> = s.trim().trim_matches('/').split('/').collect();

        if parts.iter().any(|part| part.is_empty()) {
            return Err(invalid());
        }

        match parts.as_slice() {
            [owner, dataset] => Ok(Self {
                owner: owner.to_string(),
                dataset: dataset.to_string(),
                version: None,
            }),
            [owner, dataset, "versions", version] => Ok(Self {
                owner: owner.to_string(),
                dataset: dataset.to_string(),
                version: Some(version.parse().map_err(|_| invalid())?),
            }),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for DatasetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.dataset)?;
        if let Some(version) = self.version {
            write!(f, "/versions/{}", version)?;
        }
        Ok(())
    }
}
