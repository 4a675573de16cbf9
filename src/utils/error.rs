use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrepError {
    #[error("Invalid dataset handle '{0}', expected <owner>/<dataset>[/versions/<n>]")]
    InvalidHandle(String),

    #[error("Column '{0}' not found in metadata table")]
    MissingColumn(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Input directory '{}' was not found", .0.display())]
    MissingInput(std::path::PathBuf),

    #[error("Image encoding failed: {0}")]
    Encode(image::ImageError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("HTTP {status} for URL: {url}")]
    Http {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, PrepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_convert_and_keep_their_message() {
        let err: PrepError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file").into();
        assert!(matches!(err, PrepError::Io(_)));
        assert_eq!(err.to_string(), "IO error: no such file");
    }

    #[test]
    fn missing_column_names_the_column() {
        let err = PrepError::MissingColumn("Dataset_type".to_string());
        assert_eq!(
            err.to_string(),
            "Column 'Dataset_type' not found in metadata table"
        );
    }
}
