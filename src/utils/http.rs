use crate::utils::error::{PrepError, Result};
use futures::stream::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Optional basic-auth credentials attached to a download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

/// Stream the body of `url` into `file_path`, showing a byte progress bar.
///
/// Returns the number of bytes written. A non-success status is an error and
/// leaves no file behind.
pub async fn download_to_file(
    url: &str,
    file_path: &Path,
    auth: Option<&BasicAuth>,
) -> Result<u64> {
    let client = reqwest::Client::new();

    info!("Downloading {}...", url);

    let mut request = client.get(url).header("User-Agent", get_user_agent());
    if let Some(auth) = auth {
        request = request.basic_auth(&auth.username, Some(&auth.password));
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        return Err(PrepError::Http {
            status: response.status(),
            url: url.to_string(),
        });
    }

    let pb = match response.content_length() {
        Some(len) => {
            let pb = ProgressBar::new(len);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    let mut file = tokio::fs::File::create(file_path).await?;
    let mut written = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        pb.set_position(written);
    }
    file.flush().await?;

    pb.finish_with_message("Download complete!");
    info!("Successfully downloaded: {}", file_path.display());
    Ok(written)
}

/// Get standard user agent string
pub fn get_user_agent() -> &'static str {
    concat!("xray-prep/", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_carries_crate_version() {
        assert!(get_user_agent().starts_with("xray-prep/"));
        assert!(get_user_agent().ends_with(env!("CARGO_PKG_VERSION")));
    }
}
