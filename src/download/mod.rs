//! Data file downloads: fetch the bytes for one advertised format and land
//! them in the series data tree.

pub mod error;
pub mod file;
pub mod paths;

use async_trait::async_trait;

pub use error::DownloadError;

use crate::http::HttpSource;

/// Source of raw artifact bytes.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    async fn download_bytes(&self, url: &str) -> Result<Vec<u8>, DownloadError>;
}

#[async_trait]
impl ArtifactSource for HttpSource {
    async fn download_bytes(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        let response = self
            .client()
            .get(url)
            .send()
            .await
            .map_err(|source| DownloadError::Http {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(DownloadError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await.map_err(|source| DownloadError::Http {
            url: url.to_string(),
            source,
        })?;
        tracing::debug!(%url, bytes = bytes.len(), "Downloaded artifact");
        Ok(bytes.to_vec())
    }
}
