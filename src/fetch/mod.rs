//! Series page fetching: URL in, advertised release metadata out.

pub mod error;
pub mod page;

use async_trait::async_trait;
use url::Url;

pub use error::FetchError;

use crate::http::HttpSource;
use crate::types::Format;

/// One downloadable file advertised on a series page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesFormat {
    pub format: Format,
    pub content_url: String,
}

/// Release metadata advertised on a series page, dates verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesMetadata {
    pub release_date: String,
    pub next_release_date: String,
    /// Kept formats in page order.
    pub formats: Vec<SeriesFormat>,
}

/// Source of release metadata for a series page.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch_series_metadata(&self, url: &str) -> Result<SeriesMetadata, FetchError>;
}

#[async_trait]
impl MetadataSource for HttpSource {
    async fn fetch_series_metadata(&self, url: &str) -> Result<SeriesMetadata, FetchError> {
        let page_url = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        tracing::debug!(%url, "Fetching series page");
        let response = self
            .client()
            .get(page_url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Http {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Http {
            url: url.to_string(),
            source,
        })?;

        page::parse_series_page(&body, &page_url)
    }
}
