use thiserror::Error;

/// Reasons a single format download did not leave a usable file on disk.
///
/// These are recorded against the series and never abort the run.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP error {status} downloading {url}")]
    HttpStatus { status: u16, url: String },

    #[error("HTTP error downloading {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Disk error: {0}")]
    Disk(#[from] std::io::Error),

    #[error("Downloaded file {0} is empty")]
    EmptyArtifact(String),

    #[error("Downloaded file {0} is missing after write")]
    MissingArtifact(String),
}
