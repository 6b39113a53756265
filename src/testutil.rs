//! Shared fakes for the collaborator traits.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::download::{ArtifactSource, DownloadError};
use crate::fetch::{FetchError, MetadataSource, SeriesFormat, SeriesMetadata};
use crate::types::Format;

pub fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("mei_rs_tests").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn metadata(release: &str, next: &str, formats: &[(Format, &str)]) -> SeriesMetadata {
    SeriesMetadata {
        release_date: release.to_string(),
        next_release_date: next.to_string(),
        formats: formats
            .iter()
            .map(|(format, url)| SeriesFormat {
                format: *format,
                content_url: url.to_string(),
            })
            .collect(),
    }
}

/// Serves canned metadata per page URL. Unknown URLs fail like a page with
/// no release date.
#[derive(Default)]
pub struct FakePages {
    pages: Mutex<HashMap<String, SeriesMetadata>>,
    calls: AtomicUsize,
}

impl FakePages {
    pub fn with(self, url: &str, meta: SeriesMetadata) -> Self {
        self.set(url, meta);
        self
    }

    pub fn set(&self, url: &str, meta: SeriesMetadata) {
        self.pages.lock().unwrap().insert(url.to_string(), meta);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataSource for FakePages {
    async fn fetch_series_metadata(&self, url: &str) -> Result<SeriesMetadata, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or(FetchError::MissingField("release date"))
    }
}

/// Serves canned bytes per artifact URL. Unknown URLs answer 404.
#[derive(Default)]
pub struct FakeFiles {
    files: HashMap<String, Vec<u8>>,
    requested: Mutex<Vec<String>>,
}

impl FakeFiles {
    pub fn with(mut self, url: &str, bytes: &[u8]) -> Self {
        self.files.insert(url.to_string(), bytes.to_vec());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactSource for FakeFiles {
    async fn download_bytes(&self, url: &str) -> Result<Vec<u8>, DownloadError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| DownloadError::HttpStatus {
                status: 404,
                url: url.to_string(),
            })
    }
}
