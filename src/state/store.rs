//! State store trait and JSON document implementation.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use fs4::fs_std::FileExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{FilesystemError, SeriesRecord, StateDocument, StateError};
use crate::types::Format;

/// Read-modify-write access to the global marker and per-series records.
///
/// Every mutating call persists the whole document before it returns. A
/// failed write leaves both the file on disk and the values returned by
/// later reads exactly as they were before the call.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Day the batch last ran to completion.
    async fn last_processed(&self) -> NaiveDate;

    /// Advance the global marker. Dates after today are rejected.
    async fn set_last_processed(&self, date: NaiveDate) -> Result<(), StateError>;

    /// Get the record for a series, inserting and persisting the sentinel
    /// defaults first if the series has never been seen.
    async fn series_record(&self, id: &str) -> Result<SeriesRecord, StateError>;

    /// Overwrite the release and next-release dates of a series.
    async fn update_series_metadata(
        &self,
        id: &str,
        release_date: &str,
        next_release_date: &str,
    ) -> Result<(), StateError>;

    /// Record a verified download: sets the last-downloaded date and clears
    /// any previous error.
    async fn record_download_success(&self, id: &str, date: NaiveDate) -> Result<(), StateError>;

    /// Record a failed download. The last-downloaded date is left alone.
    async fn record_download_failure(&self, id: &str, message: &str) -> Result<(), StateError>;

    /// Create `<data_dir>/<id>/<FORMAT>` if needed and return it.
    async fn ensure_series_directories(
        &self,
        id: &str,
        format: Format,
    ) -> Result<PathBuf, FilesystemError>;

    /// Copy of the whole document.
    async fn snapshot(&self) -> StateDocument;
}

/// State store backed by a single pretty-printed JSON file.
///
/// Writes go to `<file>.tmp` and are renamed over the document, so a crash
/// mid-write leaves either the old or the new document, never a mix. An
/// exclusive lock on `<file>.lock` is held for the lifetime of the store.
pub struct JsonStateStore {
    /// Held across the disk write so mutations are applied one at a time.
    doc: Mutex<StateDocument>,
    path: PathBuf,
    data_dir: PathBuf,
    _lock_file: std::fs::File,
}

impl std::fmt::Debug for JsonStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStateStore")
            .field("path", &self.path)
            .field("data_dir", &self.data_dir)
            .finish_non_exhaustive()
    }
}

impl JsonStateStore {
    /// Open the document at `path`, creating it with the sentinel marker and
    /// no series if it does not exist yet.
    ///
    /// Fails if another instance holds the lock or if an existing document
    /// cannot be read or parsed.
    pub async fn open(path: &Path, data_dir: &Path) -> Result<Self, StateError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StateError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        let lock_path = sibling_path(path, ".lock");
        let lock_file = tokio::task::spawn_blocking({
            let lock_path = lock_path.clone();
            move || {
                let file =
                    std::fs::File::create(&lock_path).map_err(|source| StateError::LockFile {
                        path: lock_path.clone(),
                        source,
                    })?;
                FileExt::try_lock_exclusive(&file)
                    .map_err(|_| StateError::Locked { path: lock_path })?;
                Ok::<std::fs::File, StateError>(file)
            }
        })
        .await??;

        let doc = match fs::read_to_string(path).await {
            Ok(contents) => {
                let doc: StateDocument =
                    serde_json::from_str(&contents).map_err(|source| StateError::Parse {
                        path: path.to_path_buf(),
                        source,
                    })?;
                tracing::debug!(
                    path = %path.display(),
                    series = doc.series.len(),
                    "Loaded state document"
                );
                doc
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let doc = StateDocument::default();
                write_document(path, &doc).await?;
                tracing::info!(path = %path.display(), "Created new state document");
                doc
            }
            Err(source) => {
                return Err(StateError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Ok(Self {
            doc: Mutex::new(doc),
            path: path.to_path_buf(),
            data_dir: data_dir.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Path of the JSON document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the document, persist the copy, and only
    /// then make it the current document.
    async fn mutate<F>(&self, change: F) -> Result<(), StateError>
    where
        F: FnOnce(&mut StateDocument) + Send,
    {
        let mut current = self.doc.lock().await;
        let mut next = current.clone();
        change(&mut next);
        write_document(&self.path, &next).await?;
        *current = next;
        Ok(())
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn last_processed(&self) -> NaiveDate {
        self.doc.lock().await.last_processed
    }

    async fn set_last_processed(&self, date: NaiveDate) -> Result<(), StateError> {
        let today = Local::now().date_naive();
        if date > today {
            return Err(StateError::FutureDate { date, today });
        }
        self.mutate(|doc| doc.last_processed = date).await?;
        tracing::debug!(%date, "Recorded last processed day");
        Ok(())
    }

    async fn series_record(&self, id: &str) -> Result<SeriesRecord, StateError> {
        if let Some(record) = self.doc.lock().await.series.get(id) {
            return Ok(record.clone());
        }
        // Not seen before. `record_mut` inserts the defaults.
        self.mutate(|doc| {
            doc.record_mut(id);
        })
        .await?;
        tracing::info!(series = %id, "Added new series to state");
        let doc = self.doc.lock().await;
        Ok(doc.series.get(id).cloned().unwrap_or_default())
    }

    async fn update_series_metadata(
        &self,
        id: &str,
        release_date: &str,
        next_release_date: &str,
    ) -> Result<(), StateError> {
        self.mutate(|doc| {
            let record = doc.record_mut(id);
            record.last_release_date = release_date.to_string();
            record.next_release_date = next_release_date.to_string();
        })
        .await
    }

    async fn record_download_success(&self, id: &str, date: NaiveDate) -> Result<(), StateError> {
        self.mutate(|doc| {
            let record = doc.record_mut(id);
            record.last_downloaded_date = date;
            record.last_download_error = None;
        })
        .await
    }

    async fn record_download_failure(&self, id: &str, message: &str) -> Result<(), StateError> {
        self.mutate(|doc| {
            doc.record_mut(id).last_download_error = Some(message.to_string());
        })
        .await
    }

    async fn ensure_series_directories(
        &self,
        id: &str,
        format: Format,
    ) -> Result<PathBuf, FilesystemError> {
        let dir = self.data_dir.join(id).join(format.as_str());
        // create_dir_all treats an existing directory as success
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| FilesystemError {
                path: dir.clone(),
                source,
            })?;
        Ok(dir)
    }

    async fn snapshot(&self) -> StateDocument {
        self.doc.lock().await.clone()
    }
}

/// `path` with `suffix` appended to its file name (`state.json` -> `state.json.tmp`).
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("state"));
    name.push(suffix);
    path.with_file_name(name)
}

/// Serialize `doc` to a temp file next to `path`, sync it, then rename it
/// over `path`.
async fn write_document(path: &Path, doc: &StateDocument) -> Result<(), StateError> {
    let json = serde_json::to_vec_pretty(doc)?;
    let tmp_path = sibling_path(path, ".tmp");

    let result = async {
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp_path, path).await
    }
    .await;

    if let Err(source) = result {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(StateError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}
