//! Reconciliation of one series against its published page.
//!
//! Release metadata and download outcome are tracked separately: a changed
//! release date is recorded as soon as the page is read, whether or not any
//! file then downloads. Every advertised format is downloaded on every run;
//! the caller decides once per day whether a run happens at all.

use chrono::NaiveDate;
use thiserror::Error;

use crate::download::{file, paths, ArtifactSource, DownloadError};
use crate::fetch::{FetchError, MetadataSource, SeriesFormat};
use crate::state::types::format_day;
use crate::state::{FilesystemError, StateError, StateStore};
use crate::types::Format;

/// Errors that stop processing of a series.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    #[error(transparent)]
    State(#[from] StateError),
}

impl UpdateError {
    /// Whether the run as a whole must stop. Only state failures qualify;
    /// everything else is local to the series.
    pub fn is_fatal(&self) -> bool {
        matches!(self, UpdateError::State(_))
    }
}

/// What happened to one series during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesOutcome {
    /// The page advertised a release date different from the stored one.
    pub release_changed: bool,
    /// Formats whose file was downloaded and verified.
    pub downloaded: Vec<Format>,
    /// Formats whose download failed; the last failure is in the record.
    pub failed: Vec<Format>,
}

pub struct SeriesUpdater<'a> {
    store: &'a dyn StateStore,
    pages: &'a dyn MetadataSource,
    files: &'a dyn ArtifactSource,
    today: NaiveDate,
}

impl<'a> SeriesUpdater<'a> {
    pub fn new(
        store: &'a dyn StateStore,
        pages: &'a dyn MetadataSource,
        files: &'a dyn ArtifactSource,
        today: NaiveDate,
    ) -> Self {
        Self {
            store,
            pages,
            files,
            today,
        }
    }

    /// Reconcile `series_id` against the page at `series_url`.
    ///
    /// A page that cannot be fetched or lacks its dates fails the series
    /// without touching its record. Per-format download failures are written
    /// to the record and do not fail the call.
    pub async fn process(
        &self,
        series_id: &str,
        series_url: &str,
    ) -> Result<SeriesOutcome, UpdateError> {
        let record = self.store.series_record(series_id).await?;
        let meta = self.pages.fetch_series_metadata(series_url).await?;

        let mut outcome = SeriesOutcome::default();
        if meta.release_date != record.last_release_date {
            tracing::info!(
                series = %series_id,
                previous = %record.last_release_date,
                release = %meta.release_date,
                next = %meta.next_release_date,
                "New release detected"
            );
            self.store
                .update_series_metadata(series_id, &meta.release_date, &meta.next_release_date)
                .await?;
            outcome.release_changed = true;
        } else {
            tracing::debug!(series = %series_id, release = %meta.release_date, "Release unchanged");
        }

        if meta.formats.is_empty() {
            tracing::info!(series = %series_id, "Page lists no CSV or XLS downloads");
        }

        for artifact in &meta.formats {
            let dir = self
                .store
                .ensure_series_directories(series_id, artifact.format)
                .await?;
            let path = paths::artifact_path(&dir, self.today, artifact.format);

            match self.download(artifact, &path).await {
                Ok(size) => {
                    tracing::info!(
                        series = %series_id,
                        format = %artifact.format,
                        path = %path.display(),
                        size,
                        "Downloaded"
                    );
                    self.store
                        .record_download_success(series_id, self.today)
                        .await?;
                    outcome.downloaded.push(artifact.format);
                }
                Err(e) => {
                    let message = format!(
                        "Failed to download {} for format {} on {}: {}",
                        series_id,
                        artifact.format,
                        format_day(self.today),
                        e
                    );
                    tracing::warn!(
                        series = %series_id,
                        format = %artifact.format,
                        error = %e,
                        "Download failed"
                    );
                    // The record has a single error slot, so with several
                    // formats the last attempted one decides its final value.
                    self.store
                        .record_download_failure(series_id, &message)
                        .await?;
                    outcome.failed.push(artifact.format);
                }
            }
        }

        Ok(outcome)
    }

    async fn download(
        &self,
        artifact: &SeriesFormat,
        path: &std::path::Path,
    ) -> Result<u64, DownloadError> {
        let bytes = self.files.download_bytes(&artifact.content_url).await?;
        file::write_artifact(path, &bytes).await
    }
}
