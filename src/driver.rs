//! Once-a-day batch over all configured series.

use chrono::NaiveDate;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, SeriesEntry};
use crate::download::ArtifactSource;
use crate::fetch::MetadataSource;
use crate::state::{JsonStateStore, StateStore};
use crate::updater::{SeriesUpdater, UpdateError};

/// How a batch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// Today's batch had already completed and no force was requested.
    AlreadyProcessed { last_processed: NaiveDate },
    /// Every series was attempted and the global marker now reads today.
    Completed {
        processed: usize,
        /// Series whose page or directories failed.
        failed: Vec<String>,
    },
    /// Shutdown was requested before all series ran. The marker is unchanged.
    Interrupted { processed: usize },
}

/// Open the configured state document and run the batch against it.
///
/// A document that cannot be read or parsed stops everything before the
/// first series is fetched.
pub async fn run_configured(
    config: &Config,
    pages: &dyn MetadataSource,
    files: &dyn ArtifactSource,
    today: NaiveDate,
    shutdown_token: &CancellationToken,
) -> Result<RunReport, UpdateError> {
    let store = JsonStateStore::open(&config.state_file, &config.data_dir).await?;
    tracing::debug!(
        path = %config.state_file.display(),
        last_processed = %store.last_processed().await,
        "State document opened"
    );

    run_daily(
        &store,
        pages,
        files,
        &config.series,
        today,
        config.force,
        shutdown_token,
    )
    .await
}

/// Run the batch for `today`.
///
/// Series are processed strictly one after another. A failure local to one
/// series is logged and the batch moves on; a fatal (state) failure ends it
/// immediately with the marker unchanged.
pub async fn run_daily(
    store: &dyn StateStore,
    pages: &dyn MetadataSource,
    files: &dyn ArtifactSource,
    series: &[SeriesEntry],
    today: NaiveDate,
    force: bool,
    shutdown_token: &CancellationToken,
) -> Result<RunReport, UpdateError> {
    let last_processed = store.last_processed().await;
    if last_processed == today && !force {
        tracing::info!(%last_processed, "Series already processed today, nothing to do");
        return Ok(RunReport::AlreadyProcessed { last_processed });
    }

    let updater = SeriesUpdater::new(store, pages, files, today);
    let mut processed = 0;
    let mut failed = Vec::new();

    for entry in series {
        if shutdown_token.is_cancelled() {
            tracing::warn!(processed, "Shutdown requested, stopping before {}", entry.id);
            return Ok(RunReport::Interrupted { processed });
        }
        if entry.is_placeholder() {
            tracing::debug!(series = %entry.id, "Skipping placeholder series");
            continue;
        }

        tracing::info!(series = %entry.id, url = %entry.url, "Checking series");
        match updater.process(&entry.id, &entry.url).await {
            Ok(outcome) => {
                tracing::info!(
                    series = %entry.id,
                    release_changed = outcome.release_changed,
                    downloaded = outcome.downloaded.len(),
                    failed = outcome.failed.len(),
                    "Series done"
                );
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::error!(series = %entry.id, error = %e, "Series update failed");
                failed.push(entry.id.clone());
            }
        }
        processed += 1;
    }

    store.set_last_processed(today).await?;
    Ok(RunReport::Completed { processed, failed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::types::epoch;
    use crate::state::StateError;
    use crate::testutil::{metadata, test_dir, FakeFiles, FakePages};
    use crate::types::Format;
    use std::path::Path;

    const G777: &str = "https://example.com/g777";
    const HQTI: &str = "https://example.com/hqti";

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 16).unwrap()
    }

    fn series() -> Vec<SeriesEntry> {
        vec![SeriesEntry::new("G777", G777), SeriesEntry::new("HQTI", HQTI)]
    }

    async fn open_store(dir: &Path) -> JsonStateStore {
        JsonStateStore::open(&dir.join("state.json"), &dir.join("Series Data"))
            .await
            .unwrap()
    }

    async fn run(
        store: &JsonStateStore,
        pages: &FakePages,
        files: &FakeFiles,
        series: &[SeriesEntry],
        force: bool,
    ) -> Result<RunReport, UpdateError> {
        let token = CancellationToken::new();
        run_daily(store, pages, files, series, today(), force, &token).await
    }

    fn pages() -> FakePages {
        FakePages::default()
            .with(
                G777,
                metadata(
                    "15 October 2024",
                    "13 November 2024",
                    &[(Format::Csv, "https://example.com/g777.csv")],
                ),
            )
            .with(
                HQTI,
                metadata(
                    "14 August 2024",
                    "13 November 2024",
                    &[(Format::Xls, "https://example.com/hqti.xls")],
                ),
            )
    }

    fn files() -> FakeFiles {
        FakeFiles::default()
            .with("https://example.com/g777.csv", b"g777")
            .with("https://example.com/hqti.xls", b"hqti")
    }

    #[tokio::test]
    async fn test_runs_all_series_and_advances_marker() {
        let dir = test_dir("driver_all_series");
        let store = open_store(&dir).await;
        let pages = pages();
        let files = files();

        let report = run(&store, &pages, &files, &series(), false)
            .await
            .unwrap();

        assert_eq!(
            report,
            RunReport::Completed {
                processed: 2,
                failed: vec![]
            }
        );
        assert_eq!(store.last_processed().await, today());
        let doc = store.snapshot().await;
        assert_eq!(doc.series["G777"].last_downloaded_date, today());
        assert_eq!(doc.series["HQTI"].last_release_date, "14 August 2024");
    }

    #[tokio::test]
    async fn test_already_processed_today_does_nothing() {
        let dir = test_dir("driver_gated");
        let store = open_store(&dir).await;
        store.set_last_processed(today()).await.unwrap();
        let before = store.snapshot().await;
        let pages = pages();
        let files = files();

        let report = run(&store, &pages, &files, &series(), false)
            .await
            .unwrap();

        assert_eq!(
            report,
            RunReport::AlreadyProcessed {
                last_processed: today()
            }
        );
        assert_eq!(pages.calls(), 0);
        assert!(files.requested().is_empty());
        assert_eq!(store.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_force_runs_again_on_same_day() {
        let dir = test_dir("driver_force");
        let store = open_store(&dir).await;
        store.set_last_processed(today()).await.unwrap();
        let pages = pages();
        let files = files();

        let report = run(&store, &pages, &files, &series(), true)
            .await
            .unwrap();

        assert!(matches!(report, RunReport::Completed { processed: 2, .. }));
        assert_eq!(pages.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_series_does_not_stop_the_rest() {
        let dir = test_dir("driver_partial");
        let store = open_store(&dir).await;
        let pages = FakePages::default().with(
            HQTI,
            metadata(
                "14 August 2024",
                "13 November 2024",
                &[(Format::Xls, "https://example.com/hqti.xls")],
            ),
        );
        let files = files();

        let report = run(&store, &pages, &files, &series(), false)
            .await
            .unwrap();

        assert_eq!(
            report,
            RunReport::Completed {
                processed: 2,
                failed: vec!["G777".to_string()]
            }
        );
        assert_eq!(store.last_processed().await, today());
        let doc = store.snapshot().await;
        assert_eq!(doc.series["HQTI"].last_downloaded_date, today());
        assert_eq!(doc.series["G777"].last_downloaded_date, epoch());
    }

    #[tokio::test]
    async fn test_placeholder_series_are_skipped() {
        let dir = test_dir("driver_placeholders");
        let store = open_store(&dir).await;
        let pages = pages();
        let files = files();
        let series = vec![
            SeriesEntry::new("Example", "https://example.com/example"),
            SeriesEntry::new("", "https://example.com/empty"),
            SeriesEntry::new("G777", G777),
        ];

        let report = run(&store, &pages, &files, &series, false)
            .await
            .unwrap();

        assert!(matches!(report, RunReport::Completed { processed: 1, .. }));
        assert_eq!(pages.calls(), 1);
        let doc = store.snapshot().await;
        assert!(!doc.series.contains_key("Example"));
        assert!(!doc.series.contains_key(""));
    }

    #[tokio::test]
    async fn test_cancelled_run_keeps_marker() {
        let dir = test_dir("driver_cancelled");
        let store = open_store(&dir).await;
        let pages = pages();
        let files = files();
        let token = CancellationToken::new();
        token.cancel();

        let report = run_daily(&store, &pages, &files, &series(), today(), false, &token)
            .await
            .unwrap();

        assert_eq!(report, RunReport::Interrupted { processed: 0 });
        assert_eq!(pages.calls(), 0);
        assert_eq!(store.last_processed().await, epoch());
    }

    #[tokio::test]
    async fn test_storage_failure_halts_run() {
        let dir = test_dir("driver_storage_failure");
        let store = open_store(&dir).await;
        std::fs::create_dir(dir.join("state.json.tmp")).unwrap();
        let pages = pages();
        let files = files();

        let err = run(&store, &pages, &files, &series(), false)
            .await
            .unwrap_err();

        assert!(matches!(err, UpdateError::State(StateError::Write { .. })));
        // The first write was the first-seen record for G777; nothing after it ran.
        assert_eq!(pages.calls(), 0);
        assert_eq!(store.last_processed().await, epoch());
    }

    fn config(dir: &Path) -> Config {
        Config {
            state_file: dir.join("state.json"),
            data_dir: dir.join("Series Data"),
            series: series(),
            timeout_secs: 60,
            force: false,
        }
    }

    #[tokio::test]
    async fn test_configured_run_opens_document_and_runs() {
        let dir = test_dir("driver_configured");
        let pages = pages();
        let files = files();

        let token = CancellationToken::new();
        let report = run_configured(&config(&dir), &pages, &files, today(), &token)
            .await
            .unwrap();

        assert!(matches!(report, RunReport::Completed { processed: 2, .. }));
        let raw = std::fs::read_to_string(dir.join("state.json")).unwrap();
        assert!(raw.contains("16 October 2024"));
    }

    #[tokio::test]
    async fn test_malformed_document_stops_before_any_series() {
        let dir = test_dir("driver_malformed_document");
        std::fs::write(dir.join("state.json"), "{ not json").unwrap();
        let pages = pages();
        let files = files();

        let token = CancellationToken::new();
        let err = run_configured(&config(&dir), &pages, &files, today(), &token)
            .await
            .unwrap_err();

        assert!(matches!(err, UpdateError::State(StateError::Parse { .. })));
        assert!(err.is_fatal());
        assert_eq!(pages.calls(), 0);
        assert!(files.requested().is_empty());
        // The broken document is left for the user to inspect.
        let raw = std::fs::read_to_string(dir.join("state.json")).unwrap();
        assert_eq!(raw, "{ not json");
    }

    #[tokio::test]
    async fn test_unreadable_document_stops_before_any_series() {
        let dir = test_dir("driver_unreadable_document");
        // A directory where the document should be cannot be read as text.
        std::fs::create_dir(dir.join("state.json")).unwrap();
        let pages = pages();
        let files = files();

        let token = CancellationToken::new();
        let err = run_configured(&config(&dir), &pages, &files, today(), &token)
            .await
            .unwrap_err();

        assert!(matches!(err, UpdateError::State(StateError::Read { .. })));
        assert_eq!(pages.calls(), 0);
        assert!(files.requested().is_empty());
    }
}
