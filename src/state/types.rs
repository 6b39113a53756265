//! Types for the persisted state document.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Day format used for every date we generate ourselves: the global marker,
/// the last-downloaded date and artifact file names. Month names come from
/// chrono's fixed English table, so output never depends on the host locale.
pub const DATE_FORMAT: &str = "%d %B %Y";

/// Sentinel written for anything never observed yet.
pub const EPOCH_LABEL: &str = "01 January 1900";

/// The sentinel date as a calendar date.
pub fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or_default()
}

/// Render a date in [`DATE_FORMAT`], e.g. `05 March 2026`.
pub fn format_day(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a date rendered by [`format_day`].
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// `serde(with)` adapter storing a `NaiveDate` as a [`DATE_FORMAT`] string.
pub(crate) mod day_format {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_day(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_day(&raw).ok_or_else(|| {
            de::Error::custom(format!(
                "invalid date '{}', expected e.g. '{}'",
                raw,
                super::EPOCH_LABEL
            ))
        })
    }
}

/// What we last saw and fetched for one series.
///
/// Release dates are kept exactly as the remote page prints them; change
/// detection is plain string equality against the next fetched value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRecord {
    /// Release date last observed on the series page.
    #[serde(rename = "Last Updated")]
    pub last_release_date: String,

    /// Day a download for this series last succeeded.
    #[serde(rename = "Last Downloaded", with = "day_format")]
    pub last_downloaded_date: NaiveDate,

    /// Next release date as advertised alongside `last_release_date`.
    #[serde(rename = "Next Release")]
    pub next_release_date: String,

    /// Set when the most recent download attempt failed; cleared on success.
    #[serde(
        rename = "Last Download Error",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_download_error: Option<String>,
}

impl Default for SeriesRecord {
    fn default() -> Self {
        Self {
            last_release_date: EPOCH_LABEL.to_string(),
            last_downloaded_date: epoch(),
            next_release_date: EPOCH_LABEL.to_string(),
            last_download_error: None,
        }
    }
}

/// The whole persisted document: global marker plus one record per series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDocument {
    /// Day the whole batch last ran to completion.
    #[serde(rename = "Last Processed", with = "day_format")]
    pub last_processed: NaiveDate,

    #[serde(default)]
    pub series: BTreeMap<String, SeriesRecord>,
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            last_processed: epoch(),
            series: BTreeMap::new(),
        }
    }
}

impl StateDocument {
    /// Get the record for `id`, inserting the sentinel defaults if unseen.
    pub fn record_mut(&mut self, id: &str) -> &mut SeriesRecord {
        self.series.entry(id.to_string()).or_default()
    }
}
