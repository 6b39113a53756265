use std::path::PathBuf;

use crate::cli::{Cli, RunArgs};

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Series checked when none are given on the command line.
pub const DEFAULT_SERIES: &[(&str, &str)] = &[
    (
        "G777",
        "https://www.ons.gov.uk/economy/inflationandpriceindices/timeseries/g777/ppi",
    ),
    (
        "HQTI",
        "https://www.ons.gov.uk/economy/inflationandpriceindices/timeseries/hqti/sppi",
    ),
];

/// Identifier used by template entries that should never be fetched.
const PLACEHOLDER_SERIES_ID: &str = "Example";

/// One configured series: its identifier and the page advertising it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesEntry {
    pub id: String,
    pub url: String,
}

impl SeriesEntry {
    pub fn new(id: &str, url: &str) -> Self {
        Self {
            id: id.to_string(),
            url: url.to_string(),
        }
    }

    /// Empty and template identifiers are skipped by the driver.
    pub fn is_placeholder(&self) -> bool {
        self.id.is_empty() || self.id == PLACEHOLDER_SERIES_ID
    }
}

/// Settings for an update run.
#[derive(Debug)]
pub struct Config {
    pub state_file: PathBuf,
    pub data_dir: PathBuf,
    pub series: Vec<SeriesEntry>,
    pub timeout_secs: u64,
    pub force: bool,
}

impl Config {
    pub fn from_cli(cli: &Cli, args: RunArgs) -> anyhow::Result<Self> {
        if args.timeout_secs == 0 {
            anyhow::bail!("--timeout-secs must be greater than zero");
        }

        let series = if args.series.is_empty() {
            DEFAULT_SERIES
                .iter()
                .map(|(id, url)| SeriesEntry::new(id, url))
                .collect()
        } else {
            args.series
        };

        Ok(Self {
            state_file: expand_tilde(&cli.state_file),
            data_dir: expand_tilde(&cli.data_dir),
            series,
            timeout_secs: args.timeout_secs,
            force: args.force,
        })
    }
}

/// Expand ~ to the user's home directory.
pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Parse a `--series ID=URL` argument.
///
/// The identifier becomes a directory name, so path separators and `..`
/// are refused. An empty identifier is accepted and later skipped.
pub(crate) fn parse_series_arg(s: &str) -> Result<SeriesEntry, String> {
    let (id, url) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ID=URL, got '{}'", s))?;
    let id = id.trim();
    let url = url.trim();

    if id.contains(['/', '\\']) || id == "." || id == ".." {
        return Err(format!("series id '{}' cannot be used as a directory name", id));
    }
    if url.is_empty() {
        return Err(format!("series '{}' has no URL", id));
    }
    Ok(SeriesEntry::new(id, url))
}
