use clap::{Args, Parser, Subcommand};

use crate::config::{parse_series_arg, SeriesEntry, DEFAULT_TIMEOUT_SECS};
use crate::types::LogLevel;

#[derive(Parser, Debug)]
#[command(
    name = "mei-rs",
    version,
    about = "Check published statistical series for new releases and download their data files"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// JSON state document
    #[arg(long, global = true, env = "MEI_STATE_FILE", default_value = "mei_settings.json")]
    pub state_file: String,

    /// Root directory for downloaded series files
    #[arg(long, global = true, env = "MEI_DATA_DIR", default_value = "Series Data")]
    pub data_dir: String,

    /// Log level (RUST_LOG takes precedence when set)
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Check every configured series and download new data (default)
    Run(RunArgs),
    /// Show what the state document records
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Run even if today's batch already completed
    #[arg(long)]
    pub force: bool,

    /// Series to check, as ID=URL. Repeat for several; defaults to the
    /// built-in list when omitted
    #[arg(long = "series", value_name = "ID=URL", value_parser = parse_series_arg)]
    pub series: Vec<SeriesEntry>,

    /// Timeout in seconds for each HTTP request
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
}

impl Default for RunArgs {
    fn default() -> Self {
        Self {
            force: false,
            series: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct StatusArgs {
    /// Only list series whose last download failed
    #[arg(long)]
    pub failed: bool,
}

impl Cli {
    /// The subcommand to run; a bare invocation means `run`.
    pub fn effective_command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Run(RunArgs::default()))
    }
}
