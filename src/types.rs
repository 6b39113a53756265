use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive handed to `EnvFilter` when `RUST_LOG` is unset.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Downloadable encodings of a series that we keep locally.
///
/// The upper-case name doubles as the directory name and the file extension
/// under the series data tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Format {
    Csv,
    Xls,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Csv => "CSV",
            Format::Xls => "XLS",
        }
    }

    /// Map a JSON-LD `encodingFormat` value to a format we keep.
    /// Anything else (JSON, XLSX, ...) is ignored.
    pub fn from_encoding(encoding: &str) -> Option<Self> {
        let encoding = encoding.trim();
        if encoding.eq_ignore_ascii_case("csv") {
            Some(Format::Csv)
        } else if encoding.eq_ignore_ascii_case("xls") {
            Some(Format::Xls)
        } else {
            None
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
