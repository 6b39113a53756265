use thiserror::Error;

/// Why a series page could not produce usable release metadata.
///
/// Any of these aborts processing of that one series before state is
/// touched.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid series URL {url}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("HTTP error {status} fetching {url}")]
    HttpStatus { status: u16, url: String },

    #[error("HTTP error fetching {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Series page has no {0}")]
    MissingField(&'static str),

    #[error("Series page has malformed JSON-LD: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_message() {
        let e = FetchError::MissingField("release date");
        assert_eq!(e.to_string(), "Series page has no release date");
    }

    #[test]
    fn test_status_message_names_url() {
        let e = FetchError::HttpStatus {
            status: 503,
            url: "https://example.com/series".into(),
        };
        assert_eq!(
            e.to_string(),
            "HTTP error 503 fetching https://example.com/series"
        );
    }
}
