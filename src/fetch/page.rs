//! Extraction of release metadata from a published series page.
//!
//! The page carries two things we need:
//! - `p.meta__item` paragraphs, each labelled by a leading `<span>`, holding
//!   the release date and the next release date;
//! - a `<script type="application/ld+json">` block whose `distribution`
//!   array lists the downloadable files with their encoding and URL.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Deserialize;
use url::Url;

use super::error::FetchError;
use super::{SeriesFormat, SeriesMetadata};
use crate::types::Format;

const RELEASE_DATE_LABEL: &str = "Release date";
const NEXT_RELEASE_LABEL: &str = "Next release";
/// Link text that shares the paragraph with the release date.
const PREVIOUS_VERSIONS_LINK: &str = "View previous versions";

static META_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.meta__item").expect("static selector"));
static LABEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span").expect("static selector"));
static LINKED_DATA: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"script[type="application/ld+json"]"#).expect("static selector")
});

#[derive(Debug, Deserialize)]
struct LinkedData {
    #[serde(default)]
    distribution: Vec<Distribution>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Distribution {
    encoding_format: Option<String>,
    content_url: Option<String>,
}

/// Parse a series page fetched from `page_url`.
///
/// Both dates are required. A page without a JSON-LD block is rejected; a
/// JSON-LD block without `distribution` simply yields no formats.
pub fn parse_series_page(html: &str, page_url: &Url) -> Result<SeriesMetadata, FetchError> {
    let document = Html::parse_document(html);

    let release_date = meta_item(&document, RELEASE_DATE_LABEL)
        .ok_or(FetchError::MissingField("release date"))?;
    let next_release_date = meta_item(&document, NEXT_RELEASE_LABEL)
        .ok_or(FetchError::MissingField("next release date"))?;
    let formats = distribution(&document, page_url)?;

    Ok(SeriesMetadata {
        release_date,
        next_release_date,
        formats,
    })
}

/// Text of the meta paragraph labelled `label`, without the label itself.
fn meta_item(document: &Html, label: &str) -> Option<String> {
    document.select(&META_ITEM).find_map(|item| {
        let span = item.select(&LABEL).next()?;
        let span_text: String = span.text().collect();
        let found = span_text.trim().trim_end_matches(':').trim();
        if !found.eq_ignore_ascii_case(label) {
            return None;
        }

        let full: String = item.text().collect();
        let value = full
            .replacen(&span_text, "", 1)
            .replace(PREVIOUS_VERSIONS_LINK, "");
        let value = collapse_whitespace(&value);
        (!value.is_empty()).then_some(value)
    })
}

fn distribution(document: &Html, page_url: &Url) -> Result<Vec<SeriesFormat>, FetchError> {
    let script = document
        .select(&LINKED_DATA)
        .next()
        .ok_or(FetchError::MissingField("JSON-LD metadata"))?;
    let raw: String = script.text().collect();
    let linked: LinkedData = serde_json::from_str(&raw)?;

    let formats = linked
        .distribution
        .into_iter()
        .filter_map(|entry| {
            let encoding = entry.encoding_format?;
            let format = Format::from_encoding(&encoding)?;
            let content_url = entry.content_url?;
            match page_url.join(content_url.trim()) {
                Ok(url) => Some(SeriesFormat {
                    format,
                    content_url: url.to_string(),
                }),
                Err(e) => {
                    tracing::warn!(
                        %format,
                        url = %content_url,
                        error = %e,
                        "Skipping unusable content URL"
                    );
                    None
                }
            }
        })
        .collect();
    Ok(formats)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
