use std::time::Duration;

use reqwest::Client;

const USER_AGENT: &str = concat!("mei-rs/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client used both to fetch series pages and to download
/// their data files. Every request is bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }
}
