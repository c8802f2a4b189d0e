use std::time::Duration;

use async_trait::async_trait;
use nf_core::{Error, Result, TextExtractor};
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

pub mod readable;

pub use readable::extract_readable_text;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("newsflash/", env!("CARGO_PKG_VERSION"));

/// Fetches pages over HTTP and reduces them to readable text.
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    client: Client,
}

impl HtmlExtractor {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    pub(crate) fn parse_url(url: &str) -> Result<Url> {
        let parsed = Url::parse(url).map_err(|e| Error::bad_request(format!("Invalid URL {}: {}", url, e)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            scheme => Err(Error::bad_request(format!(
                "Unsupported URL scheme {} in {}",
                scheme, url
            ))),
        }
    }
}

#[async_trait]
impl TextExtractor for HtmlExtractor {
    async fn extract(&self, url: &str) -> Result<String> {
        let parsed = Self::parse_url(url)?;
        debug!(url = %parsed, "Fetching page");

        let response = self.client.get(parsed).send().await?.error_for_status()?;
        let html = response.text().await?;
        let text = extract_readable_text(&html)?;
        if text.is_empty() {
            warn!(url = %url, "No readable text found");
        }
        Ok(text)
    }
}

pub mod prelude {
    pub use super::{extract_readable_text, HtmlExtractor};
    pub use nf_core::{Error, Result, TextExtractor};
}
