use async_trait::async_trait;

use crate::Result;

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Best-effort readable text of the page at `url`.
    ///
    /// Returns an empty string when the page has nothing worth reading; errors are
    /// reserved for network failures.
    async fn extract(&self, url: &str) -> Result<String>;
}
