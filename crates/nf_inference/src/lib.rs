use std::fmt;
use std::time::Duration;

pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use models::{create_model, ModelKind};
pub use normalize::{normalize, NormalizeError};
pub use pipeline::Summarizer;

pub const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    /// Overrides the provider base URL.
    pub model_url: Option<String>,
    pub timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("model_url", &self.model_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model_name: None,
            model_url: None,
            timeout: DEFAULT_MODEL_TIMEOUT,
        }
    }
}

pub mod prelude {
    pub use super::models::create_model;
    pub use super::pipeline::Summarizer;
    pub use super::{Config, ModelKind};
    pub use nf_core::{Error, ModelResult, Result, SummarizeRequest, SummarizeResponse};
}
