use std::fmt;

use async_trait::async_trait;

use crate::Result;

/// A generative model that turns a prompt into raw text.
#[async_trait]
pub trait TextGenerator: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Fails only on transport or provider errors; the text itself is not validated.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
