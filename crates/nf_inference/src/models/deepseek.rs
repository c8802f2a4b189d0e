use std::fmt;

use async_trait::async_trait;
use nf_core::{Error, Result, TextGenerator};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::Config;

pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

/// Any OpenAI-compatible `/chat/completions` endpoint; DeepSeek by default.
pub struct DeepSeekModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl DeepSeekModel {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Inference("DeepSeek API key is required".to_string()))?;
        Ok(Self {
            client: Client::builder().timeout(config.timeout).build()?,
            api_key,
            model_name: config
                .model_name
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: config
                .model_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

impl fmt::Debug for DeepSeekModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeepSeekModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl TextGenerator for DeepSeekModel {
    fn name(&self) -> &str {
        "DeepSeek"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model_name,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "DeepSeek returned {}: {}",
                status, body
            )));
        }

        let response = response.json::<ChatResponse>().await?;
        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::Inference("DeepSeek returned no choices".to_string()))
    }
}
