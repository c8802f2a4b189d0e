use std::fmt;

use async_trait::async_trait;
use nf_core::{Error, Result, TextGenerator};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Config;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().map(|p| p.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

/// Google Gemini through the Generative Language REST API.
pub struct GeminiModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl GeminiModel {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Inference("Gemini API key is required".to_string()))?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
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

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model_name)
    }
}

impl fmt::Debug for GeminiModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiModel")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("model_name", &self.model_name)
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl TextGenerator for GeminiModel {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        debug!(model = %self.model_name, prompt_len = prompt.len(), "Calling Gemini");
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Gemini returned {}: {}",
                status, body
            )));
        }

        response
            .json::<GenerateResponse>()
            .await?
            .into_text()
            .ok_or_else(|| Error::Inference("Gemini returned no candidates".to_string()))
    }
}
