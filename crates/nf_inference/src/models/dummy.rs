use std::fmt;

use async_trait::async_trait;
use nf_core::{Result, TextGenerator};
use serde_json::json;

use crate::prompt::article_from_prompt;

/// Answers without any network call, echoing the article back in the expected shape.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let article = article_from_prompt(prompt).unwrap_or(prompt);

        // First sentences, 15 words at most each
        let bullets: Vec<String> = article
            .split(|c| c == '.' || c == '!' || c == '?' || c == '\n')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .take(5)
            .map(|s| s.split_whitespace().take(15).collect::<Vec<_>>().join(" "))
            .collect();

        let mut keywords: Vec<String> = Vec::new();
        for word in article.split(|c: char| !c.is_alphanumeric()) {
            let word = word.to_lowercase();
            if word.chars().count() > 5 && !keywords.contains(&word) {
                keywords.push(word);
            }
            if keywords.len() == 5 {
                break;
            }
        }

        Ok(json!({
            "bullets": bullets,
            "sentiment": "neutral",
            "keywords": keywords,
            "impact": "Low - Generated offline without a language model",
        })
        .to_string())
    }
}
