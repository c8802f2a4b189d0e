use std::fmt;
use std::sync::Arc;

use nf_core::{
    ArticleStore, AuthUser, Error, Result, SummarizeRequest, SummarizeResponse, TextExtractor,
    TextGenerator,
};
use tracing::{info, warn};

use crate::normalize::normalize;
use crate::prompt::build_prompt;

pub mod persist;
pub mod resolve;

pub use persist::PersistAction;
pub use resolve::{resolve_source, ResolvedSource};

/// Resolve, prompt, normalize, persist.
#[derive(Clone)]
pub struct Summarizer {
    articles: Arc<dyn ArticleStore>,
    extractor: Arc<dyn TextExtractor>,
    model: Arc<dyn TextGenerator>,
}

impl fmt::Debug for Summarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Summarizer")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl Summarizer {
    pub fn new(
        articles: Arc<dyn ArticleStore>,
        extractor: Arc<dyn TextExtractor>,
        model: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            articles,
            extractor,
            model,
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Sends the prompt for `text` and returns whatever the model said.
    pub async fn generate(&self, text: &str) -> Result<String> {
        let prompt = build_prompt(text);
        self.model.generate(&prompt).await.map_err(|e| {
            warn!(model = self.model.name(), error = %e, "Model call failed");
            e
        })
    }

    pub async fn summarize(
        &self,
        request: &SummarizeRequest,
        user: Option<&AuthUser>,
    ) -> Result<SummarizeResponse> {
        let source =
            resolve_source(self.articles.as_ref(), self.extractor.as_ref(), request).await?;

        let raw = self.generate(&source.text).await?;
        let result = normalize(&raw).map_err(|e| {
            warn!(model = self.model.name(), error = %e, "Unusable model output");
            Error::from(e)
        })?;

        let action = PersistAction::plan(request, user.map(|u| u.id));
        let saved = persist::persist(
            self.articles.as_ref(),
            action,
            &source,
            &result,
            request.image_url(),
        )
        .await?;

        let image_url = request
            .image_url()
            .map(str::to_string)
            .or_else(|| saved.as_ref().and_then(|a| a.image_url.clone()))
            .or_else(|| source.target.as_ref().and_then(|a| a.image_url.clone()));
        let saved_article_id = saved.map(|a| a.id);
        info!(
            model = self.model.name(),
            sentiment = %result.sentiment,
            saved_article_id,
            "Summarized"
        );

        Ok(SummarizeResponse {
            bullets: result.bullets,
            sentiment: result.sentiment,
            keywords: result.keywords,
            impact: result.impact,
            image_url,
            saved_article_id,
        })
    }
}
