use nf_core::{Article, ArticleStore, Error, Result, SummarizeRequest, TextExtractor};
use tracing::debug;

/// Below this many characters (after trimming) there is nothing worth summarizing.
pub const MIN_TEXT_CHARS: usize = 40;

pub const NOT_ENOUGH_CONTENT: &str =
    "Not enough content to summarize. Provide content, url, or valid articleId.";

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSource {
    pub text: String,
    /// The article behind `articleId`, loaded while resolving.
    pub target: Option<Article>,
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}

/// Content first, then the page behind `url`, then the stored article.
pub async fn resolve_source(
    articles: &dyn ArticleStore,
    extractor: &dyn TextExtractor,
    request: &SummarizeRequest,
) -> Result<ResolvedSource> {
    let mut text = request.content().map(str::to_string);
    let mut target = None;

    if text.is_none() {
        if let Some(url) = request.url() {
            debug!(url = %url, "Resolving text from url");
            text = non_empty(extractor.extract(url).await?);
        }
    }

    // Text of last resort, or the row a persisted summary goes to. Must exist before any model call.
    if text.is_none() || request.persist {
        if let Some(article_id) = request.article_id {
            let article = articles
                .find_by_id(article_id)
                .await?
                .ok_or_else(|| Error::not_found("Article not found"))?;

            if text.is_none() {
                debug!(article_id, "Resolving text from stored article");
                if !article.url.is_empty() {
                    text = non_empty(extractor.extract(&article.url).await?);
                }
                if text.is_none() {
                    text = article.title.clone().and_then(non_empty);
                }
            }
            target = Some(article);
        }
    }

    match text {
        Some(text) if text.trim().chars().count() >= MIN_TEXT_CHARS => {
            Ok(ResolvedSource { text, target })
        }
        _ => Err(Error::bad_request(NOT_ENOUGH_CONTENT)),
    }
}
