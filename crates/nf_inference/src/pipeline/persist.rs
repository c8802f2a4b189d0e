use nf_core::{
    Article, ArticleFilter, ArticleId, ArticleStore, ArticleUpdate, Error, ModelResult,
    NewArticle, Result, SummarizeRequest, UserId,
};
use tracing::info;

use super::resolve::ResolvedSource;

pub const MAX_TITLE_CHARS: usize = 180;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistAction {
    Skip,
    UpdateById(ArticleId),
    /// Update the article stored under this url, or create it for a signed-in user.
    UpsertByUrl { url: String, user_id: Option<UserId> },
}

impl PersistAction {
    pub fn plan(request: &SummarizeRequest, user_id: Option<UserId>) -> Self {
        if !request.persist {
            return PersistAction::Skip;
        }
        if let Some(article_id) = request.article_id {
            return PersistAction::UpdateById(article_id);
        }
        match request.url() {
            Some(url) => PersistAction::UpsertByUrl {
                url: url.to_string(),
                user_id,
            },
            None => PersistAction::Skip,
        }
    }
}

/// First line of the source text, cut to the title column width.
pub fn derive_title(text: &str) -> Option<String> {
    let first_line = text.lines().next().unwrap_or("").trim();
    let title: String = first_line.chars().take(MAX_TITLE_CHARS).collect();
    (!title.is_empty()).then_some(title)
}

/// Writes the summary according to the planned action and returns the stored article.
pub async fn persist(
    articles: &dyn ArticleStore,
    action: PersistAction,
    source: &ResolvedSource,
    result: &ModelResult,
    image_url: Option<&str>,
) -> Result<Option<Article>> {
    let update = ArticleUpdate::from_summary(result, image_url);

    match action {
        PersistAction::Skip => Ok(None),
        PersistAction::UpdateById(article_id) => {
            let loaded = source.target.as_ref().filter(|a| a.id == article_id);
            if loaded.is_none() && articles.find_by_id(article_id).await?.is_none() {
                return Err(Error::not_found("Article not found"));
            }
            let article = articles.update(article_id, &update).await?;
            info!(article_id, "📝 Updated article summary");
            Ok(Some(article))
        }
        PersistAction::UpsertByUrl { url, user_id } => {
            let filter = ArticleFilter::by_url(url.clone(), user_id);
            if let Some(existing) = articles.find_one(&filter).await? {
                let article = articles.update(existing.id, &update).await?;
                info!(article_id = article.id, url = %url, "📝 Updated article summary");
                return Ok(Some(article));
            }

            let Some(user_id) = user_id else {
                info!(url = %url, "Anonymous summary, nothing stored");
                return Ok(None);
            };
            let article = articles
                .create(NewArticle {
                    user_id,
                    url: url.clone(),
                    title: derive_title(&source.text),
                    image_url: update.image_url,
                    summary: update.summary,
                    sentiment: update.sentiment,
                    keywords: update.keywords,
                    impact: update.impact,
                    ..Default::default()
                })
                .await?;
            info!(article_id = article.id, url = %url, "✨ Created article from summary");
            Ok(Some(article))
        }
    }
}
