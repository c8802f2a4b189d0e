use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ArticleId = i64;
pub type NoteId = i64;
pub type UserId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: ArticleId,
    pub user_id: UserId,
    pub source_id: Option<String>,
    pub url: String,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub sentiment: Option<String>,
    pub keywords: Option<String>,
    pub tags: Option<String>,
    pub impact: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// Builds a stored article from its insert payload.
    pub fn from_new(id: ArticleId, new: NewArticle, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            source_id: new.source_id,
            url: new.url,
            title: new.title,
            image_url: new.image_url,
            published_at: new.published_at,
            summary: new.summary,
            sentiment: new.sentiment,
            keywords: new.keywords,
            tags: new.tags,
            impact: new.impact,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrites every field the update carries; absent fields are left alone.
    pub fn apply(&mut self, update: &ArticleUpdate, now: DateTime<Utc>) {
        if let Some(summary) = &update.summary {
            self.summary = Some(summary.clone());
        }
        if let Some(sentiment) = &update.sentiment {
            self.sentiment = Some(sentiment.clone());
        }
        if let Some(keywords) = &update.keywords {
            self.keywords = Some(keywords.clone());
        }
        if let Some(impact) = &update.impact {
            self.impact = Some(impact.clone());
        }
        if let Some(image_url) = &update.image_url {
            self.image_url = Some(image_url.clone());
        }
        if let Some(tags) = &update.tags {
            self.tags = Some(tags.clone());
        }
        self.updated_at = now;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    pub user_id: UserId,
    pub source_id: Option<String>,
    pub url: String,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub sentiment: Option<String>,
    pub keywords: Option<String>,
    pub tags: Option<String>,
    pub impact: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleUpdate {
    pub summary: Option<String>,
    pub sentiment: Option<String>,
    pub keywords: Option<String>,
    pub impact: Option<String>,
    pub image_url: Option<String>,
    pub tags: Option<String>,
}

impl ArticleUpdate {
    /// The fields a summarization writes into an article.
    pub fn from_summary(result: &ModelResult, image_url: Option<&str>) -> Self {
        Self {
            summary: Some(result.bullets.join("\n")),
            sentiment: Some(result.sentiment.to_string()),
            keywords: Some(result.keywords.join(",")),
            impact: Some(result.impact.clone()),
            image_url: image_url.map(str::to_string),
            tags: None,
        }
    }
}

/// Equality filter over articles. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleFilter {
    pub id: Option<ArticleId>,
    pub user_id: Option<UserId>,
    pub url: Option<String>,
}

impl ArticleFilter {
    pub fn by_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn by_url(url: impl Into<String>, user_id: Option<UserId>) -> Self {
        Self {
            id: None,
            user_id,
            url: Some(url.into()),
        }
    }

    pub fn matches(&self, article: &Article) -> bool {
        self.id.map_or(true, |id| article.id == id)
            && self.user_id.map_or(true, |user_id| article.user_id == user_id)
            && self.url.as_deref().map_or(true, |url| article.url == url)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub article_id: ArticleId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// The caller identity attached to a request by the auth layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "neutral" => Ok(Sentiment::Neutral),
            "negative" => Ok(Sentiment::Negative),
            other => Err(format!("unknown sentiment: {}", other)),
        }
    }
}

/// A validated model answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResult {
    pub bullets: Vec<String>,
    pub sentiment: Sentiment,
    pub keywords: Vec<String>,
    pub impact: String,
}

fn default_persist() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub article_id: Option<ArticleId>,
    #[serde(default = "default_persist")]
    pub persist: bool,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Default for SummarizeRequest {
    fn default() -> Self {
        Self {
            content: None,
            url: None,
            article_id: None,
            persist: true,
            image_url: None,
        }
    }
}

impl SummarizeRequest {
    pub fn content(&self) -> Option<&str> {
        non_empty(self.content.as_deref())
    }

    pub fn url(&self) -> Option<&str> {
        non_empty(self.url.as_deref())
    }

    pub fn image_url(&self) -> Option<&str> {
        non_empty(self.image_url.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeResponse {
    pub bullets: Vec<String>,
    pub sentiment: Sentiment,
    pub keywords: Vec<String>,
    pub impact: String,
    pub image_url: Option<String>,
    pub saved_article_id: Option<ArticleId>,
}
