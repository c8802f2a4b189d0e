use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use nf_core::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const EVERYTHING_URL: &str = "https://newsapi.org/v2/everything";
const PAGE_SIZE: &str = "10";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub source_id: Option<String>,
    pub source_name: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsSearch {
    pub articles: Vec<NewsItem>,
    pub total_results: u64,
}

#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn search(&self, query: &str) -> Result<NewsSearch>;
}

#[derive(Debug, Default, Deserialize)]
struct RawSource {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    #[serde(default)]
    source: Option<RawSource>,
    title: Option<String>,
    url: Option<String>,
    url_to_image: Option<String>,
    published_at: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSearch {
    #[serde(default)]
    articles: Vec<RawArticle>,
    #[serde(default)]
    total_results: u64,
}

#[derive(Debug, Deserialize)]
struct RawError {
    message: Option<String>,
}

impl From<RawArticle> for NewsItem {
    fn from(raw: RawArticle) -> Self {
        let source = raw.source.unwrap_or_default();
        NewsItem {
            source_id: source.id,
            source_name: source.name,
            title: raw.title,
            url: raw.url,
            image_url: raw.url_to_image,
            published_at: raw.published_at,
            description: raw.description,
        }
    }
}

impl From<RawSearch> for NewsSearch {
    fn from(raw: RawSearch) -> Self {
        NewsSearch {
            articles: raw.articles.into_iter().map(NewsItem::from).collect(),
            total_results: raw.total_results,
        }
    }
}

/// Client for the NewsAPI `everything` endpoint.
#[derive(Clone)]
pub struct NewsApiClient {
    client: Client,
    api_key: Option<String>,
}

impl NewsApiClient {
    pub fn new(api_key: Option<String>) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(10)).build()?,
            api_key,
        })
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    async fn search(&self, query: &str) -> Result<NewsSearch> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::External(anyhow!("NEWS_API_KEY is not configured")))?;

        let response = self
            .client
            .get(EVERYTHING_URL)
            .query(&[
                ("q", query),
                ("apiKey", api_key),
                ("language", "en"),
                ("sortBy", "publishedAt"),
                ("pageSize", PAGE_SIZE),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<RawError>()
                .await
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| "External API Error".to_string());
            warn!(status = status.as_u16(), message = %message, "NewsAPI request failed");
            return Err(Error::Upstream {
                status: Some(status.as_u16()),
                message,
            });
        }

        let search: NewsSearch = response.json::<RawSearch>().await?.into();
        info!(query = %query, results = search.articles.len(), "📰 News search");
        Ok(search)
    }
}
