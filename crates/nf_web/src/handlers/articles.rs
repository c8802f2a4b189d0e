use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{DateTime, Utc};
use nf_core::{Article, ArticleFilter, ArticleId, ArticleUpdate, AuthUser, Error, NewArticle};
use serde::Deserialize;
use tracing::info;

use super::{owned_article, Message};
use crate::extract::{ApiJson, ApiPath};
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArticle {
    pub source_id: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub tags: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateArticle {
    pub tags: Option<String>,
}

pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Article>>, ApiError> {
    let articles = state
        .storage
        .articles
        .find_all(&ArticleFilter::by_user(user.id))
        .await?;
    Ok(Json(articles))
}

pub async fn create_article(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiJson(body): ApiJson<CreateArticle>,
) -> Result<(StatusCode, Json<Article>), ApiError> {
    let url = body
        .url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
        .ok_or_else(|| Error::bad_request("url is required"))?;

    let article = state
        .storage
        .articles
        .create(NewArticle {
            user_id: user.id,
            source_id: body.source_id,
            url,
            title: body.title,
            image_url: body.image_url,
            published_at: body.published_at,
            tags: body.tags,
            ..Default::default()
        })
        .await?;
    info!(article_id = article.id, user_id = user.id, "Saved article");
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn update_article(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<ArticleId>,
    ApiJson(body): ApiJson<UpdateArticle>,
) -> Result<Json<Article>, ApiError> {
    owned_article(&state, &user, id).await?;
    let update = ArticleUpdate {
        tags: body.tags,
        ..Default::default()
    };
    let article = state.storage.articles.update(id, &update).await?;
    Ok(Json(article))
}

pub async fn delete_article(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    ApiPath(id): ApiPath<ArticleId>,
) -> Result<Json<Message>, ApiError> {
    owned_article(&state, &user, id).await?;
    state.storage.articles.delete(id).await?;
    info!(article_id = id, user_id = user.id, "🗑️ Deleted article");
    Ok(Json(Message {
        message: "Article deleted",
    }))
}
