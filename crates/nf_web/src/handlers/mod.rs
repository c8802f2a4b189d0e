use axum::{
    http::{Method, Uri},
    Json,
};
use nf_core::{Article, ArticleId, AuthUser, Error, Result};
use serde::Serialize;
use serde_json::{json, Value};

use crate::{ApiError, AppState};

pub mod ai;
pub mod articles;
pub mod auth;
pub mod news;
pub mod notes;

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn not_found(method: Method, uri: Uri) -> ApiError {
    ApiError(Error::not_found(format!("Route {} {} not found", method, uri)))
}

/// Loads an article the caller owns: 404 when it is missing, 403 when it belongs to someone else.
pub(crate) async fn owned_article(
    state: &AppState,
    user: &AuthUser,
    id: ArticleId,
) -> Result<Article> {
    let article = state
        .storage
        .articles
        .find_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Article not found"))?;
    if article.user_id != user.id {
        return Err(Error::Forbidden("You do not own this article".to_string()));
    }
    Ok(article)
}
