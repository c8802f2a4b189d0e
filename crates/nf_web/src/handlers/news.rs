use std::sync::Arc;

use axum::{extract::State, Json};
use nf_core::Error;
use serde::Deserialize;

use crate::clients::NewsSearch;
use crate::extract::ApiQuery;
use crate::{ApiError, AppState};

const MIN_QUERY_CHARS: usize = 2;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<NewsSearch>, ApiError> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| q.chars().count() >= MIN_QUERY_CHARS)
        .ok_or_else(|| Error::bad_request("Query 'q' must be at least 2 characters"))?;
    let results = state.news.search(query).await?;
    Ok(Json(results))
}
