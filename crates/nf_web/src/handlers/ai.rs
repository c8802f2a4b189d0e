use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use nf_core::{AuthUser, SummarizeRequest, SummarizeResponse};

use crate::extract::ApiJson;
use crate::{ApiError, AppState};

/// Serves both the signed-in and the public summarize routes; the latter may arrive without a user.
pub async fn summarize(
    State(state): State<Arc<AppState>>,
    user: Option<Extension<AuthUser>>,
    ApiJson(request): ApiJson<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let user = user.map(|Extension(user)| user);
    let response = state.summarizer.summarize(&request, user.as_ref()).await?;
    Ok(Json(response))
}
