use std::sync::Arc;

use axum::{extract::State, Json};
use nf_core::{Error, UserId};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::extract::ApiJson;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleSignIn {
    pub id_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignedIn {
    pub id: UserId,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub access_token: String,
}

pub async fn google_sign_in(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<GoogleSignIn>,
) -> Result<Json<SignedIn>, ApiError> {
    let id_token = body
        .id_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::bad_request("idToken required"))?;

    let profile = state.identity.verify(&id_token).await?;
    let user = state
        .storage
        .users
        .find_or_create_user(profile.into())
        .await?;
    let access_token = state.jwt.create_token(&user)?;
    info!(user_id = user.id, "🔑 Signed in with Google");

    Ok(Json(SignedIn {
        id: user.id,
        email: user.email,
        name: user.name,
        picture: user.picture,
        access_token,
    }))
}
