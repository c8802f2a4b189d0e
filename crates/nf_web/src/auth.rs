use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use nf_core::{AuthUser, Error, Result, User, UserId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ApiError, AppState};

const ISSUER: &str = "newsflash";
const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub id: UserId,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

/// Issues and checks the bearer tokens handed out at sign-in.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn create_token(&self, user: &User) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            id: user.id,
            email: user.email.clone(),
            exp: (now + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
            iat: now.timestamp(),
            iss: ISSUER.to_string(),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| Error::External(e.into()))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[ISSUER]);
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Rejected bearer token");
                Error::Unauthorized("Invalid authentication token".to_string())
            })
    }
}

fn unauthorized() -> Error {
    Error::Unauthorized("Unauthorized".to_string())
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolves a bearer token to a user that still exists.
async fn authenticate(state: &AppState, token: &str) -> Result<AuthUser> {
    let claims = state.jwt.verify_token(token)?;
    let user = state
        .storage
        .users
        .find_user(claims.id)
        .await?
        .ok_or_else(unauthorized)?;
    Ok(AuthUser {
        id: user.id,
        email: user.email,
        name: user.name,
    })
}

pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> std::result::Result<Response, ApiError> {
    let token = bearer_token(&request)
        .map(str::to_string)
        .ok_or_else(unauthorized)?;
    let user = authenticate(&state, &token).await?;
    debug!(user_id = user.id, "Authenticated request");
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Attaches the caller when a valid token is present and lets everyone else through.
pub async fn optional_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match bearer_token(&request).map(str::to_string) {
        Some(token) => authenticate(&state, &token).await.ok(),
        None => None,
    };
    if let Some(user) = user {
        request.extensions_mut().insert(user);
    }
    next.run(request).await
}
