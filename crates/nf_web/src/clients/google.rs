use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use nf_core::{Error, NewUser, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

#[derive(Debug, Clone, PartialEq)]
pub struct GoogleProfile {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

impl From<GoogleProfile> for NewUser {
    fn from(profile: GoogleProfile) -> Self {
        NewUser {
            email: profile.email,
            name: profile.name,
            picture: profile.picture,
        }
    }
}

/// Turns a Google ID token into the profile it was issued for.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<GoogleProfile>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

/// Checks ID tokens against Google's tokeninfo endpoint.
#[derive(Debug, Clone)]
pub struct GoogleTokenVerifier {
    client: Client,
    client_id: Option<String>,
    base_url: String,
}

impl GoogleTokenVerifier {
    pub fn new(client_id: Option<String>) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(10)).build()?,
            client_id,
            base_url: TOKENINFO_URL.to_string(),
        })
    }

    fn check_claims(&self, client_id: &str, info: TokenInfo) -> Result<GoogleProfile> {
        if info.aud != client_id {
            warn!(aud = %info.aud, "Google token issued for another audience");
            return Err(Error::Unauthorized("Google authentication failed".to_string()));
        }
        let email = info
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| Error::Unauthorized("Google account has no email".to_string()))?;
        Ok(GoogleProfile {
            email,
            name: info.name,
            picture: info.picture,
        })
    }
}

#[async_trait]
impl IdentityVerifier for GoogleTokenVerifier {
    async fn verify(&self, id_token: &str) -> Result<GoogleProfile> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| Error::External(anyhow!("GOOGLE_CLIENT_ID is not configured")))?;

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("id_token", id_token)])
            .send()
            .await?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "Google rejected the ID token");
            return Err(Error::Unauthorized("Google authentication failed".to_string()));
        }

        let info: TokenInfo = response.json().await?;
        self.check_claims(client_id, info)
    }
}
