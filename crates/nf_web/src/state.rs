use std::sync::Arc;

use nf_core::Result;
use nf_inference::Summarizer;
use nf_storage::Storage;

use crate::auth::JwtService;
use crate::clients::{GoogleTokenVerifier, IdentityVerifier, NewsApiClient, NewsSource};
use crate::Config;

pub struct AppState {
    pub config: Config,
    pub storage: Storage,
    pub summarizer: Summarizer,
    pub jwt: JwtService,
    pub identity: Arc<dyn IdentityVerifier>,
    pub news: Arc<dyn NewsSource>,
}

impl AppState {
    /// Wires the Google and NewsAPI clients from `config`.
    pub fn new(config: Config, storage: Storage, summarizer: Summarizer) -> Result<Self> {
        let identity = Arc::new(GoogleTokenVerifier::new(config.google_client_id.clone())?);
        let news = Arc::new(NewsApiClient::new(config.news_api_key.clone())?);
        Ok(Self {
            jwt: JwtService::new(&config.jwt_secret),
            config,
            storage,
            summarizer,
            identity,
            news,
        })
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentityVerifier>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_news(mut self, news: Arc<dyn NewsSource>) -> Self {
        self.news = news;
        self
    }
}
