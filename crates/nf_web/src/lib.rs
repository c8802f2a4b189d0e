use std::fmt;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod auth;
pub mod clients;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

#[derive(Clone, Default)]
pub struct Config {
    pub jwt_secret: String,
    pub google_client_id: Option<String>,
    pub news_api_key: Option<String>,
    /// Mounts `/public/ai/summarize`, which accepts anonymous callers.
    ///
    /// An anonymous `articleId` request still updates that article, whoever owns it, and a
    /// `url` request updates any article stored under that url. Only enable this where every
    /// caller may rewrite stored summaries.
    pub public_summarize: bool,
    pub expose_error_details: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("jwt_secret", &"<redacted>")
            .field("google_client_id", &self.google_client_id)
            .field("news_api_key", &self.news_api_key.as_deref().map(|_| "<redacted>"))
            .field("public_summarize", &self.public_summarize)
            .field("expose_error_details", &self.expose_error_details)
            .finish()
    }
}

pub fn create_app(state: AppState) -> Router {
    let state = Arc::new(state);
    let require_auth = middleware::from_fn_with_state(state.clone(), auth::require_auth);

    let protected = Router::new()
        .route(
            "/articles",
            get(handlers::articles::list_articles).post(handlers::articles::create_article),
        )
        .route(
            "/articles/:id",
            put(handlers::articles::update_article).delete(handlers::articles::delete_article),
        )
        .route(
            "/articles/:id/notes",
            get(handlers::notes::list_notes).post(handlers::notes::create_note),
        )
        .route(
            "/articles/:id/notes/:note_id",
            put(handlers::notes::update_note).delete(handlers::notes::delete_note),
        )
        .route("/ai/summarize", post(handlers::ai::summarize))
        .route_layer(require_auth);

    let mut public = Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/auth/google", post(handlers::auth::google_sign_in))
        .route("/news/search", get(handlers::news::search));

    if state.config.public_summarize {
        public = public.route(
            "/public/ai/summarize",
            post(handlers::ai::summarize).route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::optional_auth,
            )),
        );
    }

    Router::new()
        .merge(protected)
        .merge(public)
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            error::error_details,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, create_app(state)).await
}

pub mod prelude {
    pub use crate::{create_app, serve, ApiError, AppState, Config};
    pub use nf_core::{Error, Result};
}
