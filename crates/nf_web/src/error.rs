use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use nf_core::Error;
use serde::Serialize;
use tracing::{error, warn};

use crate::AppState;

const INTERNAL_MESSAGE: &str = "Internal Server Error";

/// Every handler failure goes out through this type.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl<E: Into<Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    error: &'a ErrorBody,
}

/// Kept on the response so `error_details` can put the details back in.
#[derive(Debug, Clone)]
struct ErrorDetails(ErrorBody);

impl ApiError {
    pub fn body(&self) -> ErrorBody {
        let err = &self.0;
        if err.is_internal() {
            return ErrorBody {
                code: err.code(),
                message: INTERNAL_MESSAGE.to_string(),
                details: Some(err.to_string()),
            };
        }
        let details = match err {
            Error::Upstream {
                status: Some(status),
                message,
            } => Some(format!("upstream status {}: {}", status, message)),
            _ => None,
        };
        ErrorBody {
            code: err.code(),
            message: err.to_string(),
            details,
        }
    }
}

fn render(status: StatusCode, body: &ErrorBody, with_details: bool) -> Response {
    let shown = ErrorBody {
        details: body.details.clone().filter(|_| with_details),
        ..body.clone()
    };
    (status, Json(Envelope { error: &shown })).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = self.body();

        if self.0.is_internal() {
            error!(code = body.code, error = ?self.0, "Request failed");
        } else {
            warn!(code = body.code, status = status.as_u16(), message = %body.message, "Request rejected");
        }

        let mut response = render(status, &body, false);
        response.extensions_mut().insert(ErrorDetails(body));
        response
    }
}

/// Re-renders error envelopes with their details when the server is configured to expose them.
pub async fn error_details(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if !state.config.expose_error_details {
        return response;
    }
    let body = response
        .extensions()
        .get::<ErrorDetails>()
        .map(|ErrorDetails(body)| body.clone())
        .filter(|body| body.details.is_some());
    match body {
        Some(body) => render(response.status(), &body, true),
        None => response,
    }
}
