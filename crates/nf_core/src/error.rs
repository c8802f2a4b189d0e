use thiserror::Error;

pub const AI_RESPONSE_INVALID: &str = "AI response invalid";

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// The generative model answered, but not with something we can use.
    #[error("{0}")]
    UpstreamInvalid(String),

    /// A third-party API answered with a non-success status.
    #[error("{message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn ai_response_invalid() -> Self {
        Self::UpstreamInvalid(AI_RESPONSE_INVALID.to_string())
    }

    /// HTTP status this error is reported with.
    pub fn status(&self) -> u16 {
        match self {
            Error::BadRequest(_) => 400,
            Error::Unauthorized(_) => 401,
            Error::Forbidden(_) => 403,
            Error::NotFound(_) => 404,
            Error::UpstreamInvalid(_) | Error::Upstream { .. } => 502,
            Error::Extraction(_)
            | Error::Inference(_)
            | Error::Storage(_)
            | Error::Serialization(_)
            | Error::Http(_)
            | Error::External(_) => 500,
        }
    }

    /// Machine-readable code used in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Error::BadRequest(_) => "BAD_REQUEST",
            Error::Unauthorized(_) => "UNAUTHORIZED",
            Error::Forbidden(_) => "FORBIDDEN",
            Error::NotFound(_) => "NOT_FOUND",
            Error::UpstreamInvalid(_) => "AI_RESPONSE_INVALID",
            Error::Upstream { .. } => "EXTERNAL_API_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    /// Whether the message is safe to show to a client as-is.
    pub fn is_internal(&self) -> bool {
        self.status() >= 500 && !matches!(self, Error::UpstreamInvalid(_) | Error::Upstream { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
