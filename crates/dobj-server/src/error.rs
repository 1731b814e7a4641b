use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use dobj_engine::EngineError;
use dobj_store::LinkError;

/// Failures while assembling or running the service.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("link signer error: {0}")]
    Link(#[from] LinkError),

    #[error("store error: {0}")]
    Store(#[from] dobj_store::StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

/// Error returned by request handlers, rendered as
/// `{"error": code, "message": text}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Engine(e) => engine_status(e),
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Link(LinkError::BadSignature) => StatusCode::FORBIDDEN,
            Self::Link(LinkError::Expired(_)) => StatusCode::GONE,
            Self::Link(LinkError::InvalidKey(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Engine(e) => e.code(),
            Self::BadRequest(_) => "bad_request",
            Self::Link(LinkError::BadSignature) => "bad_signature",
            Self::Link(LinkError::Expired(_)) => "link_expired",
            Self::Link(LinkError::InvalidKey(_)) | Self::Internal(_) => "internal",
        }
    }
}

fn engine_status(e: &EngineError) -> StatusCode {
    match e {
        EngineError::InvalidResource { .. }
        | EngineError::InvalidSource { .. }
        | EngineError::InvalidTtl { .. } => StatusCode::BAD_REQUEST,
        EngineError::NotAnObject(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::CollectionRequiresRecursive(_) | EngineError::AlreadyExists(_) => {
            StatusCode::CONFLICT
        }
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::SourceUnreachable { .. } => StatusCode::BAD_GATEWAY,
        EngineError::ExternalServiceFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = json!({ "error": self.code(), "message": self.to_string() });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
