//! Error types for the Fastwitter server.
//!
//! Two layers:
//!
//! - [`FastwitterError`] wraps every crate-specific error, so startup
//!   code and helpers can use `?` across crate boundaries.
//! - [`ApiError`] is what a handler returns. It is turned into an HTTP
//!   status and an [`ErrorResponse`] body in exactly one place, its
//!   `IntoResponse` impl.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fastwitter_protocol::{ErrorResponse, ProtocolError, ValidationError};
use fastwitter_session::SessionError;
use fastwitter_store::StoreError;

/// Top-level error that wraps all crate-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum FastwitterError {
    /// Encoding/decoding or validation failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The cache or the database failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Loading or saving a session failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Settings could not be loaded.
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    /// Binding or serving the listener failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Hashing a password, or parsing a stored hash, failed.
    #[error("password hash error: {0}")]
    Password(String),

    /// A task on the blocking pool panicked or was cancelled.
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// A failed request, as the client will see it.
///
/// The `#[error]` text is the `error` field of the response body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 401: the route needs a signed-in user (or, for sign-in and
    /// sign-up, a signed-out one).
    #[error("unauthorized")]
    Unauthenticated,

    /// 403: signed in, but not allowed to touch this resource.
    #[error("forbidden")]
    Forbidden,

    /// 404
    #[error("not found")]
    NotFound,

    /// 400 with a specific message.
    #[error("{0}")]
    BadRequest(String),

    /// 400 listing the fields that failed.
    #[error("Client sent incomplete data")]
    Validation(Vec<ValidationError>),

    /// 500. Details are logged, never sent.
    #[error("Server internal fatal_error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = ErrorResponse::new(self.to_string());
        if let ApiError::Validation(errors) = self {
            body = body.with_validation(errors);
        }
        (status, Json(body)).into_response()
    }
}

impl From<FastwitterError> for ApiError {
    fn from(err: FastwitterError) -> Self {
        match err {
            FastwitterError::Protocol(e) => e.into(),
            other => {
                tracing::error!(error = %other, "request failed");
                ApiError::Internal
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        FastwitterError::from(err).into()
    }
}

impl From<ProtocolError> for ApiError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Invalid(errors) => ApiError::Validation(errors),
            other => {
                tracing::error!(error = %other, "request failed");
                ApiError::Internal
            }
        }
    }
}
