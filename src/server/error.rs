//! HTTP error mapping
//!
//! Handlers return `Result<_, ApiError>`. Each [`StoryMagicError`] variant
//! has a fixed status code; anything unexpected becomes a 500 carrying the
//! endpoint's generic failure message, with the cause only in the log.

use crate::error::StoryMagicError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

/// Error response body plus status
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: Value,
}

impl ApiError {
    /// Error with a plain `{error}` body
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    /// Map an error from the service layer
    ///
    /// `failure` is the message returned when the error has no specific
    /// mapping.
    pub fn from_error(err: anyhow::Error, failure: &'static str) -> Self {
        let Some(known) = err.downcast_ref::<StoryMagicError>() else {
            tracing::error!("{}: {:#}", failure, err);
            return Self::new(StatusCode::INTERNAL_SERVER_ERROR, failure);
        };

        match known {
            StoryMagicError::Validation(msg) | StoryMagicError::Conflict(msg) => {
                Self::new(StatusCode::BAD_REQUEST, msg.clone())
            }
            StoryMagicError::InvalidPlan(plan) => {
                tracing::debug!("Rejected plan id '{}'", plan);
                Self::new(StatusCode::BAD_REQUEST, "Invalid plan")
            }
            StoryMagicError::InvalidCredentials => {
                Self::new(StatusCode::UNAUTHORIZED, known.to_string())
            }
            StoryMagicError::NotFound(_) => Self::new(StatusCode::NOT_FOUND, known.to_string()),
            StoryMagicError::QuotaExceeded { plan, used, limit } => Self {
                status: StatusCode::FORBIDDEN,
                body: json!({
                    "error": "You've reached your monthly story limit. Please upgrade your plan to create more stories!",
                    "needsUpgrade": true,
                    "plan": plan,
                    "storiesThisMonth": used,
                    "limit": limit,
                }),
            },
            _ => {
                tracing::error!("{}: {:#}", failure, err);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, failure)
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        Self::new(StatusCode::BAD_REQUEST, "Invalid request body")
    }
}

/// Attach an endpoint's generic failure message to a service result
pub trait OrFail<T> {
    fn or_fail(self, failure: &'static str) -> Result<T, ApiError>;
}

impl<T> OrFail<T> for crate::error::Result<T> {
    fn or_fail(self, failure: &'static str) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::from_error(e, failure))
    }
}
