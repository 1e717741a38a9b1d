//! Error responses.
//!
//! # Responsibilities
//! - Map handler failures to HTTP status codes
//! - Render a JSON body carrying the error category and message
//!
//! # Design Decisions
//! - Request-recoverable failures only; startup failures never reach a client
//! - Validation failures keep the category assigned by the validator
//! - Middleware rejections (body limit, timeout) share the same JSON shape

use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alarm::MailError;
use crate::validation::ValidationError;

/// Category reported for mail delivery failures.
pub const MAIL_CATEGORY: &str = "mail";
/// Category reported when the request body cannot be read (too large, aborted).
pub const REQUEST_CATEGORY: &str = "request";
/// Category reported when a request exceeds `http.timeout`.
pub const TIMEOUT_CATEGORY: &str = "timeout";
/// Category reported for unexpected middleware failures.
pub const INTERNAL_CATEGORY: &str = "internal";

/// Failure of an alarm request.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("token is invalid")]
    InvalidToken,

    #[error(transparent)]
    Mail(#[from] MailError),

    #[error(transparent)]
    Body(#[from] BytesRejection),

    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidToken => StatusCode::BAD_REQUEST,
            AppError::Mail(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Body(rejection) => rejection.status(),
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
        }
    }

    pub fn category(&self) -> Option<&str> {
        match self {
            AppError::Validation(err) => Some(err.category()),
            AppError::InvalidToken => None,
            AppError::Mail(_) => Some(MAIL_CATEGORY),
            AppError::Body(_) => Some(REQUEST_CATEGORY),
            AppError::Timeout => Some(TIMEOUT_CATEGORY),
            AppError::Internal(_) => Some(INTERNAL_CATEGORY),
        }
    }

    pub fn message(&self) -> String {
        match self {
            AppError::Validation(err) => err.message(),
            AppError::Body(rejection) => rejection.body_text(),
            other => other.to_string(),
        }
    }
}

/// JSON body of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub message: String,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        Self {
            status_code: err.status().as_u16(),
            category: err.category().map(str::to_string),
            message: err.message(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::from(&self))).into_response()
    }
}
