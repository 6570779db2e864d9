//! Error handling for the API.
//!
//! Prefer adding a variant to [CenterError] over forcing a failure into a
//! generic `Server` error: each variant maps to one status code and one
//! JSON body shape.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

/// The error enum for all error handling across the API.
///
/// Every variant is rendered as
///
/// ```json
/// {
///     "message": <category>,
///     "statusCode": <status>,
///     "error": <details>
/// }
/// ```
#[derive(Debug, Error)]
pub enum CenterError {
    /// \[400\] Missing or malformed input, rejected before touching storage.
    #[error("{0}")]
    Validation(String),
    /// \[400\] A malformed query parameter. The details are reported in
    /// `message` as well as `error`.
    #[error("{0}")]
    InvalidQuery(String),
    /// \[400\] A uniqueness or integrity constraint was violated.
    #[error("{0}")]
    Conflict(String),
    /// \[404\] The referenced row does not exist.
    #[error("{0}")]
    NotFound(String),
    /// \[401\] The login attempt was rejected.
    ///
    /// Both causes produce the same external message.
    #[error("invalid username or password")]
    Auth(AuthFailure),
    /// \[500\] Any other failure reported by the database.
    #[error("{0}")]
    Database(#[from] sqlx::Error),
    /// \[500\] An internal failure outside of the database.
    #[error("{0}")]
    Server(String),
}

/// Why a login attempt was rejected. Only ever logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    UnknownUser,
    WrongPassword,
}

/// The return type for all endpoints and model operations.
pub type CenterResult<T> = Result<T, CenterError>;

/// SQLSTATE codes that PostgreSQL reports for integrity violations.
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl CenterError {
    pub fn status(&self) -> StatusCode {
        match self {
            CenterError::Validation(_)
            | CenterError::InvalidQuery(_)
            | CenterError::Conflict(_) => StatusCode::BAD_REQUEST,
            CenterError::NotFound(_) => StatusCode::NOT_FOUND,
            CenterError::Auth(_) => StatusCode::UNAUTHORIZED,
            CenterError::Database(_) | CenterError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn category(&self) -> &'static str {
        match self {
            CenterError::Validation(_) | CenterError::InvalidQuery(_) => "bad request",
            CenterError::Conflict(_) => "conflict",
            CenterError::NotFound(_) => "resource not found",
            CenterError::Auth(_) => "login failed",
            CenterError::Database(_) => "database error",
            CenterError::Server(_) => "server error",
        }
    }

    pub fn as_response(&self) -> (StatusCode, Value) {
        let status = self.status();
        let message = match self {
            CenterError::InvalidQuery(details) => details.clone(),
            other => other.category().to_owned(),
        };
        let body = json!({
            "message": message,
            "statusCode": status.as_u16(),
            "error": self.to_string(),
        });

        (status, body)
    }

    /// Builds a mapper that turns constraint violations into
    /// [Conflict](CenterError::Conflict) with the given message and keeps
    /// every other database failure as is.
    pub fn conflict(message: impl Into<String>) -> impl FnOnce(sqlx::Error) -> CenterError {
        let message = message.into();
        move |error| {
            if is_constraint_violation(&error) {
                CenterError::Conflict(message)
            } else {
                CenterError::Database(error)
            }
        }
    }
}

pub fn is_constraint_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => {
            is_constraint_code(db_error.code().as_deref())
        }
        _ => false,
    }
}

fn is_constraint_code(code: Option<&str>) -> bool {
    matches!(code, Some(UNIQUE_VIOLATION) | Some(FOREIGN_KEY_VIOLATION))
}

impl IntoResponse for CenterError {
    fn into_response(self) -> Response {
        match &self {
            CenterError::Auth(cause) => tracing::debug!(?cause, "rejected login"),
            error if error.status().is_server_error() => {
                tracing::error!(error = %error, "request failed")
            }
            error => tracing::debug!(error = %error, "request rejected"),
        }

        let (status, body) = self.as_response();
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for CenterError {
    fn from(rejection: JsonRejection) -> Self {
        CenterError::Validation(format!("Invalid request body: {}", rejection))
    }
}

impl From<bcrypt::BcryptError> for CenterError {
    fn from(error: bcrypt::BcryptError) -> Self {
        CenterError::Server(format!("Failed to process password: {}", error))
    }
}
