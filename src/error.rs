use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::response::Reply;

const BASIC_CHALLENGE: &str = r#"Basic realm="coursework""#;

/// Every way a request can fail, mapped onto a status code by
/// [`ApiError::status_code`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ServiceUnavailable(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password verification could not run")]
    Hashing,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn assignment_not_found(id: &str) -> Self {
        Self::NotFound(format!("Assignment {id} not found"))
    }

    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(err) if is_connectivity(err) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) | Self::Hashing => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Database details stay in the logs.
    fn description(&self) -> String {
        match self {
            Self::Database(err) if is_connectivity(err) => "Database connection error".to_owned(),
            Self::Database(_) | Self::Hashing => "Internal server error".to_owned(),
            other => other.to_string(),
        }
    }
}

const fn is_connectivity(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
    )
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, %status, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }

        let mut response = Reply::json(
            status,
            ErrorBody {
                error: self.description(),
            },
        )
        .into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static(BASIC_CHALLENGE));
        }

        response
    }
}
