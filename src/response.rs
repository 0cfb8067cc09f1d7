//! Uniform response shape for every endpoint, errors included.

use axum::{
    Json,
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, X_CONTENT_TYPE_OPTIONS},
    },
    response::{IntoResponse, Response},
};
use serde::Serialize;

pub const CACHE_CONTROL_VALUE: &str = "no-cache, no-store, must-revalidate";
pub const CONTENT_TYPE_OPTIONS_VALUE: &str = "nosniff";

/// A status code plus an optional JSON payload. Without a payload the body
/// is empty rather than an encoded `null`.
#[derive(Debug)]
pub struct Reply<T = ()> {
    status: StatusCode,
    payload: Option<T>,
}

impl Reply {
    #[must_use]
    pub const fn empty(status: StatusCode) -> Self {
        Self {
            status,
            payload: None,
        }
    }
}

impl<T> Reply<T> {
    #[must_use]
    pub const fn new(status: StatusCode, payload: Option<T>) -> Self {
        Self { status, payload }
    }

    #[must_use]
    pub const fn json(status: StatusCode, payload: T) -> Self {
        Self::new(status, Some(payload))
    }
}

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        let mut response = match self.payload {
            Some(payload) => (self.status, Json(payload)).into_response(),
            None => self.status.into_response(),
        };

        let headers = response.headers_mut();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL_VALUE));
        headers.insert(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static(CONTENT_TYPE_OPTIONS_VALUE),
        );

        response
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn empty_reply_has_no_body() {
        let response = Reply::empty(StatusCode::NO_CONTENT).into_response();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(response.headers()[CACHE_CONTROL], CACHE_CONTROL_VALUE);
        assert_eq!(response.headers()[X_CONTENT_TYPE_OPTIONS], "nosniff");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn payload_is_json_encoded() {
        let response = Reply::json(StatusCode::CREATED, json!({ "id": "abc" })).into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CACHE_CONTROL], CACHE_CONTROL_VALUE);
        assert!(
            response.headers()["content-type"]
                .to_str()
                .unwrap()
                .starts_with("application/json")
        );

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), br#"{"id":"abc"}"#);
    }

    #[tokio::test]
    async fn missing_payload_is_not_null() {
        let response = Reply::<serde_json::Value>::new(StatusCode::OK, None).into_response();

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.is_empty());
    }
}
