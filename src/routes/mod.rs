use axum::extract::FromRequest;

use crate::error::ApiError;

pub mod assignment;
pub mod health;
pub mod submission;

/// `axum::Json` with rejections reported as 400 through [`ApiError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

pub async fn not_found() -> ApiError {
    ApiError::NotFound("Resource not found".to_owned())
}
