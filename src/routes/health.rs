use axum::{
    Router,
    body::Bytes,
    extract::{RawQuery, State},
    http::StatusCode,
    routing::get,
};
use sqlx::AnyPool;

use crate::{error::ApiError, response::Reply, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/healthz", get(health_check))
}

/// Liveness plus a database round trip. Unauthenticated.
async fn health_check(
    State(db): State<AnyPool>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Reply, ApiError> {
    if query.is_some_and(|query| !query.is_empty()) || !body.is_empty() {
        return Err(ApiError::bad_request("Request body must be empty"));
    }

    sqlx::query("SELECT 1").execute(&db).await.map_err(|err| {
        tracing::warn!(error = %err, "health check could not reach the database");
        ApiError::ServiceUnavailable("Database connection error")
    })?;

    Ok(Reply::empty(StatusCode::OK))
}
