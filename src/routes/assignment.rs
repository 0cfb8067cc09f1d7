use axum::{
    Router,
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::StatusCode,
    routing::get,
};
use sqlx::AnyPool;

use crate::{
    auth::AuthUser,
    error::ApiError,
    models::{Assignment, AssignmentPayload},
    response::Reply,
    routes::JsonBody,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/assignments",
            get(list_assignments).post(create_assignment),
        )
        .route(
            "/v1/assignments/{id}",
            get(get_assignment)
                .put(update_assignment)
                .delete(delete_assignment),
        )
}

async fn list_assignments(
    _auth: AuthUser,
    State(db): State<AnyPool>,
) -> Result<Reply<Vec<Assignment>>, ApiError> {
    let assignments = Assignment::all(&db).await?;
    tracing::info!(count = assignments.len(), "assignments retrieved");

    Ok(Reply::json(StatusCode::OK, assignments))
}

async fn get_assignment(
    _auth: AuthUser,
    State(db): State<AnyPool>,
    Path(assignment_id): Path<String>,
) -> Result<Reply<Assignment>, ApiError> {
    let assignment = Assignment::find(&db, &assignment_id)
        .await?
        .ok_or_else(|| ApiError::assignment_not_found(&assignment_id))?;

    Ok(Reply::json(StatusCode::OK, assignment))
}

async fn create_assignment(
    auth: AuthUser,
    State(db): State<AnyPool>,
    JsonBody(payload): JsonBody<AssignmentPayload>,
) -> Result<Reply<Assignment>, ApiError> {
    let draft = payload.validate()?;
    let assignment = Assignment::new(draft, auth.id);

    assignment.insert(&db).await?;
    tracing::info!(assignment_id = %assignment.id, creator_id = %assignment.creator_id, "assignment created");

    Ok(Reply::json(StatusCode::CREATED, assignment))
}

/// Full replace. Existence and ownership are checked before the body is
/// looked at, so a stranger gets 403 even with a malformed body.
async fn update_assignment(
    auth: AuthUser,
    State(db): State<AnyPool>,
    Path(assignment_id): Path<String>,
    payload: Result<JsonBody<AssignmentPayload>, ApiError>,
) -> Result<Reply, ApiError> {
    let mut assignment = Assignment::find(&db, &assignment_id)
        .await?
        .ok_or_else(|| ApiError::assignment_not_found(&assignment_id))?;

    if !assignment.is_owned_by(&auth.id) {
        return Err(ApiError::Forbidden(
            "You don't have permission to update this assignment",
        ));
    }

    let JsonBody(payload) = payload?;
    let draft = payload.validate()?;

    assignment.replace(&db, draft).await?;
    tracing::info!(assignment_id = %assignment.id, "assignment updated");

    Ok(Reply::empty(StatusCode::NO_CONTENT))
}

async fn delete_assignment(
    auth: AuthUser,
    State(db): State<AnyPool>,
    Path(assignment_id): Path<String>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Result<Reply, ApiError> {
    if query.is_some_and(|query| !query.is_empty()) || !body.is_empty() {
        return Err(ApiError::bad_request("Request body must be empty"));
    }

    let assignment = Assignment::find(&db, &assignment_id)
        .await?
        .ok_or_else(|| ApiError::assignment_not_found(&assignment_id))?;

    if !assignment.is_owned_by(&auth.id) {
        return Err(ApiError::Forbidden(
            "You don't have permission to delete this assignment",
        ));
    }

    let submissions = Assignment::delete_with_submissions(&db, &assignment.id).await?;
    tracing::info!(assignment_id = %assignment.id, submissions, "assignment deleted");

    Ok(Reply::empty(StatusCode::NO_CONTENT))
}
