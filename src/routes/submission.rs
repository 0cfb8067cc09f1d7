use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use reqwest::Url;
use serde::Deserialize;

use crate::{
    auth::AuthUser,
    error::ApiError,
    models::{Assignment, SubmitOutcome, Submission},
    notify::SubmissionNotice,
    response::Reply,
    routes::JsonBody,
    state::AppState,
    timestamp::Timestamp,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/assignments/{id}/submission", post(create_submission))
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmissionPayload {
    pub submission_url: Option<String>,
}

impl SubmissionPayload {
    fn submission_url(self) -> Result<String, ApiError> {
        let url = self
            .submission_url
            .map(|url| url.trim().to_owned())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ApiError::bad_request("submission_url is required"))?;

        Url::parse(&url)
            .map_err(|_| ApiError::bad_request("submission_url must be an absolute URL"))?;

        Ok(url)
    }
}

async fn create_submission(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(assignment_id): Path<String>,
    payload: Result<JsonBody<SubmissionPayload>, ApiError>,
) -> Result<Reply<Submission>, ApiError> {
    let assignment = Assignment::find(&state.db_pool, &assignment_id)
        .await?
        .ok_or_else(|| ApiError::assignment_not_found(&assignment_id))?;

    let JsonBody(payload) = payload?;
    let submission_url = payload.submission_url()?;

    if Timestamp::now() >= assignment.deadline {
        return Err(ApiError::bad_request(
            "The deadline for this assignment has passed",
        ));
    }

    let outcome =
        Submission::record(&state.db_pool, &assignment, &auth.id, &submission_url).await?;

    let (submission, prior) = match outcome {
        SubmitOutcome::Accepted { submission, prior } => (submission, prior),
        SubmitOutcome::NoAttemptsLeft => {
            return Err(ApiError::bad_request(
                "No attempts left for this assignment",
            ));
        }
        SubmitOutcome::Contended => {
            return Err(ApiError::bad_request(
                "Too many concurrent submissions for this assignment, try again",
            ));
        }
    };

    tracing::info!(
        submission_id = %submission.id,
        assignment_id = %assignment.id,
        attempt = submission.attempt,
        "submission accepted"
    );

    state.notifier.dispatch(SubmissionNotice {
        submission_url: submission.submission_url.clone(),
        email: auth.email,
        assignment_id: assignment.id,
        assignment_name: assignment.name,
        num_attempts: prior,
    });

    Ok(Reply::json(StatusCode::CREATED, submission))
}
