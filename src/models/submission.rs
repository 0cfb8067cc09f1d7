use serde::Serialize;
use sqlx::AnyPool;
use uuid::Uuid;

use crate::{models::Assignment, timestamp::Timestamp};

/// How often a submission re-counts after losing an attempt ordinal to a
/// concurrent insert.
const ORDINAL_RETRIES: usize = 3;

const COLUMNS: &str = "id, assignment_id, submitter_id, attempt, submission_url, submission_date, submission_updated";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Submission {
    pub id: String,

    pub assignment_id: String,
    #[serde(skip)]
    pub submitter_id: String,
    /// 1-based ordinal among the submitter's submissions for the assignment.
    #[serde(skip)]
    pub attempt: i64,

    pub submission_url: String,
    #[sqlx(try_from = "String")]
    pub submission_date: Timestamp,
    #[serde(rename = "assigment_updated")]
    #[sqlx(try_from = "String")]
    pub submission_updated: Timestamp,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Accepted {
        submission: Submission,
        /// Submissions the submitter had made before this one.
        prior: i64,
    },
    NoAttemptsLeft,
    /// Concurrent submissions kept taking the ordinal this one computed.
    Contended,
}

impl Submission {
    pub async fn for_assignment(db: &AnyPool, assignment_id: &str) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {COLUMNS} FROM submissions WHERE assignment_id = $1 ORDER BY submission_date, attempt"
        ))
        .bind(assignment_id)
        .fetch_all(db)
        .await
    }

    pub async fn count_by(db: &AnyPool, assignment_id: &str, submitter_id: &str) -> sqlx::Result<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM submissions WHERE assignment_id = $1 AND submitter_id = $2",
        )
        .bind(assignment_id)
        .bind(submitter_id)
        .fetch_one(db)
        .await
    }

    /// Records a submission if the submitter has attempts left.
    ///
    /// The count and the insert share a transaction, and the unique
    /// `(assignment_id, submitter_id, attempt)` key turns a concurrent insert
    /// of the same ordinal into a unique violation, after which the count is
    /// taken again.
    pub async fn record(
        db: &AnyPool,
        assignment: &Assignment,
        submitter_id: &str,
        submission_url: &str,
    ) -> sqlx::Result<SubmitOutcome> {
        for _ in 0..ORDINAL_RETRIES {
            let mut tx = db.begin().await?;

            let prior = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM submissions WHERE assignment_id = $1 AND submitter_id = $2",
            )
            .bind(&assignment.id)
            .bind(submitter_id)
            .fetch_one(&mut *tx)
            .await?;

            if assignment.number_of_attempts - prior <= 0 {
                tx.rollback().await?;
                return Ok(SubmitOutcome::NoAttemptsLeft);
            }

            let now = Timestamp::now();
            let submission = Self {
                id: Uuid::new_v4().to_string(),
                assignment_id: assignment.id.clone(),
                submitter_id: submitter_id.to_owned(),
                attempt: prior + 1,
                submission_url: submission_url.to_owned(),
                submission_date: now,
                submission_updated: now,
            };

            let inserted = sqlx::query(&format!(
                "INSERT INTO submissions ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
            ))
            .bind(&submission.id)
            .bind(&submission.assignment_id)
            .bind(&submission.submitter_id)
            .bind(submission.attempt)
            .bind(&submission.submission_url)
            .bind(submission.submission_date.to_string())
            .bind(submission.submission_updated.to_string())
            .execute(&mut *tx)
            .await;

            match inserted {
                Ok(_) => {
                    tx.commit().await?;
                    return Ok(SubmitOutcome::Accepted { submission, prior });
                }
                Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                    tx.rollback().await?;
                    tracing::debug!(
                        assignment_id = %assignment.id,
                        attempt = submission.attempt,
                        "attempt ordinal taken concurrently, recounting"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Ok(SubmitOutcome::Contended)
    }
}
