use serde::{Deserialize, Serialize};
use sqlx::AnyPool;
use uuid::Uuid;

use crate::{error::ApiError, timestamp::Timestamp};

pub const MIN_POINTS: i64 = 1;
pub const MAX_POINTS: i64 = 100;
pub const MIN_ATTEMPTS: i64 = 1;
pub const MAX_ATTEMPTS: i64 = 100;

const COLUMNS: &str = "id, name, points, number_of_attempts, deadline, creator_id, assignment_created, assignment_updated";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Assignment {
    pub id: String,

    pub name: String,
    pub points: i64,
    pub number_of_attempts: i64,
    #[sqlx(try_from = "String")]
    pub deadline: Timestamp,

    #[serde(skip)]
    pub creator_id: String,

    #[sqlx(try_from = "String")]
    pub assignment_created: Timestamp,
    #[sqlx(try_from = "String")]
    pub assignment_updated: Timestamp,
}

/// Request body for create and full update. Every field is optional here so
/// that a missing field turns into a 400 naming it.
#[derive(Debug, Default, Deserialize)]
pub struct AssignmentPayload {
    pub name: Option<String>,
    pub points: Option<i64>,
    pub number_of_attempts: Option<i64>,
    pub deadline: Option<String>,
}

/// The mutable fields of an assignment, already validated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssignmentDraft {
    pub name: String,
    pub points: i64,
    pub number_of_attempts: i64,
    pub deadline: Timestamp,
}

impl AssignmentPayload {
    pub fn validate(self) -> Result<AssignmentDraft, ApiError> {
        let name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("name is required"))?;

        let points = self
            .points
            .ok_or_else(|| ApiError::bad_request("points is required"))?;
        if !(MIN_POINTS..=MAX_POINTS).contains(&points) {
            return Err(ApiError::bad_request(format!(
                "points must be between {MIN_POINTS} and {MAX_POINTS}"
            )));
        }

        let number_of_attempts = self
            .number_of_attempts
            .ok_or_else(|| ApiError::bad_request("number_of_attempts is required"))?;
        if !(MIN_ATTEMPTS..=MAX_ATTEMPTS).contains(&number_of_attempts) {
            return Err(ApiError::bad_request(format!(
                "number_of_attempts must be between {MIN_ATTEMPTS} and {MAX_ATTEMPTS}"
            )));
        }

        let deadline = self
            .deadline
            .filter(|deadline| !deadline.is_empty())
            .ok_or_else(|| ApiError::bad_request("deadline is required"))?;
        let deadline = Timestamp::parse(&deadline).map_err(|_| {
            ApiError::bad_request("deadline must be formatted as YYYY-MM-DDTHH:MM:SS.ffffffZ")
        })?;

        Ok(AssignmentDraft {
            name,
            points,
            number_of_attempts,
            deadline,
        })
    }
}

impl Assignment {
    #[must_use]
    pub fn new(draft: AssignmentDraft, creator_id: String) -> Self {
        let now = Timestamp::now();

        Self {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            points: draft.points,
            number_of_attempts: draft.number_of_attempts,
            deadline: draft.deadline,
            creator_id,
            assignment_created: now,
            assignment_updated: now,
        }
    }

    #[must_use]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.creator_id == user_id
    }

    pub async fn all(db: &AnyPool) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {COLUMNS} FROM assignments ORDER BY assignment_created, id"
        ))
        .fetch_all(db)
        .await
    }

    pub async fn find(db: &AnyPool, id: &str) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!("SELECT {COLUMNS} FROM assignments WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn insert(&self, db: &AnyPool) -> sqlx::Result<()> {
        sqlx::query(&format!(
            "INSERT INTO assignments ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(&self.id)
        .bind(&self.name)
        .bind(self.points)
        .bind(self.number_of_attempts)
        .bind(self.deadline.to_string())
        .bind(&self.creator_id)
        .bind(self.assignment_created.to_string())
        .bind(self.assignment_updated.to_string())
        .execute(db)
        .await?;

        Ok(())
    }

    /// Replaces every mutable field and bumps `assignment_updated`.
    pub async fn replace(&mut self, db: &AnyPool, draft: AssignmentDraft) -> sqlx::Result<()> {
        self.name = draft.name;
        self.points = draft.points;
        self.number_of_attempts = draft.number_of_attempts;
        self.deadline = draft.deadline;
        self.assignment_updated = Timestamp::now();

        sqlx::query(
            "UPDATE assignments
            SET name = $1, points = $2, number_of_attempts = $3, deadline = $4, assignment_updated = $5
            WHERE id = $6",
        )
        .bind(&self.name)
        .bind(self.points)
        .bind(self.number_of_attempts)
        .bind(self.deadline.to_string())
        .bind(self.assignment_updated.to_string())
        .bind(&self.id)
        .execute(db)
        .await?;

        Ok(())
    }

    /// Deletes the assignment and its submissions in one transaction.
    /// Returns how many submissions went with it.
    pub async fn delete_with_submissions(db: &AnyPool, id: &str) -> sqlx::Result<u64> {
        let mut tx = db.begin().await?;

        let submissions = sqlx::query("DELETE FROM submissions WHERE assignment_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM assignments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(submissions)
    }
}
