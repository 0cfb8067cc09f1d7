use sqlx::AnyPool;
use uuid::Uuid;

use crate::timestamp::Timestamp;

/// Account record. Never serialized to clients; the password only exists
/// as an argon2 hash.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct User {
    pub id: String,

    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,

    #[sqlx(try_from = "String")]
    pub account_created: Timestamp,
    #[sqlx(try_from = "String")]
    pub account_updated: Timestamp,
}

impl User {
    #[must_use]
    pub fn new(first_name: String, last_name: String, email: String, password_hash: String) -> Self {
        let now = Timestamp::now();

        Self {
            id: Uuid::new_v4().to_string(),
            first_name,
            last_name,
            email,
            password_hash,
            account_created: now,
            account_updated: now,
        }
    }

    pub async fn find_by_email(db: &AnyPool, email: &str) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT id, first_name, last_name, email, password_hash, account_created, account_updated
            FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn insert(&self, db: &AnyPool) -> sqlx::Result<()> {
        sqlx::query(
            "INSERT INTO users (id, first_name, last_name, email, password_hash, account_created, account_updated)
            VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&self.id)
        .bind(&self.first_name)
        .bind(&self.last_name)
        .bind(&self.email)
        .bind(&self.password_hash)
        .bind(self.account_created.to_string())
        .bind(self.account_updated.to_string())
        .execute(db)
        .await?;

        Ok(())
    }
}
