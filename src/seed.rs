//! Explicit user import, run through the `seed` subcommand.

use std::{fs::File, io::Read, path::Path};

use anyhow::Context;
use serde::Deserialize;
use sqlx::AnyPool;

use crate::{
    models::User,
    password::hash_password,
    validation::{validate_email, validate_password},
};

#[derive(Debug, Deserialize)]
struct SeedRow {
    first_name: String,
    last_name: String,
    email: String,
    password: String,
}

impl SeedRow {
    fn is_acceptable(&self) -> bool {
        validate_email(&self.email)
            && validate_password(&self.password)
            && !self.first_name.is_empty()
            && !self.last_name.is_empty()
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub existing: usize,
    pub rejected: usize,
}

pub async fn seed_users_from_path(db: &AnyPool, path: &Path) -> anyhow::Result<SeedReport> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;

    seed_users(db, file).await
}

/// Inserts every acceptable row whose email is not taken yet. Rows failing
/// the credential rules or with empty names are skipped and counted.
pub async fn seed_users<R: Read + Send>(db: &AnyPool, reader: R) -> anyhow::Result<SeedReport> {
    let mut records = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut report = SeedReport::default();

    for (index, row) in records.deserialize::<SeedRow>().enumerate() {
        let row = row.with_context(|| format!("reading CSV record {}", index + 1))?;

        if !row.is_acceptable() {
            tracing::warn!(record = index + 1, email = %row.email, "skipping invalid user record");
            report.rejected += 1;
            continue;
        }

        if User::find_by_email(db, &row.email).await?.is_some() {
            report.existing += 1;
            continue;
        }

        let password_hash = hash_password(&row.password)
            .map_err(|err| anyhow::anyhow!("hashing password for {}: {err}", row.email))?;

        User::new(row.first_name, row.last_name, row.email, password_hash)
            .insert(db)
            .await?;
        report.inserted += 1;
    }

    Ok(report)
}
