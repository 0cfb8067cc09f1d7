#![deny(
    clippy::expect_used,
    clippy::future_not_send,
    clippy::pedantic,
    clippy::as_conversions,
    clippy::unwrap_used,
    unsafe_code
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

use anyhow::Context;
use clap::Parser;
use coursework::{Command, CourseworkArgs, seed};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(err) = dotenvy::dotenv() {
        if !err.not_found() {
            return Err(err).context("loading .env");
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CourseworkArgs::parse();

    let url = args.database.connection_url()?;
    let db_pool = coursework::connect(&url, args.database.pool_options())
        .await
        .context("connecting to the database")?;

    let result = match args.command {
        Some(Command::Seed { csv }) => seed::seed_users_from_path(&db_pool, &csv)
            .await
            .map(|report| {
                tracing::info!(
                    inserted = report.inserted,
                    existing = report.existing,
                    rejected = report.rejected,
                    "users seeded"
                );
            }),
        None => coursework::serve(&args.serve, db_pool.clone()).await,
    };

    db_pool.close().await;
    result
}
