#![deny(
    clippy::as_conversions,
    clippy::expect_used,
    clippy::future_not_send,
    clippy::indexing_slicing,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::pedantic,
    clippy::string_slice,
    clippy::todo,
    clippy::unwrap_used,
    unsafe_code
)]
#![allow(
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::multiple_crate_versions
)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::Router;
use sqlx::{AnyPool, any::AnyPoolOptions};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::notify::{LogPublisher, Notifier, Publisher, WebhookPublisher};

pub use args::{Command, CourseworkArgs, DatabaseArgs, MissingSetting, ServeArgs};
pub use state::AppState;
pub use timestamp::Timestamp;

/// How long shutdown waits for submission notices still being published.
pub const NOTICE_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

mod args;
pub mod auth;
pub mod error;
pub mod models;
pub mod notify;
pub mod password;
pub mod response;
mod routes;
pub mod seed;
mod state;
pub mod timestamp;
pub mod validation;

/// Connects and applies the bundled schema. `postgres://` URLs are used in
/// deployment, `sqlite:` URLs for local runs and tests.
pub async fn connect(url: &str, options: AnyPoolOptions) -> Result<AnyPool, sqlx::Error> {
    sqlx::any::install_default_drivers();

    let db_pool = options.connect(url).await?;
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    Ok(db_pool)
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::assignment::router())
        .merge(routes::submission::router())
        .fallback(routes::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn notifier(args: &ServeArgs) -> Result<Notifier, reqwest::Error> {
    let publisher: Arc<dyn Publisher> = match &args.notify_url {
        Some(url) => Arc::new(WebhookPublisher::new(url.clone())?),
        None => Arc::new(LogPublisher),
    };

    Ok(Notifier::new(publisher).with_retries(args.notify_retries, args.notify_backoff()))
}

/// Serves until Ctrl-C, then waits for pending submission notices. The pool
/// stays open; the caller closes it.
pub async fn serve(args: &ServeArgs, db_pool: AnyPool) -> anyhow::Result<()> {
    let notifier = notifier(args).context("building notification publisher")?;
    let app = app(AppState::new(db_pool, notifier.clone()));

    let addr = SocketAddr::new(args.bind, args.port);
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    notifier.drain(NOTICE_DRAIN_TIMEOUT).await;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for Ctrl-C, shutting down");
    }
}
