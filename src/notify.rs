//! Submission notices published to an external collaborator.
//!
//! Handlers never wait on delivery: [`Notifier::dispatch`] moves the publish
//! loop onto its own task, retries with exponential backoff and only logs
//! the final failure. [`Notifier::drain`] lets shutdown wait for deliveries
//! still in flight.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinSet;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionNotice {
    pub submission_url: String,
    pub email: String,
    pub assignment_id: String,
    pub assignment_name: String,
    /// Submissions the caller had made before this one.
    pub num_attempts: i64,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("publish request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("publisher answered with status {0}")]
    Rejected(StatusCode),
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, notice: &SubmissionNotice) -> Result<(), PublishError>;
}

/// Posts each notice as JSON to a fixed URL.
#[derive(Clone, Debug)]
pub struct WebhookPublisher {
    client: Client,
    url: Url,
}

impl WebhookPublisher {
    pub fn new(url: Url) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl Publisher for WebhookPublisher {
    async fn publish(&self, notice: &SubmissionNotice) -> Result<(), PublishError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(notice)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(PublishError::Rejected(status))
        }
    }
}

/// Records notices in the log only.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    async fn publish(&self, notice: &SubmissionNotice) -> Result<(), PublishError> {
        tracing::info!(
            assignment_id = %notice.assignment_id,
            assignment_name = %notice.assignment_name,
            email = %notice.email,
            submission_url = %notice.submission_url,
            num_attempts = notice.num_attempts,
            "submission notice"
        );
        Ok(())
    }
}

#[derive(Clone)]
pub struct Notifier {
    publisher: Arc<dyn Publisher>,
    max_retries: u32,
    backoff: Duration,
    in_flight: Arc<Mutex<JoinSet<()>>>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("max_retries", &self.max_retries)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl Notifier {
    pub const DEFAULT_RETRIES: u32 = 3;
    pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(200);

    pub fn new(publisher: Arc<dyn Publisher>) -> Self {
        Self {
            publisher,
            max_retries: Self::DEFAULT_RETRIES,
            backoff: Self::DEFAULT_BACKOFF,
            in_flight: Arc::default(),
        }
    }

    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff = backoff;
        self
    }

    pub fn dispatch(&self, notice: SubmissionNotice) {
        let mut in_flight = self.in_flight();
        while in_flight.try_join_next().is_some() {}

        in_flight.spawn(Self::deliver(
            Arc::clone(&self.publisher),
            notice,
            self.max_retries,
            self.backoff,
        ));
    }

    /// Waits up to `timeout` for dispatched notices to finish and aborts the
    /// rest. Returns how many were abandoned.
    pub async fn drain(&self, timeout: Duration) -> usize {
        let mut pending = std::mem::take(&mut *self.in_flight());
        if pending.is_empty() {
            return 0;
        }

        tracing::info!(pending = pending.len(), "waiting for submission notices");
        let finished = tokio::time::timeout(timeout, async {
            while pending.join_next().await.is_some() {}
        })
        .await;

        if finished.is_ok() {
            return 0;
        }

        let abandoned = pending.len();
        tracing::error!(abandoned, ?timeout, "abandoning undelivered submission notices");
        pending.abort_all();
        abandoned
    }

    fn in_flight(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn deliver(
        publisher: Arc<dyn Publisher>,
        notice: SubmissionNotice,
        max_retries: u32,
        backoff: Duration,
    ) {
        let mut retries = 0;

        loop {
            match publisher.publish(&notice).await {
                Ok(()) => {
                    tracing::debug!(assignment_id = %notice.assignment_id, retries, "notice published");
                    return;
                }
                Err(err) if retries < max_retries => {
                    let delay = backoff.saturating_mul(2_u32.saturating_pow(retries));
                    retries += 1;
                    tracing::warn!(
                        error = %err,
                        assignment_id = %notice.assignment_id,
                        retry = retries,
                        ?delay,
                        "publishing notice failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    tracing::error!(
                        error = %err,
                        assignment_id = %notice.assignment_id,
                        email = %notice.email,
                        "giving up on submission notice"
                    );
                    return;
                }
            }
        }
    }
}
