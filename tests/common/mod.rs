#![allow(dead_code)]

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes, to_bytes},
    http::{
        HeaderMap, Method, Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
};
use base64::{Engine, prelude::BASE64_STANDARD};
use coursework::{
    AppState,
    models::User,
    notify::{Notifier, PublishError, Publisher, SubmissionNotice},
    password::hash_password,
};
use serde_json::{Value, json};
use sqlx::{AnyPool, any::AnyPoolOptions};
use tokio::sync::mpsc;
use tower::ServiceExt;

pub const ALICE: (&str, &str) = ("alice@example.com", "Passw0rd!");
pub const BOB: (&str, &str) = ("bob@example.com", "S3cret(pw");

pub const FAR_DEADLINE: &str = "2099-01-01T00:00:00.000000Z";
pub const PAST_DEADLINE: &str = "2000-01-01T00:00:00.000000Z";

pub struct TestApp {
    pub app: Router,
    pub db: AnyPool,
    pub notices: mpsc::UnboundedReceiver<SubmissionNotice>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn error(&self) -> String {
        self.json()["error"].as_str().unwrap().to_owned()
    }
}

pub struct Recording(pub mpsc::UnboundedSender<SubmissionNotice>);

#[async_trait]
impl Publisher for Recording {
    async fn publish(&self, notice: &SubmissionNotice) -> Result<(), PublishError> {
        let _ = self.0.send(notice.clone());
        Ok(())
    }
}

/// Single connection so every query sees the same in-memory database.
pub async fn memory_pool() -> AnyPool {
    let options = AnyPoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None);

    coursework::connect("sqlite::memory:", options)
        .await
        .unwrap()
}

/// File-backed database shared by `connections` pooled connections.
pub async fn file_pool(path: &Path, connections: u32) -> AnyPool {
    let options = AnyPoolOptions::new().max_connections(connections);
    let url = format!("sqlite://{}?mode=rwc", path.display());

    coursework::connect(&url, options).await.unwrap()
}

pub async fn add_user(db: &AnyPool, (email, password): (&str, &str)) -> User {
    let user = User::new(
        "Test".to_owned(),
        "User".to_owned(),
        email.to_owned(),
        hash_password(password).unwrap(),
    );
    user.insert(db).await.unwrap();
    user
}

pub async fn spawn_app_with(publisher: Arc<dyn Publisher>) -> (Router, AnyPool) {
    let db = memory_pool().await;
    let app = spawn_app_on(db.clone(), publisher).await;

    (app, db)
}

/// Registers Alice and Bob in `db` and builds the router over it.
pub async fn spawn_app_on(db: AnyPool, publisher: Arc<dyn Publisher>) -> Router {
    add_user(&db, ALICE).await;
    add_user(&db, BOB).await;

    let notifier = Notifier::new(publisher).with_retries(0, std::time::Duration::ZERO);
    coursework::app(AppState::new(db, notifier))
}

/// App with Alice and Bob registered and a publisher recording every notice.
pub async fn spawn_app() -> TestApp {
    let (tx, notices) = mpsc::unbounded_channel();
    let (app, db) = spawn_app_with(Arc::new(Recording(tx))).await;

    TestApp { app, db, notices }
}

pub fn basic((email, password): (&str, &str)) -> String {
    format!(
        "Basic {}",
        BASE64_STANDARD.encode(format!("{email}:{password}"))
    )
}

pub async fn send_request(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    auth: Option<(&str, &str)>,
    body: Option<Value>,
) -> TestResponse {
    let mut request = Request::builder().method(method).uri(uri);

    if let Some(credentials) = auth {
        request = request.header(AUTHORIZATION, basic(credentials));
    }

    let body = match body {
        Some(json) => {
            request = request.header(CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    send_request(app, request.body(body).unwrap()).await
}

pub fn assignment_body(points: i64, attempts: i64, deadline: &str) -> Value {
    json!({
        "name": "HW1",
        "points": points,
        "number_of_attempts": attempts,
        "deadline": deadline,
    })
}

/// Creates an assignment as `owner` and returns its id.
pub async fn create_assignment(
    app: &Router,
    owner: (&str, &str),
    attempts: i64,
    deadline: &str,
) -> String {
    let response = send(
        app,
        Method::POST,
        "/v1/assignments",
        Some(owner),
        Some(assignment_body(50, attempts, deadline)),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED);

    response.json()["id"].as_str().unwrap().to_owned()
}

pub async fn submit(app: &Router, who: (&str, &str), assignment_id: &str, url: &str) -> TestResponse {
    send(
        app,
        Method::POST,
        &format!("/v1/assignments/{assignment_id}/submission"),
        Some(who),
        Some(json!({ "submission_url": url })),
    )
    .await
}
