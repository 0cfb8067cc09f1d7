mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::{send, send_request, spawn_app};

#[tokio::test]
async fn healthy_database_returns_empty_ok() {
    let test = spawn_app().await;

    let response = send(&test.app, Method::GET, "/healthz", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.is_empty());
    assert_eq!(
        response.headers["cache-control"],
        "no-cache, no-store, must-revalidate"
    );
    assert_eq!(response.headers["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn query_string_is_rejected() {
    let test = spawn_app().await;

    let response = send(&test.app, Method::GET, "/healthz?probe=1", None, None).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn body_is_rejected() {
    let test = spawn_app().await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/healthz")
        .body(Body::from("ping"))
        .unwrap();
    let response = send_request(&test.app, request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error(), "Request body must be empty");
}

#[tokio::test]
async fn unreachable_database_is_unavailable() {
    let test = spawn_app().await;
    test.db.close().await;

    let response = send(&test.app, Method::GET, "/healthz", None, None).await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn unknown_route_uses_formatter() {
    let test = spawn_app().await;

    let response = send(&test.app, Method::GET, "/v2/nothing", None, None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers["cache-control"],
        "no-cache, no-store, must-revalidate"
    );
}
