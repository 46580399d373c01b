//! REST surface: status codes, identity header handling and problem responses.

mod common;

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use access_requests::api::rest::identity::IDENTITY_HEADER;
use access_requests::contract::model::Identity;
use common::{test_module, RecordingLauncher, ADMIN};

async fn app() -> (Router, Arc<RecordingLauncher>, db::DbHandle) {
    let (module, launcher, db) = test_module().await;
    (module.register_rest(Router::new()), launcher, db)
}

fn request(method: Method, uri: &str, caller: Option<Identity>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header(IDENTITY_HEADER, caller.to_string());
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn call(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn json_body(resp: Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn assert_problem(resp: &Response, status: StatusCode) {
    assert_eq!(resp.status(), status);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/problem+json"
    );
}

#[tokio::test]
async fn register_then_approve_over_http() {
    let (app, _, _db) = app().await;
    let user = Identity(42);

    let resp = call(&app, request(Method::POST, "/access-requests", Some(user), None)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(body["user_id"], 42);
    assert_eq!(body["outcome"], "submitted");

    let resp = call(&app, request(Method::POST, "/access-requests", Some(user), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["outcome"], "already_pending");

    let resp = call(
        &app,
        request(Method::GET, "/access-requests/pending", Some(ADMIN), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = json_body(resp).await;
    assert_eq!(page["items"], json!([42]));
    assert_eq!(page["total_count"], 1);
    assert_eq!(page["has_next"], false);

    let resp = call(
        &app,
        request(Method::POST, "/access-requests/42/approve", Some(ADMIN), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let decision = json_body(resp).await;
    assert_eq!(decision["outcome"], "applied");
    assert_eq!(decision["status"], "approved");

    let resp = call(&app, request(Method::GET, "/access-requests/42", Some(user), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let status = json_body(resp).await;
    assert_eq!(status["state"], "approved");
    assert_eq!(status["approved"], true);
    assert_eq!(status["pending"], false);

    let resp = call(
        &app,
        request(Method::GET, "/access-requests/42/history", Some(ADMIN), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let history = json_body(resp).await;
    assert_eq!(history.as_array().unwrap().len(), 2);
    assert_eq!(history[1]["pending"], true);
}

#[tokio::test]
async fn repeated_reject_reports_unchanged() {
    let (app, _, _db) = app().await;
    call(&app, request(Method::POST, "/access-requests", Some(Identity(5)), None)).await;

    let first = call(
        &app,
        request(Method::POST, "/access-requests/5/reject", Some(ADMIN), None),
    )
    .await;
    assert_eq!(json_body(first).await["outcome"], "applied");

    let second = call(
        &app,
        request(Method::POST, "/access-requests/5/reject", Some(ADMIN), None),
    )
    .await;
    assert_eq!(second.status(), StatusCode::OK);
    let body = json_body(second).await;
    assert_eq!(body["outcome"], "unchanged");
    assert_eq!(body["status"], "inactive");
}

#[tokio::test]
async fn unknown_user_status_is_reported_not_missing() {
    let (app, _, _db) = app().await;
    let resp = call(&app, request(Method::GET, "/access-requests/77", Some(ADMIN), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["state"], "unknown");
    assert_eq!(body["status_since"], Value::Null);
}

#[tokio::test]
async fn admin_routes_refuse_other_callers() {
    let (app, _, _db) = app().await;
    call(&app, request(Method::POST, "/access-requests", Some(Identity(5)), None)).await;

    for (method, uri) in [
        (Method::GET, "/access-requests/pending"),
        (Method::POST, "/access-requests/5/approve"),
        (Method::POST, "/access-requests/5/reject"),
        (Method::GET, "/access-requests/5/history"),
        (Method::GET, "/access-requests/6"),
    ] {
        let resp = call(&app, request(method, uri, Some(Identity(5)), None)).await;
        assert_problem(&resp, StatusCode::FORBIDDEN);
        let body = json_body(resp).await;
        assert_eq!(body["code"], "ACCESS_FORBIDDEN");
        assert_eq!(body["instance"], uri);
    }
}

#[tokio::test]
async fn deciding_unknown_user_is_not_found() {
    let (app, _, _db) = app().await;
    let resp = call(
        &app,
        request(Method::POST, "/access-requests/999/approve", Some(ADMIN), None),
    )
    .await;
    assert_problem(&resp, StatusCode::NOT_FOUND);
    assert_eq!(json_body(resp).await["code"], "ACCESS_NOT_FOUND");
}

#[tokio::test]
async fn identity_header_is_required_and_validated() {
    let (app, _, _db) = app().await;

    let resp = call(&app, request(Method::POST, "/access-requests", None, None)).await;
    assert_problem(&resp, StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["code"], "ACCESS_IDENTITY_MISSING");

    for bad in ["abc", "0", "-3"] {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/access-requests")
            .header(IDENTITY_HEADER, bad)
            .body(Body::empty())
            .unwrap();
        let resp = call(&app, req).await;
        assert_problem(&resp, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["code"], "ACCESS_IDENTITY_INVALID");
    }
}

#[tokio::test]
async fn invalid_page_is_a_validation_problem() {
    let (app, _, _db) = app().await;
    for uri in [
        "/access-requests/pending?page=0",
        "/access-requests/pending?page=1&page_size=0",
        "/access-requests/pending?page=1&page_size=1000",
    ] {
        let resp = call(&app, request(Method::GET, uri, Some(ADMIN), None)).await;
        assert_problem(&resp, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["code"], "ACCESS_VALIDATION");
    }
}

#[tokio::test]
async fn far_page_is_empty_not_an_error() {
    let (app, _, _db) = app().await;
    call(&app, request(Method::POST, "/access-requests", Some(Identity(42)), None)).await;

    let resp = call(
        &app,
        request(
            Method::GET,
            "/access-requests/pending?page=4611686018427387904",
            Some(ADMIN),
            None,
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = json_body(resp).await;
    assert_eq!(page["items"], json!([]));
    assert_eq!(page["total_count"], 1);
    assert_eq!(page["has_next"], false);
}

#[tokio::test]
async fn notifications_open_an_event_stream() {
    let (app, _, _db) = app().await;
    let resp = call(
        &app,
        request(Method::GET, "/chat/notifications?to=1000", None, None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/event-stream"
    );
}

#[tokio::test]
async fn downloads_require_approval_and_a_valid_link() {
    let (app, launcher, _db) = app().await;
    let user = Identity(42);
    let link = json!({ "url": "https://youtu.be/dQw4w9WgXcQ" });

    let resp = call(
        &app,
        request(Method::POST, "/downloads", Some(user), Some(link.clone())),
    )
    .await;
    assert_problem(&resp, StatusCode::FORBIDDEN);
    assert_eq!(json_body(resp).await["code"], "ACCESS_NOT_APPROVED");

    call(&app, request(Method::POST, "/access-requests", Some(user), None)).await;
    call(
        &app,
        request(Method::POST, "/access-requests/42/approve", Some(ADMIN), None),
    )
    .await;

    let resp = call(
        &app,
        request(
            Method::POST,
            "/downloads",
            Some(user),
            Some(json!({ "url": "https://example.com/video" })),
        ),
    )
    .await;
    assert_problem(&resp, StatusCode::BAD_REQUEST);

    let resp = call(&app, request(Method::POST, "/downloads", Some(user), Some(link))).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    assert_eq!(
        launcher.calls(),
        vec![("https://youtu.be/dQw4w9WgXcQ".to_owned(), user)]
    );
}

#[tokio::test]
async fn chat_updates_return_bot_replies() {
    let (app, _, _db) = app().await;

    let resp = call(
        &app,
        request(
            Method::POST,
            "/chat/updates",
            None,
            Some(json!({ "sender": 42, "text": "/start" })),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let replies = json_body(resp).await;
    assert_eq!(replies[0]["to"], 42);
    assert_eq!(
        replies[0]["text"],
        access_requests::bot::reply::REQUEST_SENT
    );

    let resp = call(
        &app,
        request(
            Method::POST,
            "/chat/updates",
            None,
            Some(json!({ "sender": 1000, "callback_data": "admin:list_requests" })),
        ),
    )
    .await;
    let replies = json_body(resp).await;
    let keyboard = replies[0]["keyboard"].as_array().unwrap();
    assert_eq!(keyboard[0][0]["url"], "tg://user?id=42");
    assert_eq!(keyboard[1][0]["callback_data"], "admin:approve:42");
}

#[tokio::test]
async fn chat_update_needs_exactly_one_payload() {
    let (app, _, _db) = app().await;
    for body in [
        json!({ "sender": 42 }),
        json!({ "sender": 42, "text": "/start", "callback_data": "user:download" }),
    ] {
        let resp = call(
            &app,
            request(Method::POST, "/chat/updates", None, Some(body)),
        )
        .await;
        assert_problem(&resp, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["code"], "CHAT_UPDATE_INVALID");
    }
}
