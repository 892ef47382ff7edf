//! Integration tests: drive the full router (guard, handlers, store) against
//! an in-memory SQLite database.

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use board_api::token::TokenService;
use board_api::{AppStateInner, router};
use board_db::Database;

const SECRET: &str = "integration-secret";

fn app() -> Router {
    let db = Database::open_in_memory().unwrap();
    router(AppStateInner::new(db, TokenService::new(SECRET, 1).unwrap()))
}

struct Reply {
    status: StatusCode,
    body: Value,
    set_cookie: Option<String>,
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    Reply {
        status,
        body,
        set_cookie,
    }
}

async fn register(app: &Router, nickname: &str, password: &str) -> Reply {
    send(
        app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({
            "nickname": nickname,
            "password": password,
            "confirmPassword": password,
        })),
    )
    .await
}

/// Register and log in; returns the `name=value` pair to send as `Cookie`.
async fn login_as(app: &Router, nickname: &str) -> String {
    let password = "pass1234";
    let reply = register(app, nickname, password).await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);

    let reply = send(
        app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "nickname": nickname, "password": password })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);

    let set_cookie = reply.set_cookie.expect("login sets a cookie");
    set_cookie.split(';').next().unwrap().trim().to_string()
}

async fn create_post(app: &Router, cookie: &str, title: &str) -> i64 {
    let reply = send(
        app,
        Method::POST,
        "/api/posts",
        Some(cookie),
        Some(json!({ "title": title, "content": format!("{title} body") })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    reply.body["postId"].as_i64().unwrap()
}

fn message(reply: &Reply) -> &str {
    reply.body["message"].as_str().unwrap_or_default()
}

// -- Registration --

#[tokio::test]
async fn register_once_then_duplicate() {
    let app = app();

    let first = register(&app, "alice", "pass1234").await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert!(first.body["userId"].as_i64().is_some());

    let second = register(&app, "alice", "other999").await;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(message(&second), "duplicate nickname");
}

#[tokio::test]
async fn register_rejections_follow_check_order() {
    let app = app();
    let cases = [
        (json!({"nickname": "a!", "password": "x", "confirmPassword": "y"}), "invalid nickname format"),
        (json!({"nickname": "alice", "password": "ab", "confirmPassword": "abc"}), "passwords do not match"),
        (json!({"nickname": "alice", "password": "abc", "confirmPassword": "abc"}), "invalid password format"),
        (
            json!({"nickname": "Alice", "password": "xAlicex1", "confirmPassword": "xAlicex1"}),
            "password contains nickname",
        ),
    ];

    for (body, expected) in cases {
        let reply = send(&app, Method::POST, "/api/users", None, Some(body)).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(message(&reply), expected);
    }

    // Nothing was stored by the rejected attempts.
    assert_eq!(register(&app, "alice", "pass1234").await.status, StatusCode::CREATED);
}

#[tokio::test]
async fn malformed_body_gets_json_message() {
    let app = app();
    let reply = send(
        &app,
        Method::POST,
        "/api/users",
        None,
        Some(json!({ "nickname": "alice" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(!message(&reply).is_empty());
}

// -- Login --

#[tokio::test]
async fn login_cookie_carries_verifiable_token() {
    let app = app();
    let reply = register(&app, "alice", "pass1234").await;
    let user_id = reply.body["userId"].as_i64().unwrap();

    let reply = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "nickname": "alice", "password": "pass1234" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);

    let set_cookie = reply.set_cookie.unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    let value = set_cookie
        .split(';')
        .next()
        .unwrap()
        .strip_prefix("authorization=")
        .unwrap();
    let token = value
        .strip_prefix("Bearer%20")
        .or_else(|| value.strip_prefix("Bearer "))
        .unwrap();

    let claims = TokenService::new(SECRET, 1).unwrap().verify(token).unwrap();
    assert_eq!(claims.sub, user_id);
    assert_eq!(claims.nickname, "alice");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = app();
    register(&app, "alice", "pass1234").await;

    let wrong_password = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "nickname": "alice", "password": "nope1234" })),
    )
    .await;
    let unknown_user = send(
        &app,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "nickname": "mallory", "password": "pass1234" })),
    )
    .await;

    assert_eq!(wrong_password.status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(unknown_user.status, StatusCode::PRECONDITION_FAILED);
    assert_eq!(wrong_password.body, unknown_user.body);
    assert!(wrong_password.set_cookie.is_none());
}

#[tokio::test]
async fn logout_expires_cookie() {
    let app = app();
    let cookie = login_as(&app, "alice").await;

    let reply = send(&app, Method::POST, "/api/logout", Some(&cookie), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let set_cookie = reply.set_cookie.unwrap();
    assert!(set_cookie.starts_with("authorization="));
    assert!(set_cookie.contains("Max-Age=0"));
}

// -- Auth guard --

#[tokio::test]
async fn protected_routes_need_a_valid_cookie() {
    let app = app();
    let body = json!({ "title": "t", "content": "c" });

    let missing = send(&app, Method::POST, "/api/posts", None, Some(body.clone())).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let garbage = send(
        &app,
        Method::POST,
        "/api/posts",
        Some("authorization=Bearer%20not.a.token"),
        Some(body.clone()),
    )
    .await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);

    let forged = TokenService::new("someone-else", 1).unwrap().issue(1, "alice").unwrap();
    let forged_cookie = format!("authorization=Bearer%20{forged}");
    let forged = send(&app, Method::POST, "/api/posts", Some(&forged_cookie), Some(body)).await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);

    let listed = send(&app, Method::GET, "/api/posts", None, None).await;
    assert_eq!(listed.body["data"], json!([]));
}

// -- Posts --

#[tokio::test]
async fn posts_list_in_reverse_insertion_order() {
    let app = app();
    let cookie = login_as(&app, "alice").await;

    let mut ids = Vec::new();
    for i in 0..5 {
        ids.push(create_post(&app, &cookie, &format!("post {i}")).await);
    }

    let reply = send(&app, Method::GET, "/api/posts", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let listed: Vec<i64> = reply.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["postId"].as_i64().unwrap())
        .collect();
    ids.reverse();
    assert_eq!(listed, ids);
    assert_eq!(reply.body["data"][0]["nickname"], "alice");
}

#[tokio::test]
async fn get_post_includes_author_nickname() {
    let app = app();
    let cookie = login_as(&app, "alice").await;
    let post_id = create_post(&app, &cookie, "hello").await;

    let reply = send(&app, Method::GET, &format!("/api/posts/{post_id}"), None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["nickname"], "alice");
    assert_eq!(reply.body["data"]["content"], "hello body");

    let missing = send(&app, Method::GET, "/api/posts/999", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let bad_id = send(&app, Method::GET, "/api/posts/abc", None, None).await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
    assert!(!message(&bad_id).is_empty());
}

#[tokio::test]
async fn blank_post_fields_are_rejected() {
    let app = app();
    let cookie = login_as(&app, "alice").await;

    let reply = send(
        &app,
        Method::POST,
        "/api/posts",
        Some(&cookie),
        Some(json!({ "title": "  ", "content": "c" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_owner_gets_forbidden_never_not_found() {
    let app = app();
    let alice = login_as(&app, "alice").await;
    let bob = login_as(&app, "bob").await;
    let post_id = create_post(&app, &alice, "mine").await;
    let uri = format!("/api/posts/{post_id}");

    // Ownership is checked before the body, so even a blank update is 403.
    let update = send(
        &app,
        Method::PUT,
        &uri,
        Some(&bob),
        Some(json!({ "title": "", "content": "" })),
    )
    .await;
    assert_eq!(update.status, StatusCode::FORBIDDEN);

    let delete = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(delete.status, StatusCode::FORBIDDEN);

    let still_there = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(still_there.body["data"]["title"], "mine");
}

#[tokio::test]
async fn missing_post_is_not_found_for_everyone() {
    let app = app();
    let alice = login_as(&app, "alice").await;
    let bob = login_as(&app, "bob").await;
    create_post(&app, &alice, "exists").await;

    for cookie in [&alice, &bob] {
        let update = send(
            &app,
            Method::PUT,
            "/api/posts/4242",
            Some(cookie),
            Some(json!({ "title": "t", "content": "c" })),
        )
        .await;
        assert_eq!(update.status, StatusCode::NOT_FOUND);

        let delete = send(&app, Method::DELETE, "/api/posts/4242", Some(cookie), None).await;
        assert_eq!(delete.status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn ownership_is_decided_before_the_body_is_read() {
    let app = app();
    let alice = login_as(&app, "alice").await;
    let bob = login_as(&app, "bob").await;
    let post_id = create_post(&app, &alice, "mine").await;

    let partial = send(
        &app,
        Method::PUT,
        &format!("/api/posts/{post_id}"),
        Some(&bob),
        Some(json!({ "title": "t" })),
    )
    .await;
    assert_eq!(partial.status, StatusCode::FORBIDDEN);

    let empty = send(&app, Method::PUT, "/api/posts/4242", Some(&alice), Some(json!({}))).await;
    assert_eq!(empty.status, StatusCode::NOT_FOUND);

    let unknown_field = send(
        &app,
        Method::PUT,
        &format!("/api/posts/{post_id}/comments/999"),
        Some(&bob),
        Some(json!({ "text": "x" })),
    )
    .await;
    assert_eq!(unknown_field.status, StatusCode::NOT_FOUND);

    // The owner still gets the body error.
    let own_partial = send(
        &app,
        Method::PUT,
        &format!("/api/posts/{post_id}"),
        Some(&alice),
        Some(json!({ "title": "t" })),
    )
    .await;
    assert_eq!(own_partial.status, StatusCode::BAD_REQUEST);
    assert!(!message(&own_partial).is_empty());
}

#[tokio::test]
async fn owner_blank_update_is_bad_request() {
    let app = app();
    let alice = login_as(&app, "alice").await;
    let post_id = create_post(&app, &alice, "mine").await;

    let reply = send(
        &app,
        Method::PUT,
        &format!("/api/posts/{post_id}"),
        Some(&alice),
        Some(json!({ "title": "ok", "content": " " })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleting_post_removes_its_comments() {
    let app = app();
    let alice = login_as(&app, "alice").await;
    let post_id = create_post(&app, &alice, "short-lived").await;
    let comments_uri = format!("/api/posts/{post_id}/comments");

    send(&app, Method::POST, &comments_uri, Some(&alice), Some(json!({ "comment": "hi" }))).await;

    let reply = send(&app, Method::DELETE, &format!("/api/posts/{post_id}"), Some(&alice), None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["postId"], post_id);

    let comments = send(&app, Method::GET, &comments_uri, None, None).await;
    assert_eq!(comments.status, StatusCode::NOT_FOUND);
}

// -- Comments --

#[tokio::test]
async fn comment_owner_is_the_caller() {
    let app = app();
    let alice = login_as(&app, "alice").await;
    let bob = login_as(&app, "bob").await;
    let post_id = create_post(&app, &alice, "topic").await;
    let uri = format!("/api/posts/{post_id}/comments");

    let blank = send(&app, Method::POST, &uri, Some(&bob), Some(json!({ "comment": "   " }))).await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);

    // A client cannot name the owner.
    let spoofed = send(
        &app,
        Method::POST,
        &uri,
        Some(&bob),
        Some(json!({ "comment": "hi", "userId": 1 })),
    )
    .await;
    assert_eq!(spoofed.status, StatusCode::BAD_REQUEST);

    let created = send(&app, Method::POST, &uri, Some(&bob), Some(json!({ "comment": "hi" }))).await;
    assert_eq!(created.status, StatusCode::CREATED);

    let listed = send(&app, Method::GET, &uri, None, None).await;
    let comments = listed.body["data"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["nickname"], "bob");
    assert_eq!(comments[0]["commentId"], created.body["commentId"]);

    let post = send(&app, Method::GET, &format!("/api/posts/{post_id}"), None, None).await;
    assert_ne!(comments[0]["userId"], post.body["data"]["userId"]);
}

#[tokio::test]
async fn comment_on_missing_post_is_not_found() {
    let app = app();
    let alice = login_as(&app, "alice").await;

    let reply = send(
        &app,
        Method::POST,
        "/api/posts/77/comments",
        Some(&alice),
        Some(json!({ "comment": "hello?" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comment_mutations_are_owner_only() {
    let app = app();
    let alice = login_as(&app, "alice").await;
    let bob = login_as(&app, "bob").await;
    let post_id = create_post(&app, &alice, "topic").await;
    let other_post = create_post(&app, &alice, "elsewhere").await;

    let created = send(
        &app,
        Method::POST,
        &format!("/api/posts/{post_id}/comments"),
        Some(&bob),
        Some(json!({ "comment": "first" })),
    )
    .await;
    let comment_id = created.body["commentId"].as_i64().unwrap();
    let uri = format!("/api/posts/{post_id}/comments/{comment_id}");

    let by_alice = send(&app, Method::PUT, &uri, Some(&alice), Some(json!({ "comment": "x" }))).await;
    assert_eq!(by_alice.status, StatusCode::FORBIDDEN);

    let wrong_post = send(
        &app,
        Method::PUT,
        &format!("/api/posts/{other_post}/comments/{comment_id}"),
        Some(&bob),
        Some(json!({ "comment": "x" })),
    )
    .await;
    assert_eq!(wrong_post.status, StatusCode::NOT_FOUND);

    let blank = send(&app, Method::PUT, &uri, Some(&bob), Some(json!({ "comment": "" }))).await;
    assert_eq!(blank.status, StatusCode::BAD_REQUEST);

    let edited = send(&app, Method::PUT, &uri, Some(&bob), Some(json!({ "comment": "edited" }))).await;
    assert_eq!(edited.status, StatusCode::OK);

    let listed = send(&app, Method::GET, &format!("/api/posts/{post_id}/comments"), None, None).await;
    assert_eq!(listed.body["data"][0]["comment"], "edited");

    let delete_by_alice = send(&app, Method::DELETE, &uri, Some(&alice), None).await;
    assert_eq!(delete_by_alice.status, StatusCode::FORBIDDEN);

    let deleted = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(deleted.status, StatusCode::OK);

    let again = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

// -- End to end --

#[tokio::test]
async fn owner_edit_flow() {
    let app = app();
    let alice = login_as(&app, "alice").await;
    let bob = login_as(&app, "bob").await;
    let post_id = create_post(&app, &alice, "draft").await;
    let uri = format!("/api/posts/{post_id}");
    let update = json!({ "title": "final", "content": "final body" });

    let by_bob = send(&app, Method::PUT, &uri, Some(&bob), Some(update.clone())).await;
    assert_eq!(by_bob.status, StatusCode::FORBIDDEN);

    let by_alice = send(&app, Method::PUT, &uri, Some(&alice), Some(update)).await;
    assert_eq!(by_alice.status, StatusCode::OK);
    assert_eq!(by_alice.body["postId"], post_id);

    let fetched = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(fetched.body["data"]["title"], "final");
    assert_eq!(fetched.body["data"]["content"], "final body");
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app();
    let reply = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "ok");
}
