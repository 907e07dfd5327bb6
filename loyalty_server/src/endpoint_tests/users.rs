use actix_web::{http::StatusCode, test::TestRequest};
use loyalty_engine::{LedgerRepository, MemoryDatabase};
use serde_json::json;

use super::helpers::{get_auth_config, send};
use crate::auth::TokenIssuer;

fn credentials(login: &str, password: &str) -> serde_json::Value {
    json!({ "login": login, "password": password })
}

#[actix_web::test]
async fn health_check() {
    let db = MemoryDatabase::new();
    let res = send(&db, TestRequest::get().uri("/health")).await;
    assert_eq!(res.status, StatusCode::OK);
}

#[actix_web::test]
async fn register_issues_a_bearer_token() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let req = TestRequest::post().uri("/api/user/register").set_json(credentials("alice", "s3cret"));
    let res = send(&db, req).await;
    assert_eq!(res.status, StatusCode::OK);

    let header = res.headers.get("Authorization").expect("No Authorization header").to_str().unwrap();
    let token = header.strip_prefix("Bearer ").expect("Not a bearer token");
    let claims = TokenIssuer::new(&get_auth_config()).validate_token(token).unwrap();
    let user = db.find_user_by_login("alice").await.unwrap();
    assert_eq!(claims.sub, user.id);
    assert_ne!(user.password, "s3cret");
}

#[actix_web::test]
async fn register_rejects_taken_logins() {
    let db = MemoryDatabase::new();
    let req = || TestRequest::post().uri("/api/user/register").set_json(credentials("alice", "s3cret"));
    assert_eq!(send(&db, req()).await.status, StatusCode::OK);
    let res = send(&db, req()).await;
    assert_eq!(res.status, StatusCode::CONFLICT);
    assert_eq!(res.body, r#"{"error":"This login is already taken"}"#);
}

#[actix_web::test]
async fn register_rejects_bad_requests() {
    let db = MemoryDatabase::new();
    let req = TestRequest::post()
        .uri("/api/user/register")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{ not json");
    assert_eq!(send(&db, req).await.status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post().uri("/api/user/register").set_json(credentials("  ", "s3cret"));
    assert_eq!(send(&db, req).await.status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post().uri("/api/user/register").set_json(credentials("bob", ""));
    assert_eq!(send(&db, req).await.status, StatusCode::BAD_REQUEST);

    let req = TestRequest::post().uri("/api/user/register").set_json(json!({ "login": "bob" }));
    assert_eq!(send(&db, req).await.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn login_checks_credentials() {
    let db = MemoryDatabase::new();
    let req = TestRequest::post().uri("/api/user/register").set_json(credentials("alice", "s3cret"));
    assert_eq!(send(&db, req).await.status, StatusCode::OK);

    let req = TestRequest::post().uri("/api/user/login").set_json(credentials("alice", "s3cret"));
    let res = send(&db, req).await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.headers.get("Authorization").unwrap().to_str().unwrap().starts_with("Bearer "));

    let req = TestRequest::post().uri("/api/user/login").set_json(credentials("alice", "wrong"));
    let res = send(&db, req).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(res.headers.get("Authorization").is_none());

    let req = TestRequest::post().uri("/api/user/login").set_json(credentials("nobody", "s3cret"));
    assert_eq!(send(&db, req).await.status, StatusCode::UNAUTHORIZED);
}
