use actix_web::{http::StatusCode, test::TestRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use loyalty_engine::{
    db_types::{OrderStatusType, Points},
    LedgerRepository,
    MemoryDatabase,
};
use serde_json::Value;

use super::helpers::{authed, send, signed_in_user};
use crate::auth::JwtClaims;

fn upload(number: &str, auth: &str) -> TestRequest {
    authed(TestRequest::post().uri("/api/user/orders"), auth).set_payload(number.to_string())
}

#[actix_web::test]
async fn orders_need_an_access_token() {
    let db = MemoryDatabase::new();
    let res = send(&db, TestRequest::post().uri("/api/user/orders").set_payload("12345678903")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = send(&db, upload("12345678903", "Bearer not.a.token")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = send(&db, upload("12345678903", "Basic YWxpY2U6czNjcmV0")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = send(&db, TestRequest::get().uri("/api/user/orders")).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn expired_tokens_are_rejected() {
    let db = MemoryDatabase::new();
    let (user_id, _) = signed_in_user(&db, "alice").await;
    let now = Utc::now();
    let claims = JwtClaims {
        sub: user_id,
        login: "alice".into(),
        iat: (now - Duration::days(2)).timestamp(),
        exp: (now - Duration::days(1)).timestamp(),
    };
    let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"endpoint-test-secret")).unwrap();
    let res = send(&db, upload("12345678903", &format!("Bearer {token}"))).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert!(db.orders_for_user(user_id).await.unwrap().is_empty());
}

#[actix_web::test]
async fn upload_status_codes() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let (alice, alice_auth) = signed_in_user(&db, "alice").await;
    let (_, bob_auth) = signed_in_user(&db, "bob").await;

    assert_eq!(send(&db, upload("12345678903", &alice_auth)).await.status, StatusCode::ACCEPTED);
    assert_eq!(send(&db, upload("12345678903", &alice_auth)).await.status, StatusCode::OK);
    assert_eq!(send(&db, upload("12345678903", &bob_auth)).await.status, StatusCode::CONFLICT);
    assert_eq!(send(&db, upload("12345678904", &alice_auth)).await.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(send(&db, upload("12a45", &alice_auth)).await.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(send(&db, upload("", &alice_auth)).await.status, StatusCode::BAD_REQUEST);
    // Surrounding whitespace, such as a trailing newline from curl, is ignored
    assert_eq!(send(&db, upload("79927398713\n", &alice_auth)).await.status, StatusCode::ACCEPTED);

    let numbers = db.orders_for_user(alice).await.unwrap().into_iter().map(|o| o.number).collect::<Vec<_>>();
    assert_eq!(numbers, vec!["79927398713", "12345678903"]);
}

#[actix_web::test]
async fn order_list() {
    let db = MemoryDatabase::new();
    let (alice, auth) = signed_in_user(&db, "alice").await;
    let list = || authed(TestRequest::get().uri("/api/user/orders"), &auth);

    let res = send(&db, list()).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(res.body.is_empty());

    let first = db.add_order("12345678903", alice).await.unwrap();
    db.add_order("79927398713", alice).await.unwrap();
    db.update_order_status(first.id, OrderStatusType::Processed, Points::from(500)).await.unwrap();

    let res = send(&db, list()).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.headers.get("content-type").unwrap(), "application/json");
    let orders: Vec<Value> = serde_json::from_str(&res.body).unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["number"], "79927398713");
    assert_eq!(orders[0]["status"], "NEW");
    assert!(orders[0].get("accrual").is_none());
    assert_eq!(orders[1]["number"], "12345678903");
    assert_eq!(orders[1]["status"], "PROCESSED");
    assert_eq!(orders[1]["accrual"], 500.0);
    let uploaded_at = orders[1]["uploaded_at"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(uploaded_at).is_ok(), "{uploaded_at} is not RFC3339");
}
