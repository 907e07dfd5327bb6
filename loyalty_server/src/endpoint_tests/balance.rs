use actix_web::{http::StatusCode, test::TestRequest};
use loyalty_engine::{db_types::Points, LedgerRepository, MemoryDatabase};
use serde_json::{json, Value};

use super::helpers::{authed, send, signed_in_user};

async fn funded_user(db: &MemoryDatabase, points: i64) -> (i64, String) {
    let (id, auth) = signed_in_user(db, "alice").await;
    db.update_user_accrued_total(id, Points::from(points)).await.unwrap();
    (id, auth)
}

fn withdraw(auth: &str, order: &str, sum: f64) -> TestRequest {
    authed(TestRequest::post().uri("/api/user/balance/withdraw"), auth).set_json(json!({ "order": order, "sum": sum }))
}

#[actix_web::test]
async fn balance_of_a_new_user() {
    let db = MemoryDatabase::new();
    let (_, auth) = signed_in_user(&db, "alice").await;
    let res = send(&db, authed(TestRequest::get().uri("/api/user/balance"), &auth)).await;
    assert_eq!(res.status, StatusCode::OK);
    let balance: Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(balance, json!({ "current": 0.0, "withdrawn": 0.0 }));
}

#[actix_web::test]
async fn balance_needs_an_access_token() {
    let db = MemoryDatabase::new();
    assert_eq!(send(&db, TestRequest::get().uri("/api/user/balance")).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(send(&db, TestRequest::get().uri("/api/user/withdrawals")).await.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn withdrawal_status_codes() {
    let _ = env_logger::try_init().ok();
    let db = MemoryDatabase::new();
    let (id, auth) = funded_user(&db, 10).await;

    assert_eq!(send(&db, withdraw(&auth, "2377225625", 4.5)).await.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(send(&db, withdraw(&auth, "79927398713", 100.0)).await.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(send(&db, withdraw(&auth, "79927398713", 0.0)).await.status, StatusCode::BAD_REQUEST);
    let bad_body = authed(TestRequest::post().uri("/api/user/balance/withdraw"), &auth).set_json(json!({"sum": 1}));
    assert_eq!(send(&db, bad_body).await.status, StatusCode::BAD_REQUEST);
    assert_eq!(send(&db, withdraw(&auth, "79927398713", 4.5)).await.status, StatusCode::OK);

    let res = send(&db, authed(TestRequest::get().uri("/api/user/balance"), &auth)).await;
    let balance: Value = serde_json::from_str(&res.body).unwrap();
    assert_eq!(balance, json!({ "current": 5.5, "withdrawn": 4.5 }));
    assert_eq!(db.find_user_by_id(id).await.unwrap().withdrawn_total, Points::try_from(4.5).unwrap());
}

#[actix_web::test]
async fn withdrawal_history() {
    let db = MemoryDatabase::new();
    let (_, auth) = funded_user(&db, 10).await;
    let history = || authed(TestRequest::get().uri("/api/user/withdrawals"), &auth);

    let res = send(&db, history()).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    assert_eq!(send(&db, withdraw(&auth, "79927398713", 1.0)).await.status, StatusCode::OK);
    assert_eq!(send(&db, withdraw(&auth, "12345678903", 2.25)).await.status, StatusCode::OK);

    let res = send(&db, history()).await;
    assert_eq!(res.status, StatusCode::OK);
    let withdrawals: Vec<Value> = serde_json::from_str(&res.body).unwrap();
    assert_eq!(withdrawals.len(), 2);
    assert_eq!(withdrawals[0]["order"], "12345678903");
    assert_eq!(withdrawals[0]["sum"], 2.25);
    assert_eq!(withdrawals[1]["order"], "79927398713");
    assert!(withdrawals[1]["processed_at"].as_str().is_some());
}
