use std::time::Duration;

use actix_web::{
    http::{header::HeaderMap, StatusCode},
    test,
    test::TestRequest,
    web,
    App,
};
use loyalty_engine::{AuthApi, BalanceApi, LedgerRepository, MemoryDatabase, OrderApi, RetryPolicy};

use super::mocks::MockOracle;
use crate::{auth::TokenIssuer, config::AuthConfig, routes::health, server::configure_routes};

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

// A fixed secret for issuing tokens in tests. DO NOT re-use it anywhere.
pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new("endpoint-test-secret", Duration::from_secs(60))
}

/// Registers a user directly in the ledger and returns their id and a valid `Authorization` header value.
pub async fn signed_in_user(db: &MemoryDatabase, login: &str) -> (i64, String) {
    let user = db.add_user(login, "not-a-real-hash").await.unwrap();
    let token = TokenIssuer::new(&get_auth_config()).issue_token(user.id, login).unwrap();
    (user.id, format!("Bearer {token}"))
}

/// Builds a fresh app over `db` and sends it the request. The accrual system is never consulted by the HTTP
/// routes, so the oracle mock has no expectations.
pub async fn send(db: &MemoryDatabase, req: TestRequest) -> TestResponse {
    let retry = RetryPolicy::none();
    let app = App::new()
        .app_data(web::Data::new(AuthApi::new(db.clone()).with_retry_policy(retry)))
        .app_data(web::Data::new(OrderApi::new(db.clone()).with_retry_policy(retry)))
        .app_data(web::Data::new(BalanceApi::new(db.clone(), MockOracle::new()).with_retry_policy(retry)))
        .app_data(web::Data::new(TokenIssuer::new(&get_auth_config())))
        .service(health)
        .configure(configure_routes::<MemoryDatabase, MockOracle>);
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let headers = res.headers().clone();
    let body = test::read_body(res).await;
    TestResponse { status, headers, body: String::from_utf8_lossy(&body).into_owned() }
}

pub fn authed(req: TestRequest, auth: &str) -> TestRequest {
    req.insert_header(("Authorization", auth.to_string()))
}
