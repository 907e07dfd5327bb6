use std::collections::HashMap;

use cucumber::World;
use log::*;
use loyalty_engine::{
    db_types::Withdrawal,
    AuthApi,
    BalanceApi,
    BalanceApiError,
    OrderApi,
    OrderSubmission,
    SqliteDatabase,
};

use crate::support::{mock_oracle::ScriptedOracle, prepare_env::fast_retries, prepare_env::new_sqlite_db};

#[derive(Default, Debug, World)]
pub struct LedgerWorld {
    pub system: Option<LedgerSystem>,
    pub users: HashMap<String, i64>,
    pub last_submission: Option<OrderSubmission>,
    pub last_withdrawal: Option<Result<Withdrawal, BalanceApiError>>,
}

#[derive(Debug)]
pub struct LedgerSystem {
    pub db: SqliteDatabase,
    pub oracle: ScriptedOracle,
    pub auth: AuthApi<SqliteDatabase>,
    pub orders: OrderApi<SqliteDatabase>,
    pub balances: BalanceApi<SqliteDatabase, ScriptedOracle>,
}

impl LedgerWorld {
    pub fn system(&self) -> &LedgerSystem {
        self.system.as_ref().expect("The system has not been set up. Start with 'Given a fresh install'")
    }

    pub fn user_id(&self, login: &str) -> i64 {
        *self.users.get(login).unwrap_or_else(|| panic!("User {login} has not been registered"))
    }
}

impl LedgerSystem {
    pub async fn new() -> Self {
        let db = new_sqlite_db().await;
        debug!("🚀️ Created database: {}", db.url());
        let oracle = ScriptedOracle::default();
        let auth = AuthApi::new(db.clone()).with_retry_policy(fast_retries());
        let orders = OrderApi::new(db.clone()).with_retry_policy(fast_retries());
        let balances = BalanceApi::new(db.clone(), oracle.clone()).with_retry_policy(fast_retries());
        Self { db, oracle, auth, orders, balances }
    }
}
