use async_trait::async_trait;
use loyalty_engine::{AccrualClientError, AccrualOracle, AccrualReport};
use mockall::mock;

mock! {
    pub Oracle {}
    #[async_trait]
    impl AccrualOracle for Oracle {
        async fn fetch_accrual(&self, number: &str) -> Result<Option<AccrualReport>, AccrualClientError>;
    }
}
