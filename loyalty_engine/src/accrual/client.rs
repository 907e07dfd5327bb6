use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use log::*;
use reqwest::{Client, StatusCode};

use super::{AccrualClientError, AccrualOracle, AccrualReport};

pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for the accrual system's `GET /api/orders/{number}` endpoint.
#[derive(Clone)]
pub struct AccrualClient {
    base_url: String,
    client: Arc<Client>,
}

impl AccrualClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AccrualClientError> {
        let client = Client::builder().timeout(timeout).build().map_err(AccrualClientError::Request)?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self { base_url, client: Arc::new(client) })
    }

    pub fn url(&self, number: &str) -> String {
        format!("{}/api/orders/{number}", self.base_url)
    }
}

#[async_trait]
impl AccrualOracle for AccrualClient {
    async fn fetch_accrual(&self, number: &str) -> Result<Option<AccrualReport>, AccrualClientError> {
        let url = self.url(number);
        trace!("🧮️ Querying accrual system: {url}");
        let response = self.client.get(url).send().await?;
        match response.status() {
            StatusCode::NO_CONTENT => {
                debug!("🧮️ Order {number} is not registered with the accrual system yet");
                Ok(None)
            },
            StatusCode::OK => {
                let report = response.json::<AccrualReport>().await?;
                debug!("🧮️ Accrual system says order {number} is {:?}", report.status);
                Ok(Some(report))
            },
            status => {
                warn!("🧮️ Accrual system responded to order {number} with {status}");
                Err(AccrualClientError::UnexpectedStatus(status.as_u16()))
            },
        }
    }
}
