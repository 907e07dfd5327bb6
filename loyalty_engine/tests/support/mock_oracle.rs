use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
};

use async_trait::async_trait;
use loyalty_engine::{db_types::Points, AccrualClientError, AccrualOracle, AccrualReport, AccrualStatus};

/// What the scripted accrual system says about an order.
#[derive(Debug, Clone)]
pub enum Answer {
    NotRegistered,
    Report(AccrualStatus, Option<Points>),
    Fails(u16),
}

/// An accrual system whose answers are set by the test. Orders without a scripted answer are not registered.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOracle {
    answers: Arc<Mutex<HashMap<String, Answer>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedOracle {
    pub fn set(&self, number: &str, answer: Answer) {
        self.answers.lock().unwrap().insert(number.to_string(), answer);
    }

    pub fn processed(&self, number: &str, points: f64) {
        self.set(number, Answer::Report(AccrualStatus::Processed, Some(Points::try_from(points).unwrap())));
    }

    pub fn status(&self, number: &str, status: AccrualStatus) {
        self.set(number, Answer::Report(status, None));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccrualOracle for ScriptedOracle {
    async fn fetch_accrual(&self, number: &str) -> Result<Option<AccrualReport>, AccrualClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self.answers.lock().unwrap().get(number).cloned().unwrap_or(Answer::NotRegistered);
        match answer {
            Answer::NotRegistered => Ok(None),
            Answer::Report(status, accrual) => Ok(Some(AccrualReport { order: number.to_string(), status, accrual })),
            Answer::Fails(code) => Err(AccrualClientError::UnexpectedStatus(code)),
        }
    }
}
