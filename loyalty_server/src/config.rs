use std::{env, time::Duration};

use log::*;
use loyalty_engine::{
    accrual::DEFAULT_ORACLE_TIMEOUT,
    retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES, DEFAULT_STEP},
    RetryPolicy,
    DEFAULT_RECONCILE_INTERVAL,
};
use lps_common::{
    helpers::{parse_number, parse_seconds},
    Secret,
};
use rand::{thread_rng, Rng};

const DEFAULT_LPS_HOST: &str = "127.0.0.1";
const DEFAULT_LPS_PORT: u16 = 8080;
const DEFAULT_ACCRUAL_SYSTEM_ADDRESS: &str = "http://127.0.0.1:8081";
const DEFAULT_TOKEN_VALIDITY: Duration = Duration::from_secs(5 * 60);
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// An empty URL selects the in-memory ledger. Nothing survives a restart in that case.
    pub database_url: String,
    pub db_max_connections: u32,
    /// Base URL of the accrual system, e.g. `http://localhost:8081`.
    pub accrual_system_address: String,
    pub oracle_timeout: Duration,
    pub reconcile_interval: Duration,
    pub max_retries: usize,
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_LPS_HOST.to_string(),
            port: DEFAULT_LPS_PORT,
            database_url: String::default(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            accrual_system_address: DEFAULT_ACCRUAL_SYSTEM_ADDRESS.to_string(),
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("LPS_HOST").ok().unwrap_or_else(|| DEFAULT_LPS_HOST.into());
        let port = number_from_env("LPS_PORT", DEFAULT_LPS_PORT);
        let database_url = env::var("LPS_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ LPS_DATABASE_URL is not set. The ledger will be kept in memory and lost on shutdown.");
            String::default()
        });
        let db_max_connections = number_from_env("LPS_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS);
        let accrual_system_address =
            env::var("LPS_ACCRUAL_SYSTEM_ADDRESS").ok().filter(|s| !s.trim().is_empty()).unwrap_or_else(|| {
                warn!(
                    "🪛️ LPS_ACCRUAL_SYSTEM_ADDRESS is not set. Using {DEFAULT_ACCRUAL_SYSTEM_ADDRESS}. If nothing is \
                     listening there, orders will be accepted but never credited."
                );
                DEFAULT_ACCRUAL_SYSTEM_ADDRESS.to_string()
            });
        let oracle_timeout = seconds_from_env("LPS_ORACLE_TIMEOUT", DEFAULT_ORACLE_TIMEOUT);
        let reconcile_interval = seconds_from_env("LPS_RECONCILE_INTERVAL", DEFAULT_RECONCILE_INTERVAL);
        let max_retries = number_from_env("LPS_MAX_RETRIES", DEFAULT_MAX_RETRIES);
        let auth = AuthConfig::from_env_or_default();
        Self {
            host,
            port,
            database_url,
            db_max_connections,
            accrual_system_address,
            oracle_timeout,
            reconcile_interval,
            max_retries,
            auth,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, DEFAULT_BASE_DELAY, DEFAULT_STEP)
    }

    pub fn uses_memory_store(&self) -> bool {
        self.database_url.trim().is_empty()
    }
}

fn number_from_env<T>(name: &str, default: T) -> T
where T: std::str::FromStr + std::fmt::Display + Copy {
    match parse_number::<T>(env::var(name).ok()) {
        Some(Ok(v)) => v,
        Some(Err(e)) => {
            error!("🪛️ {e} for {name}. Using the default, {default}, instead.");
            default
        },
        None => default,
    }
}

fn seconds_from_env(name: &str, default: Duration) -> Duration {
    match parse_seconds(env::var(name).ok()) {
        Some(Ok(d)) if !d.is_zero() => d,
        Some(Ok(_)) => {
            warn!("🪛️ {name} must be at least one second. Using the default, {default:?}, instead.");
            default
        },
        Some(Err(e)) => {
            error!("🪛️ {e} for {name}. Using the default, {default:?}, instead.");
            default
        },
        None => {
            info!("🪛️ {name} is not set. Using the default value of {default:?}.");
            default
        },
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC secret used to sign and verify access tokens.
    pub jwt_secret: Secret<String>,
    /// How long an issued access token stays valid.
    pub token_validity: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { jwt_secret: Secret::new(random_secret()), token_validity: DEFAULT_TOKEN_VALIDITY }
    }
}

impl AuthConfig {
    pub fn new(secret: &str, token_validity: Duration) -> Self {
        Self { jwt_secret: Secret::new(secret.to_string()), token_validity }
    }

    pub fn from_env_or_default() -> Self {
        let token_validity = seconds_from_env("LPS_TOKEN_VALIDITY", DEFAULT_TOKEN_VALIDITY);
        match env::var("LPS_JWT_SECRET").ok().filter(|s| !s.is_empty()) {
            Some(secret) => Self { jwt_secret: Secret::new(secret), token_validity },
            None => {
                warn!(
                    "🚨️🚨️🚨️ LPS_JWT_SECRET has not been set. I'm using a random value for this session. Every access \
                     token will become invalid when the server restarts. DO NOT operate on production like this. \
                     🚨️🚨️🚨️"
                );
                Self { jwt_secret: Secret::new(random_secret()), token_validity }
            },
        }
    }
}

/// A session-only signing secret.
fn random_secret() -> String {
    let bytes: [u8; 32] = thread_rng().gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
