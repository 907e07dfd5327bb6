use std::time::Duration;

use actix_web::{
    dev::Server,
    http::KeepAlive,
    middleware::Logger,
    web,
    web::ServiceConfig,
    App,
    HttpServer,
};
use log::*;
use loyalty_engine::{
    AccrualClient,
    AccrualOracle,
    AuthApi,
    BalanceApi,
    LedgerRepository,
    MemoryDatabase,
    OrderApi,
};
use tokio_util::sync::CancellationToken;

use crate::{
    accrual_worker::start_accrual_worker,
    auth::TokenIssuer,
    config::ServerConfig,
    errors::ServerError,
    routes::{
        health,
        LoginRoute,
        MyBalanceRoute,
        MyOrdersRoute,
        MyWithdrawalsRoute,
        RegisterRoute,
        UploadOrderRoute,
        WithdrawRoute,
    },
};

/// Builds the ledger backend named by the configuration, then serves requests until the process is asked to stop.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let oracle = AccrualClient::new(&config.accrual_system_address, config.oracle_timeout)
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let shutdown = CancellationToken::new();
    if config.uses_memory_store() {
        info!("🗃️ Using the in-memory ledger");
        return serve(config, MemoryDatabase::new(), oracle, shutdown).await;
    }
    run_with_sqlite(config, oracle, shutdown).await
}

#[cfg(feature = "sqlite")]
async fn run_with_sqlite(
    config: ServerConfig,
    oracle: AccrualClient,
    shutdown: CancellationToken,
) -> Result<(), ServerError> {
    use loyalty_engine::SqliteDatabase;

    let db = SqliteDatabase::new_with_url_and_connections(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(format!("Migrations failed. {e}")))?;
    info!("🗃️ Using the SQLite ledger at {}", db.url());
    let result = serve(config, db.clone(), oracle, shutdown).await;
    db.close().await;
    result
}

#[cfg(not(feature = "sqlite"))]
async fn run_with_sqlite(
    config: ServerConfig,
    _oracle: AccrualClient,
    _shutdown: CancellationToken,
) -> Result<(), ServerError> {
    Err(ServerError::ConfigurationError(format!(
        "LPS_DATABASE_URL is set to {}, but this build has no SQLite support",
        config.database_url
    )))
}

async fn serve<B>(
    config: ServerConfig,
    db: B,
    oracle: AccrualClient,
    shutdown: CancellationToken,
) -> Result<(), ServerError>
where
    B: LedgerRepository,
{
    let worker_api = BalanceApi::new(db.clone(), oracle.clone())
        .with_retry_policy(config.retry_policy())
        .with_shutdown(shutdown.clone());
    let worker = start_accrual_worker(worker_api, config.reconcile_interval);
    info!("🚀️ Starting server on {}:{}", config.host, config.port);
    let result = match create_server_instance(config, db, oracle, shutdown.clone()) {
        Ok(srv) => srv.await.map_err(ServerError::from),
        Err(e) => Err(e),
    };
    info!("🚀️ Server stopped. Waiting for the accrual worker to finish.");
    shutdown.cancel();
    if let Err(e) = worker.await {
        error!("🕰️ The accrual worker did not shut down cleanly. {e}");
    }
    result
}

pub fn create_server_instance<B, O>(
    config: ServerConfig,
    db: B,
    oracle: O,
    shutdown: CancellationToken,
) -> Result<Server, ServerError>
where
    B: LedgerRepository,
    O: AccrualOracle + Clone,
{
    let bind_addr = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let retry = config.retry_policy();
        let auth_api = AuthApi::new(db.clone()).with_retry_policy(retry).with_shutdown(shutdown.clone());
        let orders_api = OrderApi::new(db.clone()).with_retry_policy(retry).with_shutdown(shutdown.clone());
        let balance_api =
            BalanceApi::new(db.clone(), oracle.clone()).with_retry_policy(retry).with_shutdown(shutdown.clone());
        let jwt_signer = TokenIssuer::new(&config.auth);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("lps::access_log"))
            .app_data(web::Data::new(auth_api))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(balance_api))
            .app_data(web::Data::new(jwt_signer))
            .service(health)
            .configure(configure_routes::<B, O>)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind(bind_addr)?
    .run();
    Ok(srv)
}

/// Registers every `/api` route. The api objects and the [`TokenIssuer`] must be supplied as app data.
pub fn configure_routes<B, O>(cfg: &mut ServiceConfig)
where
    B: LedgerRepository,
    O: AccrualOracle,
{
    cfg.service(
        web::scope("/api")
            .service(RegisterRoute::<B>::new())
            .service(LoginRoute::<B>::new())
            .service(UploadOrderRoute::<B>::new())
            .service(MyOrdersRoute::<B>::new())
            .service(MyBalanceRoute::<B, O>::new())
            .service(WithdrawRoute::<B, O>::new())
            .service(MyWithdrawalsRoute::<B, O>::new()),
    );
}
