use std::{path::Path, time::Duration};

use log::*;
use loyalty_engine::{RetryPolicy, SqliteDatabase};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub fn init_logging() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
}

pub fn random_db_path() -> String {
    let dir = std::env::temp_dir();
    format!("sqlite://{}/lps_test_{}.db", dir.display(), rand::random::<u64>())
}

pub async fn create_database<P: AsRef<Path>>(path: P) {
    let p = path.as_ref().as_os_str().to_str().unwrap();
    if let Err(e) = Sqlite::drop_database(p).await {
        trace!("Could not drop database {p}: {e:?}");
    }
    Sqlite::create_database(p).await.expect("Error creating database");
    debug!("🚀️ Created Sqlite database {p}");
}

/// Creates a brand-new SQLite database at a random path and brings its schema up to date.
pub async fn new_sqlite_db() -> SqliteDatabase {
    init_logging();
    let url = random_db_path();
    create_database(&url).await;
    let db = SqliteDatabase::new_with_url_and_connections(&url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    db
}

pub async fn drop_sqlite_db(db: SqliteDatabase) {
    let url = db.url().to_string();
    db.close().await;
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Could not remove test database {url}: {e}");
    }
}

/// Retries quickly so that tests that exercise the retry paths do not take seconds.
pub fn fast_retries() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(2))
}
