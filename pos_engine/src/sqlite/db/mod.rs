//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are simple functions (rather than stateful structs) that accept a `&mut SqliteConnection`
//! argument. Callers can obtain a connection from a pool, or open an atomic transaction as the need arises and call
//! through to the functions without any other changes.
//!
//! Write paths that decide anything based on current state do the deciding inside a single conditional statement
//! (`UPDATE ... WHERE <guard> RETURNING ...`), and issue that statement first in their transaction. SQLite then
//! takes its write lock up front, and concurrent writers queue on the busy timeout instead of deadlocking.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod customers;
pub mod orders;
pub mod products;
pub mod transactions;

const SQLITE_DB_URL: &str = "sqlite://data/pos_store.db";

pub fn db_url() -> String {
    let result = env::var("POS_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ POS_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(10));
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
