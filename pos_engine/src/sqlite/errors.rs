use thiserror::Error;

/// Errors from setting up or tearing down the SQLite backend. Errors during normal operation are reported as
/// [`crate::traits::OrderFlowError`].
#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Could not apply database migrations: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}
