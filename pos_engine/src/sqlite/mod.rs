//! SQLite backend for the POS engine.
mod errors;
mod sqlite_impl;

pub mod db;
pub use errors::SqliteDatabaseError;
pub use sqlite_impl::SqliteDatabase;
