//! POS Engine
//!
//! The POS engine holds the core logic of the point-of-sale backend: building orders against live stock, cancelling
//! them, and reconciling payments that arrive out of band from a QR-wallet provider and a bank-transfer notifier.
//!
//! The library is divided into three main sections:
//! 1. Storage ([`mod@sqlite`]). SQLite is the supported backend. You should not need to touch the database directly.
//!    Use the public API instead. The exception is the data types stored in the database, which live in
//!    [`mod@db_types`] and are public.
//! 2. Backend contracts ([`mod@traits`]). A storage backend implements these to drive the engine.
//! 3. The public API ([`OrderFlowApi`] and [`PaymentReconciler`]).
//!
//! The engine publishes events when an order is paid or cancelled. A small actor framework in [`mod@events`] lets you
//! hook into these and run your own actions.
pub mod db_types;
pub mod events;
pub mod helpers;
mod pos_api;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use pos_api::{
    order_flow_api::{validate_new_order, OrderFlowApi},
    order_objects,
    payment_objects,
    reconciliation_api::{PaymentReconciler, ReconcilerConfig, DEFAULT_BANK_MATCH_TOLERANCE},
};
#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use traits::{OrderFlowError, OrderManagement, PaymentLedger, PosDatabase, WalletProvider};
