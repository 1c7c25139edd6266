//! # POS engine public API
//!
//! The `pos_api` module exposes the programmatic API for the point-of-sale engine.
//!
//! * [`order_flow_api`] handles the order lifecycle: creating orders against live stock, cancelling them and reading
//!   their state back, including status polling.
//! * [`reconciliation_api`] applies payment confirmations from the wallet callback and the bank-transfer webhook, opens
//!   wallet payment sessions and gives access to the transaction ledger.
//!
//! The other submodules hold the request and response types that go with these APIs.
//!
//! # API usage
//!
//! Each API is created by supplying a database backend that implements the backend traits it needs.
//!
//! ```rust,ignore
//! use pos_engine::{events::EventProducers, OrderFlowApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/pos_store.db", 5).await?;
//! // SqliteDatabase implements PosDatabase
//! let api = OrderFlowApi::new(db, EventProducers::default());
//! let details = api.fetch_order_details(42).await?;
//! ```

pub mod order_flow_api;
pub mod order_objects;
pub mod payment_objects;
pub mod reconciliation_api;
