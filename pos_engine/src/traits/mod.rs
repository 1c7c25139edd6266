//! # Backend contracts
//!
//! This module defines the behaviour that storage backends must expose in order to be driven by the POS engine.
//!
//! * [`OrderManagement`] provides read-only queries over orders, customers and products.
//! * [`PosDatabase`] defines the order lifecycle writes: creation against live stock, and cancellation.
//! * [`PaymentLedger`] is the transaction ledger, together with the atomic settlement operations that payment
//!   confirmations are applied through.
//! * [`WalletProvider`] is the outbound call to the QR-wallet provider. It is implemented outside the engine.
mod data_objects;
mod order_management;
mod payment_ledger;
mod pos_database;
mod wallet_provider;

pub use data_objects::{
    BankSettlementResult,
    BankTransfer,
    OrderCancelled,
    OrderCreated,
    WalletSettlement,
    WalletSettlementResult,
};
pub use order_management::OrderManagement;
pub use payment_ledger::PaymentLedger;
pub use pos_database::{OrderFlowError, PosDatabase};
pub use wallet_provider::{WalletPaymentRequest, WalletPaymentSession, WalletProvider, WalletProviderError};
