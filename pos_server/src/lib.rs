//! # POS server
//! The HTTP face of the point-of-sale backend. It is responsible for:
//! * Taking orders from the till and handing them to the order flow, which reserves stock atomically.
//! * Starting QR-wallet payments and receiving the provider's signed callbacks.
//! * Receiving bank-transfer webhooks and matching them against pending bank-transfer orders.
//! * Serving order, customer and transaction lookups, including a bounded long-poll on order status.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`, `/ping`: liveness and database checks.
//! * `/orders`, `/orders/{id}`, `/orders/{id}/cancel`, `/orders/{id}/status`: the order lifecycle.
//! * `/orders/{id}/wallet-payment`, `/zalopay/create-order`, `/zalopay/callback`: QR-wallet payments.
//! * `/webhook/payhook`: bank-transfer notifications, optionally HMAC-signed.
//! * `/transactions`, `/orders/{id}/transactions`: the payment ledger.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
