mod api;
mod config;
mod error;

pub mod data_objects;
pub mod helpers;

pub use api::WalletApi;
pub use config::WalletConfig;
pub use data_objects::{CreatePaymentRequest, CreatePaymentResponse};
pub use error::WalletApiError;
