use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db_types::Vnd;

#[derive(Debug, Clone, Error)]
#[error("Wallet provider error: {0}")]
pub struct WalletProviderError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletPaymentRequest {
    pub app_trans_id: String,
    pub amount: Vnd,
    pub description: String,
}

/// What the provider hands back when a payment order is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletPaymentSession {
    pub order_url: String,
    pub provider_token: Option<String>,
    pub qr_code: Option<String>,
}

/// The outbound half of the wallet channel: asking the QR-wallet provider to open a payment order.
#[allow(async_fn_in_trait)]
pub trait WalletProvider {
    async fn create_payment(&self, request: WalletPaymentRequest) -> Result<WalletPaymentSession, WalletProviderError>;
}
