//! Connects the engine's wallet-provider contract to the QR-wallet HTTP client.
use log::*;
use pos_engine::traits::{WalletPaymentRequest, WalletPaymentSession, WalletProvider, WalletProviderError};
use wallet_tools::{CreatePaymentRequest, WalletApi, WalletApiError, WalletConfig};

#[derive(Clone, Debug)]
pub struct QrWalletProvider {
    api: WalletApi,
}

impl QrWalletProvider {
    pub fn new(config: WalletConfig) -> Result<Self, WalletApiError> {
        let api = WalletApi::new(config)?;
        Ok(Self { api })
    }

    pub fn api(&self) -> &WalletApi {
        &self.api
    }
}

impl WalletProvider for QrWalletProvider {
    async fn create_payment(&self, request: WalletPaymentRequest) -> Result<WalletPaymentSession, WalletProviderError> {
        let req = CreatePaymentRequest {
            app_trans_id: request.app_trans_id,
            amount: request.amount.value(),
            description: request.description,
        };
        let response = self.api.create_order(req).await.map_err(|e| {
            debug!("💸️ Wallet provider call failed. {e}");
            WalletProviderError(e.to_string())
        })?;
        // A successful response always carries an order URL
        let order_url = response.order_url.unwrap_or_default();
        Ok(WalletPaymentSession { order_url, provider_token: response.zp_trans_token, qr_code: response.qr_code })
    }
}
