use log::*;
use pos_common::Secret;

pub const DEFAULT_WALLET_ENDPOINT: &str = "https://sb-openapi.zalopay.vn/v2/create";
pub const DEFAULT_APP_USER: &str = "pos_terminal";

#[derive(Debug, Clone, Default)]
pub struct WalletConfig {
    pub app_id: String,
    /// Signs outgoing payment-order requests.
    pub key1: Secret<String>,
    /// Verifies inbound payment callbacks. The client never uses it, but it is provisioned alongside key1.
    pub key2: Secret<String>,
    pub endpoint: String,
    pub callback_url: String,
    pub app_user: String,
}

impl WalletConfig {
    pub fn new_from_env_or_default() -> Self {
        let app_id = std::env::var("POS_WALLET_APP_ID").unwrap_or_else(|_| {
            warn!("🪛️ POS_WALLET_APP_ID not set. Wallet payments will be rejected by the provider.");
            String::default()
        });
        let key1 = Secret::new(std::env::var("POS_WALLET_KEY1").unwrap_or_else(|_| {
            warn!("🪛️ POS_WALLET_KEY1 not set. Wallet payment requests will not be signed correctly.");
            String::default()
        }));
        let key2 = Secret::new(std::env::var("POS_WALLET_KEY2").unwrap_or_else(|_| {
            warn!("🪛️ POS_WALLET_KEY2 not set. Every wallet callback will fail signature checks.");
            String::default()
        }));
        let endpoint = std::env::var("POS_WALLET_ENDPOINT").unwrap_or_else(|_| {
            info!("🪛️ POS_WALLET_ENDPOINT not set, using the provider sandbox, {DEFAULT_WALLET_ENDPOINT}");
            DEFAULT_WALLET_ENDPOINT.to_string()
        });
        let callback_url = std::env::var("POS_WALLET_CALLBACK_URL").unwrap_or_else(|_| {
            warn!("🪛️ POS_WALLET_CALLBACK_URL not set. The provider will not be able to confirm payments.");
            String::default()
        });
        let app_user = std::env::var("POS_WALLET_APP_USER").unwrap_or_else(|_| DEFAULT_APP_USER.to_string());
        Self { app_id, key1, key2, endpoint, callback_url, app_user }
    }
}
