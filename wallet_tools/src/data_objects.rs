use serde::{Deserialize, Serialize};

/// What the point of sale wants the provider to collect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    /// The correlation id the provider echoes back in its callback.
    pub app_trans_id: String,
    pub amount: i64,
    pub description: String,
}

/// The form fields sent to the provider's create endpoint, in the provider's own naming.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentOrderForm {
    pub app_id: String,
    pub app_trans_id: String,
    pub app_user: String,
    pub app_time: i64,
    pub item: String,
    pub embed_data: String,
    pub amount: i64,
    pub description: String,
    pub bank_code: String,
    pub callback_url: String,
    pub mac: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePaymentResponse {
    pub return_code: i64,
    #[serde(default)]
    pub return_message: String,
    #[serde(default)]
    pub sub_return_code: Option<i64>,
    #[serde(default)]
    pub sub_return_message: Option<String>,
    #[serde(default)]
    pub zp_trans_token: Option<String>,
    #[serde(default)]
    pub order_url: Option<String>,
    #[serde(default)]
    pub order_token: Option<String>,
    #[serde(default)]
    pub qr_code: Option<String>,
}

impl CreatePaymentResponse {
    pub fn is_success(&self) -> bool {
        self.return_code == 1
    }
}
