use std::sync::Arc;

use chrono::Utc;
use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    Client,
};

use crate::{
    config::WalletConfig,
    data_objects::{CreatePaymentRequest, CreatePaymentResponse, PaymentOrderForm},
    helpers::sign_form,
    WalletApiError,
};

#[derive(Clone)]
pub struct WalletApi {
    config: WalletConfig,
    client: Arc<Client>,
}

impl std::fmt::Debug for WalletApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WalletApi({})", self.config.endpoint)
    }
}

impl WalletApi {
    pub fn new(config: WalletConfig) -> Result<Self, WalletApiError> {
        let mut headers = HeaderMap::with_capacity(1);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| WalletApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// Builds the signed form for a payment order. `app_time` is in milliseconds since the epoch.
    pub fn build_form(&self, request: &CreatePaymentRequest, app_time: i64) -> PaymentOrderForm {
        let mut form = PaymentOrderForm {
            app_id: self.config.app_id.clone(),
            app_trans_id: request.app_trans_id.clone(),
            app_user: self.config.app_user.clone(),
            app_time,
            item: "[]".to_string(),
            embed_data: "{}".to_string(),
            amount: request.amount,
            description: request.description.clone(),
            bank_code: String::new(),
            callback_url: self.config.callback_url.clone(),
            mac: String::new(),
        };
        sign_form(&mut form, self.config.key1.reveal());
        form
    }

    /// Asks the provider to open a payment order. The provider answers with a URL (and QR payload) that the customer
    /// uses to pay. Confirmation arrives later, asynchronously, on the callback URL.
    pub async fn create_order(&self, request: CreatePaymentRequest) -> Result<CreatePaymentResponse, WalletApiError> {
        let form = self.build_form(&request, Utc::now().timestamp_millis());
        trace!("Sending wallet payment order {} to {}", form.app_trans_id, self.config.endpoint);
        let response = self
            .client
            .post(&self.config.endpoint)
            .query(&form)
            .send()
            .await
            .map_err(|e| WalletApiError::RequestError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| WalletApiError::ResponseError(e.to_string()))?;
            return Err(WalletApiError::QueryError { status, message });
        }
        let result =
            response.json::<CreatePaymentResponse>().await.map_err(|e| WalletApiError::JsonError(e.to_string()))?;
        if !result.is_success() {
            let message = match &result.sub_return_message {
                Some(sub) => format!("{} ({sub})", result.return_message),
                None => result.return_message.clone(),
            };
            warn!("Wallet provider rejected payment order {}: {message}", request.app_trans_id);
            return Err(WalletApiError::Rejected { code: result.return_code, message });
        }
        if result.order_url.is_none() {
            return Err(WalletApiError::ResponseError("The provider did not return an order URL".into()));
        }
        debug!("Wallet payment order {} opened", request.app_trans_id);
        Ok(result)
    }
}
