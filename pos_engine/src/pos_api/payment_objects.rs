use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{PaymentMethod, TransactionStatus, Vnd};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionQueryFilter {
    pub order_id: Option<i64>,
    pub channel: Option<PaymentMethod>,
    pub status: Option<TransactionStatus>,
    pub limit: Option<i64>,
}

impl TransactionQueryFilter {
    pub fn with_order_id(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_channel(mut self, channel: PaymentMethod) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.order_id.is_none() && self.channel.is_none() && self.status.is_none()
    }
}

/// The body of a wallet callback. `data` is a JSON document serialized as a string, and `mac` is the hex
/// HMAC-SHA256 of exactly that string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletCallback {
    pub data: String,
    pub mac: String,
}

/// The fields of the callback `data` document that the reconciler uses. The provider sends more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletCallbackData {
    pub app_trans_id: String,
    pub zp_trans_id: serde_json::Value,
    /// Milliseconds since the epoch
    pub server_time: i64,
    pub amount: i64,
}

impl WalletCallbackData {
    pub fn settlement_id(&self) -> String {
        match &self.zp_trans_id {
            serde_json::Value::String(s) => s.clone(),
            v => v.to_string(),
        }
    }

    pub fn paid_at(&self) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(self.server_time).single().unwrap_or_else(Utc::now)
    }
}

/// The reply shape the wallet provider requires, whatever the internal outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletCallbackReply {
    pub return_code: i32,
    pub return_message: String,
}

impl WalletCallbackReply {
    pub fn ok() -> Self {
        Self { return_code: 1, return_message: "OK".into() }
    }

    pub fn rejected<S: Into<String>>(message: S) -> Self {
        Self { return_code: -1, return_message: message.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankWebhookTransaction {
    pub transaction_id: Option<String>,
    #[serde(rename = "amountVND")]
    pub amount_vnd: Option<i64>,
    pub bank: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankWebhook {
    pub event: String,
    pub transaction: Option<BankWebhookTransaction>,
    pub timestamp: Option<serde_json::Value>,
}

pub const BANK_EVENT_TRANSACTION_DETECTED: &str = "transaction.detected";

/// The acknowledgement returned to the bank-webhook provider. It is returned with HTTP 200 whether or not an order
/// matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankWebhookReply {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Vnd>,
}

/// A successful wallet-payment initiation: where to send the customer, and the correlation id to expect back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletPaymentStarted {
    pub order_id: i64,
    pub app_trans_id: String,
    pub order_url: String,
    pub qr_code: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn callback_data_accepts_numeric_settlement_ids() {
        let data: WalletCallbackData = serde_json::from_str(
            r#"{"app_id":2554,"app_trans_id":"240612_42_1","app_time":1718150400000,"app_user":"pos_terminal",
            "amount":50000,"embed_data":"{}","item":"[]","zp_trans_id":240612000000123,"server_time":1718150460000,
            "channel":38,"merchant_user_id":"x","user_fee_amount":0,"discount_amount":0}"#,
        )
        .unwrap();
        assert_eq!(data.settlement_id(), "240612000000123");
        assert_eq!(data.paid_at().timestamp_millis(), 1_718_150_460_000);
    }

    #[test]
    fn bank_webhook_field_names() {
        let hook: BankWebhook = serde_json::from_str(
            r#"{"event":"transaction.detected","transaction":{"transactionId":"FT2416","amountVND":50000,
            "bank":"VCB"},"timestamp":"2024-06-12T09:00:00Z"}"#,
        )
        .unwrap();
        let tx = hook.transaction.unwrap();
        assert_eq!(tx.transaction_id.as_deref(), Some("FT2416"));
        assert_eq!(tx.amount_vnd, Some(50_000));
        assert!(tx.description.is_none());
    }

    #[test]
    fn bank_reply_omits_empty_fields() {
        let reply = BankWebhookReply {
            success: false,
            message: "No matching pending order found".into(),
            order_id: None,
            amount: None,
        };
        assert_eq!(
            serde_json::to_string(&reply).unwrap(),
            r#"{"success":false,"message":"No matching pending order found"}"#
        );
    }
}
