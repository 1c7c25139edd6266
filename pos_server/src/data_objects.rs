use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use pos_engine::{
    db_types::{
        Customer,
        NewOrder,
        NewOrderLine,
        NewTransaction,
        PaymentMethod,
        PaymentStatus,
        StockSnapshot,
        TransactionStatus,
        Vnd,
    },
    order_objects::{OrderDetails, OrderLineView, OrderQueryFilter},
    payment_objects::TransactionQueryFilter,
    traits::OrderCreated,
    OrderFlowError,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//----------------------------------------------   Orders  ----------------------------------------------------
/// The body of `POST /orders`. Line items are snapshots of the catalogue as the till saw it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub phone: String,
    pub name: Option<String>,
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
    pub total_amount: Option<Vnd>,
    #[serde(default)]
    pub products: Vec<NewOrderLine>,
}

impl From<CreateOrderRequest> for NewOrder {
    fn from(req: CreateOrderRequest) -> Self {
        NewOrder {
            phone: req.phone,
            name: req.name.filter(|n| !n.trim().is_empty()),
            payment_method: req.payment_method,
            note: req.note,
            total_amount: req.total_amount,
            lines: req.products,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub id: i64,
    pub name: String,
    pub phone: String,
}

impl From<Customer> for CustomerInfo {
    fn from(c: Customer) -> Self {
        Self { id: c.id, name: c.name, phone: c.phone }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub method: PaymentMethod,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub message: String,
    pub order_id: i64,
    pub total_amount: Vnd,
    pub customer: CustomerInfo,
    pub payment: PaymentInfo,
    pub updated_products: Vec<StockSnapshot>,
}

impl From<OrderCreated> for CreateOrderResponse {
    fn from(created: OrderCreated) -> Self {
        let order = created.order;
        Self {
            message: format!("Order #{} created", order.id),
            order_id: order.id,
            total_amount: order.total_amount,
            customer: created.customer.into(),
            payment: PaymentInfo { method: order.payment_method, status: order.payment_status },
            updated_products: created.updated_products,
        }
    }
}

/// The body of `GET /orders/{id}`: the order, flattened, with its customer and line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetailsResponse {
    pub order_id: i64,
    pub created_at: DateTime<Utc>,
    pub total_amount: Vnd,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub note: Option<String>,
    pub customer: CustomerInfo,
    pub products: Vec<OrderLineView>,
}

impl From<OrderDetails> for OrderDetailsResponse {
    fn from(details: OrderDetails) -> Self {
        let order = details.order;
        Self {
            order_id: order.id,
            created_at: order.created_at,
            total_amount: order.total_amount,
            payment_method: order.payment_method,
            payment_status: order.payment_status,
            note: order.note,
            customer: details.customer.into(),
            products: details.products,
        }
    }
}

/// Query parameters for `GET /orders`. `payment_status` takes a comma-separated list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderListParams {
    pub customer_id: Option<i64>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl TryFrom<OrderListParams> for OrderQueryFilter {
    type Error = OrderFlowError;

    fn try_from(params: OrderListParams) -> Result<Self, Self::Error> {
        let payment_status = params
            .payment_status
            .map(|s| {
                s.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(PaymentStatus::from_str)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| OrderFlowError::ValidationError(e.to_string()))
            })
            .transpose()?;
        Ok(OrderQueryFilter {
            customer_id: params.customer_id,
            payment_method: params.payment_method,
            payment_status,
            since: params.since,
            until: params.until,
            limit: params.limit,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StatusParams {
    #[serde(default)]
    pub wait: bool,
}

//----------------------------------------------   Payments  ----------------------------------------------------
/// The body of `POST /orders/{id}/wallet-payment`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletPaymentParams {
    pub description: Option<String>,
}

/// The body of the legacy `POST /zalopay/create-order`. The amount charged is always the stored order total, so a
/// client-supplied amount is only compared against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyWalletPaymentParams {
    pub order_id: i64,
    pub amount: Option<Vnd>,
    pub description: Option<String>,
}

/// The body of `POST /transactions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransactionRequest {
    pub order_id: i64,
    pub app_trans_id: String,
    #[serde(default = "default_channel")]
    pub channel: PaymentMethod,
    #[serde(alias = "zp_trans_token")]
    pub provider_token: Option<String>,
    pub amount: Vnd,
    pub description: Option<String>,
}

fn default_channel() -> PaymentMethod {
    PaymentMethod::Wallet
}

impl From<NewTransactionRequest> for NewTransaction {
    fn from(req: NewTransactionRequest) -> Self {
        let tx = NewTransaction::pending(req.order_id, req.app_trans_id, req.channel, req.amount)
            .with_provider_token(req.provider_token);
        match req.description {
            Some(d) => tx.with_description(d),
            None => tx,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionListParams {
    pub order_id: Option<i64>,
    pub channel: Option<PaymentMethod>,
    pub status: Option<TransactionStatus>,
    pub limit: Option<i64>,
}

impl From<TransactionListParams> for TransactionQueryFilter {
    fn from(p: TransactionListParams) -> Self {
        TransactionQueryFilter { order_id: p.order_id, channel: p.channel, status: p.status, limit: p.limit }
    }
}
