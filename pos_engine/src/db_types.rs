use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use pos_common::Vnd;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------        Role         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Customer,
    Staff,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Customer => write!(f, "customer"),
            Role::Staff => write!(f, "staff"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

//--------------------------------------      Customer       ---------------------------------------------------------
/// A row in the `users` table. Customers are created lazily the first time their phone number is seen on an order.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       Product       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub category_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub price: Vnd,
    pub discount_percent: i64,
    pub image_url: Option<String>,
    /// When false, `stock_quantity` is informational only and is never checked or changed by orders.
    pub manage_stock: bool,
    pub stock_quantity: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
    pub category_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub price: Vnd,
    pub discount_percent: i64,
    pub image_url: Option<String>,
    pub manage_stock: bool,
    pub stock_quantity: i64,
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, price: Vnd) -> Self {
        Self { name: name.into(), price, ..Default::default() }
    }

    pub fn with_stock(mut self, stock_quantity: i64) -> Self {
        self.manage_stock = true;
        self.stock_quantity = stock_quantity;
        self
    }

    pub fn with_discount(mut self, discount_percent: i64) -> Self {
        self.discount_percent = discount_percent;
        self
    }

    pub fn with_image_url<S: Into<String>>(mut self, url: S) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

/// The stock level of a product immediately after an order reserved or a cancellation restored it.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub id: i64,
    pub name: String,
    pub stock_quantity: i64,
    pub manage_stock: bool,
}

//--------------------------------------    PaymentMethod    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    /// The third-party QR wallet. Confirmed by a signed callback.
    #[serde(alias = "zalopay")]
    Wallet,
    /// Bank transfer. Confirmed by a webhook that carries only an amount.
    #[serde(alias = "cake")]
    BankTransfer,
}

impl PaymentMethod {
    /// The status a new order starts in. Cash is settled at the counter.
    pub fn initial_status(&self) -> PaymentStatus {
        match self {
            PaymentMethod::Cash => PaymentStatus::Paid,
            PaymentMethod::Wallet | PaymentMethod::BankTransfer => PaymentStatus::Pending,
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Wallet => write!(f, "wallet"),
            PaymentMethod::BankTransfer => write!(f, "bank_transfer"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(Self::Cash),
            "wallet" | "zalopay" => Ok(Self::Wallet),
            "bank_transfer" | "cake" => Ok(Self::BankTransfer),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------    PaymentStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Waiting for a wallet or bank confirmation.
    Pending,
    Paid,
    Cancelled,
}

impl PaymentStatus {
    /// `Paid` and `Cancelled` are final. No transition leaves either of them.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    /// Snapshot taken at creation. Never recomputed afterwards.
    pub total_amount: Vnd,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      OrderLine      ---------------------------------------------------------
/// One product within an order, frozen at order time so that later catalog edits don't rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub price_at_order: Vnd,
    pub discount_percent_at_order: i64,
}

impl OrderLine {
    pub fn line_total(&self) -> Option<Vnd> {
        line_total(self.price_at_order, self.quantity, self.discount_percent_at_order)
    }
}

/// price × quantity less the discount, rounded half up to the nearest dong. `None` if the amount does not fit.
pub fn line_total(price: Vnd, quantity: i64, discount_percent: i64) -> Option<Vnd> {
    price.checked_mul(quantity)?.discounted(discount_percent)
}

//--------------------------------------      NewOrder       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub price_at_order: Vnd,
    #[serde(default)]
    pub discount_percent_at_order: i64,
}

impl NewOrderLine {
    pub fn new<S: Into<String>>(product_id: i64, product_name: S, quantity: i64, price_at_order: Vnd) -> Self {
        Self { product_id, product_name: product_name.into(), quantity, price_at_order, discount_percent_at_order: 0 }
    }

    pub fn with_discount(mut self, discount_percent: i64) -> Self {
        self.discount_percent_at_order = discount_percent;
        self
    }

    pub fn line_total(&self) -> Option<Vnd> {
        line_total(self.price_at_order, self.quantity, self.discount_percent_at_order)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Customers are identified by phone number
    pub phone: String,
    /// Required only when the phone number has not been seen before
    pub name: Option<String>,
    pub payment_method: PaymentMethod,
    pub note: Option<String>,
    /// If the client sends a total, it must agree with the total computed from the lines
    pub total_amount: Option<Vnd>,
    pub lines: Vec<NewOrderLine>,
}

impl NewOrder {
    pub fn new<S: Into<String>>(phone: S, payment_method: PaymentMethod) -> Self {
        Self {
            phone: phone.into(),
            name: None,
            payment_method,
            note: None,
            total_amount: None,
            lines: Vec::new(),
        }
    }

    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_note<S: Into<String>>(mut self, note: S) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_line(mut self, line: NewOrderLine) -> Self {
        self.lines.push(line);
        self
    }

    /// The sum of the line totals, or `None` if it overflows.
    pub fn computed_total(&self) -> Option<Vnd> {
        self.lines.iter().try_fold(Vnd::default(), |total, line| total.checked_add(line.line_total()?))
    }
}

//--------------------------------------  TransactionStatus  ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Success,
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Success => write!(f, "success"),
        }
    }
}

//--------------------------------------     Transaction     ---------------------------------------------------------
/// A payment-channel record in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub order_id: i64,
    /// Correlation id. For the wallet this is the `app_trans_id` we generated; for bank transfers, the bank's
    /// transaction id.
    pub app_trans_id: String,
    pub channel: PaymentMethod,
    pub provider_token: Option<String>,
    pub amount: Vnd,
    pub description: Option<String>,
    pub status: TransactionStatus,
    /// The provider's own id for the settled payment
    pub settlement_id: Option<String>,
    pub payment_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub order_id: i64,
    pub app_trans_id: String,
    pub channel: PaymentMethod,
    pub provider_token: Option<String>,
    pub amount: Vnd,
    pub description: Option<String>,
    pub status: TransactionStatus,
    pub settlement_id: Option<String>,
    pub payment_time: Option<DateTime<Utc>>,
}

impl NewTransaction {
    pub fn pending<S: Into<String>>(order_id: i64, app_trans_id: S, channel: PaymentMethod, amount: Vnd) -> Self {
        Self {
            order_id,
            app_trans_id: app_trans_id.into(),
            channel,
            provider_token: None,
            amount,
            description: None,
            status: TransactionStatus::Pending,
            settlement_id: None,
            payment_time: None,
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_provider_token(mut self, token: Option<String>) -> Self {
        self.provider_token = token;
        self
    }

    /// Marks the record as already settled.
    pub fn settled(mut self, settlement_id: Option<String>, payment_time: DateTime<Utc>) -> Self {
        self.status = TransactionStatus::Success;
        self.settlement_id = settlement_id;
        self.payment_time = Some(payment_time);
        self
    }
}
