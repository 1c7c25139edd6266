use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Customer, Order, OrderLine, PaymentStatus, StockSnapshot, Transaction, Vnd};

/// The result of a successful order insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreated {
    pub order: Order,
    pub customer: Customer,
    pub lines: Vec<OrderLine>,
    /// Stock levels after the reservation, one per distinct product on the order
    pub updated_products: Vec<StockSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub order: Order,
    /// Stock levels after the restoration. Products that don't manage stock are not listed.
    pub restored: Vec<StockSnapshot>,
}

/// A wallet confirmation whose signature has already been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSettlement {
    pub app_trans_id: String,
    /// The order id recovered from the correlation id. Used only when no ledger row exists for it.
    pub order_hint: Option<i64>,
    pub settlement_id: String,
    pub amount: Vnd,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletSettlementResult {
    /// The order moved from `pending` to `paid`.
    Paid { order: Order, transaction: Transaction },
    /// This correlation id was settled before. Nothing changed.
    AlreadySettled { transaction: Transaction },
    /// The ledger row was settled, but the order had already left `pending`.
    OrderNotPending { transaction: Transaction, status: PaymentStatus },
    /// The order already has a different successful payment. This one was not marked successful.
    DuplicatePayment { order_id: i64, app_trans_id: String },
    /// No ledger row, and no order could be derived from the correlation id.
    Unmatched,
}

/// A bank-transfer notification. It carries no order reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankTransfer {
    pub transaction_id: String,
    pub amount: Vnd,
    pub bank: Option<String>,
    pub description: Option<String>,
}

impl BankTransfer {
    pub fn ledger_description(&self) -> String {
        format!(
            "Bank transfer - {} - {}",
            self.bank.as_deref().unwrap_or("UNKNOWN"),
            self.description.as_deref().unwrap_or_default()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankSettlementResult {
    Paid {
        order: Order,
        /// `None` if the ledger write failed. The order is paid regardless.
        transaction: Option<Transaction>,
        /// Other pending orders that were also within tolerance
        ambiguous_matches: Vec<i64>,
    },
    /// This bank transaction id was already applied to an order.
    Replayed { transaction: Transaction },
    NoMatch,
}
