use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db_types::{Customer, Order, PaymentMethod, PaymentStatus, Vnd};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub customer_id: Option<i64>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: Option<Vec<PaymentStatus>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl OrderQueryFilter {
    pub fn with_customer_id(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    pub fn with_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none()
            && self.payment_method.is_none()
            && self.payment_status.as_ref().map(|s| s.is_empty()).unwrap_or(true)
            && self.since.is_none()
            && self.until.is_none()
    }
}

/// One row of the order list: the order, who placed it, and how many lines it has.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: i64,
    pub created_at: DateTime<Utc>,
    pub total_amount: Vnd,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub note: Option<String>,
    pub customer_id: i64,
    pub customer_name: String,
    pub customer_phone: String,
    pub product_count: i64,
}

/// An order line as shown on a receipt, with the product's current image.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderLineView {
    pub product_id: i64,
    pub name: String,
    pub quantity: i64,
    pub price: Vnd,
    pub discount_percent: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    pub customer: Customer,
    pub products: Vec<OrderLineView>,
}

/// Bounds for waiting on an order to reach a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self { interval: Duration::from_millis(3_000), max_attempts: 20 }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self { interval, max_attempts: max_attempts.max(1) }
    }

    /// The longest a poll can take.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOutcome {
    pub order_id: i64,
    pub payment_status: PaymentStatus,
    pub is_terminal: bool,
    pub attempts: u32,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn filter_is_empty() {
        assert!(OrderQueryFilter::default().is_empty());
        assert!(OrderQueryFilter::default().with_limit(5).is_empty());
        assert!(!OrderQueryFilter::default().with_status(PaymentStatus::Paid).is_empty());
        assert!(!OrderQueryFilter::default().with_customer_id(3).is_empty());
    }

    #[test]
    fn poll_budget() {
        let policy = PollPolicy::new(Duration::from_millis(3_000), 20);
        assert_eq!(policy.budget(), Duration::from_secs(57));
        let policy = PollPolicy::new(Duration::from_millis(100), 0);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.budget(), Duration::ZERO);
    }
}
