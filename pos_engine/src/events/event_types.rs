use serde::{Deserialize, Serialize};

use crate::db_types::{Order, PaymentMethod, StockSnapshot};

/// Published exactly once per order, when it moves from `pending` to `paid`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    /// The channel whose confirmation paid the order
    pub channel: PaymentMethod,
}

impl OrderPaidEvent {
    pub fn new(order: Order, channel: PaymentMethod) -> Self {
        Self { order, channel }
    }
}

/// Published when a pending order is cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    pub order: Order,
    pub restored: Vec<StockSnapshot>,
}

impl OrderCancelledEvent {
    pub fn new(order: Order, restored: Vec<StockSnapshot>) -> Self {
        Self { order, restored }
    }
}
