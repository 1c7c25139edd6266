use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewOrder, Order, Vnd},
    events::{EventProducers, OrderCancelledEvent},
    order_objects::{OrderDetails, OrderQueryFilter, OrderSummary, PollOutcome, PollPolicy},
    traits::{OrderCancelled, OrderCreated, OrderFlowError, PosDatabase},
};

/// `OrderFlowApi` is the primary API for the order lifecycle: creating orders against live stock, cancelling them,
/// and reading back their state.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}

impl<B> OrderFlowApi<B>
where B: PosDatabase
{
    /// Validates and stores a new order.
    ///
    /// The order's total is computed from its lines. If the client supplied a total, it must agree. Stock for every
    /// stock-managed line is reserved atomically with the insert, so either the whole order is stored or nothing is.
    ///
    /// Cash orders are `paid` on creation. Wallet and bank-transfer orders start `pending`.
    pub async fn create_order(&self, mut order: NewOrder) -> Result<OrderCreated, OrderFlowError> {
        order.phone = order.phone.trim().to_string();
        let total = validate_new_order(&order)?;
        if order.name.as_deref().map(str::trim).unwrap_or_default().is_empty() &&
            self.db.fetch_customer_by_phone(&order.phone).await?.is_none()
        {
            return Err(OrderFlowError::ValidationError(format!(
                "{} is a new customer, so a name is required",
                order.phone
            )));
        }
        let created = self.db.insert_order(order, total).await.map_err(|e| {
            debug!("🔄️📦️ Order could not be created. {e}");
            e
        })?;
        info!(
            "🔄️📦️ Order #{} created for customer #{}. {} by {} is {}",
            created.order.id,
            created.customer.id,
            created.order.total_amount,
            created.order.payment_method,
            created.order.payment_status
        );
        Ok(created)
    }

    /// Cancels a pending order and gives its stock back.
    ///
    /// Orders that are already `paid` or `cancelled` are rejected with [`OrderFlowError::InvalidState`].
    pub async fn cancel_order(&self, order_id: i64) -> Result<OrderCancelled, OrderFlowError> {
        let cancelled = self.db.cancel_order(order_id).await.map_err(|e| {
            debug!("🔄️❌️ Order #{order_id} could not be cancelled. {e}");
            e
        })?;
        info!("🔄️❌️ Order #{order_id} cancelled. Stock restored for {} products", cancelled.restored.len());
        self.call_order_cancelled_hook(&cancelled).await;
        Ok(cancelled)
    }

    async fn call_order_cancelled_hook(&self, cancelled: &OrderCancelled) {
        for emitter in &self.producers.order_cancelled_producer {
            debug!("🔄️❌️ Notifying order cancelled hook subscribers");
            let event = OrderCancelledEvent::new(cancelled.order.clone(), cancelled.restored.clone());
            emitter.publish_event(event).await;
        }
    }

    pub async fn fetch_order(&self, order_id: i64) -> Result<Order, OrderFlowError> {
        self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))
    }

    pub async fn fetch_order_details(&self, order_id: i64) -> Result<OrderDetails, OrderFlowError> {
        self.db.fetch_order_details(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<OrderSummary>, OrderFlowError> {
        self.db.search_orders(query).await
    }

    /// All orders placed by a customer, newest first. An unknown customer is an error, not an empty list.
    pub async fn orders_for_customer(&self, customer_id: i64) -> Result<Vec<OrderSummary>, OrderFlowError> {
        if self.db.fetch_customer(customer_id).await?.is_none() {
            return Err(OrderFlowError::CustomerNotFound(customer_id));
        }
        self.db.search_orders(OrderQueryFilter::default().with_customer_id(customer_id)).await
    }

    /// A single read of the order's payment status.
    pub async fn order_status(&self, order_id: i64) -> Result<PollOutcome, OrderFlowError> {
        let order = self.fetch_order(order_id).await?;
        Ok(PollOutcome {
            order_id,
            payment_status: order.payment_status,
            is_terminal: order.payment_status.is_terminal(),
            attempts: 1,
        })
    }

    /// Re-reads the order's status at a fixed interval until it is terminal, or the attempt budget runs out.
    ///
    /// Running out of attempts is not an error. The last status read is returned with `is_terminal = false`.
    pub async fn wait_for_terminal_status(
        &self,
        order_id: i64,
        policy: &PollPolicy,
    ) -> Result<PollOutcome, OrderFlowError> {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let mut outcome = self.order_status(order_id).await?;
            outcome.attempts = attempt;
            if outcome.is_terminal || attempt >= max_attempts {
                trace!("⏳️ Order #{order_id} is {} after {attempt} polls", outcome.payment_status);
                return Ok(outcome);
            }
            tokio::time::sleep(policy.interval).await;
            attempt += 1;
        }
    }

    pub async fn ping(&self) -> Result<(), OrderFlowError> {
        self.db.ping().await
    }
}

/// Checks an order request for completeness and returns the total the order will be stored with.
pub fn validate_new_order(order: &NewOrder) -> Result<Vnd, OrderFlowError> {
    if order.phone.trim().is_empty() {
        return Err(OrderFlowError::ValidationError("A phone number is required".into()));
    }
    if order.lines.is_empty() {
        return Err(OrderFlowError::ValidationError("An order needs at least one product".into()));
    }
    for line in &order.lines {
        if line.quantity <= 0 {
            return Err(OrderFlowError::ValidationError(format!(
                "Quantity for {} must be positive, not {}",
                line.product_name, line.quantity
            )));
        }
        if line.price_at_order < Vnd::from(0) {
            return Err(OrderFlowError::ValidationError(format!("Price for {} is negative", line.product_name)));
        }
        if !(0..=100).contains(&line.discount_percent_at_order) {
            return Err(OrderFlowError::ValidationError(format!(
                "Discount for {} must be between 0 and 100%",
                line.product_name
            )));
        }
    }
    let total = order
        .computed_total()
        .ok_or_else(|| OrderFlowError::ValidationError("The order total is too large to be represented".into()))?;
    match order.total_amount {
        Some(claimed) if claimed != total => Err(OrderFlowError::ValidationError(format!(
            "The order total of {claimed} does not match the line items, which add up to {total}"
        ))),
        _ => Ok(total),
    }
}
