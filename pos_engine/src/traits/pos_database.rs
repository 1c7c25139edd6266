use thiserror::Error;

use crate::{
    db_types::{NewOrder, PaymentStatus, Vnd},
    traits::{
        data_objects::{OrderCancelled, OrderCreated},
        OrderManagement,
    },
};

/// The error taxonomy shared by every backend and the engine APIs.
#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Invalid request. {0}")]
    ValidationError(String),
    #[error("Order #{0} does not exist")]
    OrderNotFound(i64),
    #[error("Product #{0} does not exist")]
    ProductNotFound(i64),
    #[error("Customer #{0} does not exist")]
    CustomerNotFound(i64),
    #[error("No transaction exists for correlation id {0}")]
    TransactionNotFound(String),
    #[error("Order #{order_id} is {status}. Only pending orders can be {action}.")]
    InvalidState { order_id: i64, status: PaymentStatus, action: &'static str },
    #[error("Not enough stock for {product}. Requested {requested}, but only {available} left.")]
    InsufficientStock { product_id: i64, product: String, requested: i64, available: i64 },
    #[error("Signature check failed. {0}")]
    AuthenticationError(String),
    #[error("The payment provider could not be reached or refused the request. {0}")]
    ExternalServiceError(String),
    #[error("A transaction with correlation id {0} already exists")]
    TransactionAlreadyExists(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

/// This trait defines the write side of the order lifecycle for backends supporting the POS engine.
///
/// Every method here runs as a single atomic unit in the backend. If any step fails, none of the writes made by
/// that call are persisted.
#[allow(async_fn_in_trait)]
pub trait PosDatabase: Clone + OrderManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// A trivial round trip to the store.
    async fn ping(&self) -> Result<(), OrderFlowError>;

    /// Stores a new order, in a single atomic transaction:
    /// * every stock-managed line reserves its quantity with a conditional decrement. If any line lacks stock,
    ///   the call fails with [`OrderFlowError::InsufficientStock`] and nothing is written.
    /// * the customer is found by phone, or created with the `customer` role if a name was given.
    /// * the order is inserted with `total_amount`, in the initial status for its payment method.
    /// * all lines are inserted.
    ///
    /// The order must already have been validated. `total_amount` is the figure to store on the order.
    async fn insert_order(&self, order: NewOrder, total_amount: Vnd) -> Result<OrderCreated, OrderFlowError>;

    /// Moves a `pending` order to `cancelled` and restores the stock of every stock-managed line.
    ///
    /// Fails with [`OrderFlowError::OrderNotFound`] or [`OrderFlowError::InvalidState`] without making changes.
    async fn cancel_order(&self, order_id: i64) -> Result<OrderCancelled, OrderFlowError>;
}
