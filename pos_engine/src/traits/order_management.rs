use crate::{
    db_types::{Customer, Order, OrderLine, Product},
    order_objects::{OrderDetails, OrderQueryFilter, OrderSummary},
    traits::OrderFlowError,
};

/// Read-only queries over orders, customers and the catalog.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;

    async fn fetch_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, OrderFlowError>;

    /// The order, its customer, and its lines joined with the current product image.
    async fn fetch_order_details(&self, order_id: i64) -> Result<Option<OrderDetails>, OrderFlowError>;

    /// Order summaries matching the filter, newest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<OrderSummary>, OrderFlowError>;

    async fn fetch_customer(&self, customer_id: i64) -> Result<Option<Customer>, OrderFlowError>;

    /// If more than one customer shares the phone number, the oldest record is returned.
    async fn fetch_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, OrderFlowError>;

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, OrderFlowError>;
}
