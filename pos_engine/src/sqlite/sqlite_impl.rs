//! `SqliteDatabase` is a concrete implementation of a POS engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::Utc;
use log::*;
use sqlx::{migrate, Connection, SqlitePool};

use super::{
    db::{customers, db_url, new_pool, orders, products, transactions},
    SqliteDatabaseError,
};
use crate::{
    db_types::{
        Customer,
        NewOrder,
        NewProduct,
        NewTransaction,
        Order,
        OrderLine,
        PaymentMethod,
        PaymentStatus,
        Product,
        Role,
        StockSnapshot,
        Transaction,
        TransactionStatus,
        Vnd,
    },
    order_objects::{OrderDetails, OrderQueryFilter, OrderSummary},
    payment_objects::TransactionQueryFilter,
    traits::{
        BankSettlementResult,
        BankTransfer,
        OrderCancelled,
        OrderCreated,
        OrderFlowError,
        OrderManagement,
        PaymentLedger,
        PosDatabase,
        WalletSettlement,
        WalletSettlementResult,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the URL in `POS_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), SqliteDatabaseError> {
        self.pool.close().await;
        Ok(())
    }

    /// Adds a product to the catalog.
    pub async fn insert_product(&self, product: NewProduct) -> Result<Product, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let product = products::insert_product(product, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Product #{} ({}) added to the catalog", product.id, product.name);
        Ok(product)
    }

    /// Registers a user explicitly, e.g. a staff account.
    pub async fn insert_customer(&self, name: &str, phone: &str, role: Role) -> Result<Customer, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let customer = customers::insert_customer(name, phone, role, &mut tx).await?;
        tx.commit().await?;
        Ok(customer)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let lines = orders::fetch_order_lines(order_id, &mut conn).await?;
        Ok(lines)
    }

    async fn fetch_order_details(&self, order_id: i64) -> Result<Option<OrderDetails>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let Some(order) = orders::fetch_order(order_id, &mut conn).await? else {
            return Ok(None);
        };
        let customer = customers::fetch_customer(order.user_id, &mut conn).await?.ok_or_else(|| {
            OrderFlowError::DatabaseError(format!("Order #{order_id} refers to missing user #{}", order.user_id))
        })?;
        let products = orders::fetch_order_line_views(order_id, &mut conn).await?;
        Ok(Some(OrderDetails { order, customer, products }))
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<OrderSummary>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_customer(&self, customer_id: i64) -> Result<Option<Customer>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let customer = customers::fetch_customer(customer_id, &mut conn).await?;
        Ok(customer)
    }

    async fn fetch_customer_by_phone(&self, phone: &str) -> Result<Option<Customer>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let customer = customers::fetch_customer_by_phone(phone, &mut conn).await?;
        Ok(customer)
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }
}

impl PosDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn ping(&self) -> Result<(), OrderFlowError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_order(&self, order: NewOrder, total_amount: Vnd) -> Result<OrderCreated, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        // Stock is reserved first, so that this transaction holds the write lock from its first statement.
        let mut updated_products: Vec<StockSnapshot> = Vec::with_capacity(order.lines.len());
        for line in &order.lines {
            match products::reserve_stock(line.product_id, line.quantity, &mut tx).await? {
                Some(snapshot) => {
                    updated_products.retain(|p| p.id != snapshot.id);
                    updated_products.push(snapshot);
                },
                None => {
                    let err = match products::fetch_product(line.product_id, &mut tx).await? {
                        None => OrderFlowError::ProductNotFound(line.product_id),
                        Some(p) => OrderFlowError::InsufficientStock {
                            product_id: p.id,
                            product: p.name,
                            requested: line.quantity,
                            available: p.stock_quantity,
                        },
                    };
                    debug!("🗃️ Order for {} rejected. {err}", order.phone);
                    return Err(err);
                },
            }
        }
        let (customer, _) = customers::fetch_or_create_customer(&order.phone, order.name.as_deref(), &mut tx).await?;
        let new_order =
            orders::insert_order(customer.id, total_amount, order.payment_method, order.note, &mut tx).await?;
        let lines = orders::insert_order_lines(new_order.id, &order.lines, &mut tx).await?;
        tx.commit().await?;
        debug!(
            "🗃️ Order #{} saved for customer #{} with {} lines. Status: {}",
            new_order.id,
            customer.id,
            lines.len(),
            new_order.payment_status
        );
        Ok(OrderCreated { order: new_order, customer, lines, updated_products })
    }

    async fn cancel_order(&self, order_id: i64) -> Result<OrderCancelled, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let cancelled =
            orders::transition_status(order_id, PaymentStatus::Pending, PaymentStatus::Cancelled, &mut tx).await?;
        let order = match cancelled {
            Some(order) => order,
            None => {
                let current = orders::fetch_order(order_id, &mut tx).await?;
                return Err(match current {
                    None => OrderFlowError::OrderNotFound(order_id),
                    Some(o) => {
                        OrderFlowError::InvalidState { order_id, status: o.payment_status, action: "cancelled" }
                    },
                });
            },
        };
        let restored = products::restore_stock_for_order(order_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{order_id} cancelled. Stock restored for {} products", restored.len());
        Ok(OrderCancelled { order, restored })
    }
}

impl PaymentLedger for SqliteDatabase {
    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let row = transactions::insert_transaction(transaction, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Ledger row {} recorded for order #{} ({})", row.app_trans_id, row.order_id, row.status);
        Ok(row)
    }

    async fn fetch_transaction(&self, app_trans_id: &str) -> Result<Option<Transaction>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let tx = transactions::fetch_transaction(app_trans_id, &mut conn).await?;
        Ok(tx)
    }

    async fn fetch_transactions_for_order(&self, order_id: i64) -> Result<Vec<Transaction>, OrderFlowError> {
        let query = TransactionQueryFilter::default().with_order_id(order_id);
        self.search_transactions(query).await
    }

    async fn attach_provider_token(
        &self,
        app_trans_id: &str,
        provider_token: &str,
    ) -> Result<Option<Transaction>, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let row = transactions::set_provider_token(app_trans_id, provider_token, &mut tx).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn discard_pending_transaction(&self, app_trans_id: &str) -> Result<bool, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let removed = transactions::delete_pending(app_trans_id, &mut tx).await?;
        tx.commit().await?;
        if removed {
            debug!("🗃️ Pending ledger row {app_trans_id} discarded");
        }
        Ok(removed)
    }

    async fn search_transactions(&self, query: TransactionQueryFilter) -> Result<Vec<Transaction>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        let result = transactions::search_transactions(query, &mut conn).await?;
        Ok(result)
    }

    async fn settle_wallet_payment(
        &self,
        settlement: WalletSettlement,
    ) -> Result<WalletSettlementResult, OrderFlowError> {
        let WalletSettlement { app_trans_id, order_hint, settlement_id, amount, paid_at } = settlement;
        let mut tx = self.pool.begin().await?;
        let settled = transactions::settle_pending(&app_trans_id, &settlement_id, paid_at, &mut tx).await?;
        let transaction = match settled {
            Some(t) => t,
            None => match transactions::fetch_transaction(&app_trans_id, &mut tx).await? {
                Some(existing) if existing.status == TransactionStatus::Success => {
                    trace!("🗃️ Ledger row {app_trans_id} was already settled");
                    return Ok(WalletSettlementResult::AlreadySettled { transaction: existing });
                },
                Some(existing) => {
                    return Ok(WalletSettlementResult::DuplicatePayment { order_id: existing.order_id, app_trans_id });
                },
                None => {
                    let Some(order_id) = order_hint else {
                        return Ok(WalletSettlementResult::Unmatched);
                    };
                    if orders::fetch_order(order_id, &mut tx).await?.is_none() {
                        return Ok(WalletSettlementResult::Unmatched);
                    }
                    if transactions::has_successful_payment(order_id, &mut tx).await? {
                        return Ok(WalletSettlementResult::DuplicatePayment { order_id, app_trans_id });
                    }
                    info!("🗃️ No ledger row for {app_trans_id}. Recording it against order #{order_id}");
                    let recovered = NewTransaction::pending(order_id, app_trans_id, PaymentMethod::Wallet, amount)
                        .with_description("Recorded from wallet callback")
                        .settled(Some(settlement_id), paid_at);
                    transactions::insert_transaction(recovered, &mut tx).await?
                },
            },
        };
        let order_id = transaction.order_id;
        let result = match orders::transition_status(order_id, PaymentStatus::Pending, PaymentStatus::Paid, &mut tx)
            .await?
        {
            Some(order) => WalletSettlementResult::Paid { order, transaction },
            None => {
                let status = orders::fetch_order(order_id, &mut tx)
                    .await?
                    .map(|o| o.payment_status)
                    .ok_or(OrderFlowError::OrderNotFound(order_id))?;
                WalletSettlementResult::OrderNotPending { transaction, status }
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn settle_bank_transfer(
        &self,
        transfer: BankTransfer,
        tolerance: Vnd,
    ) -> Result<BankSettlementResult, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let paid = orders::pay_best_bank_match(transfer.amount, tolerance, &transfer.transaction_id, &mut tx).await?;
        let Some(order) = paid else {
            let previous = transactions::fetch_transaction(&transfer.transaction_id, &mut tx).await?;
            return Ok(match previous {
                Some(transaction) => BankSettlementResult::Replayed { transaction },
                None => BankSettlementResult::NoMatch,
            });
        };
        let ledger_row =
            NewTransaction::pending(order.id, transfer.transaction_id.clone(), PaymentMethod::BankTransfer, transfer.amount)
                .with_description(transfer.ledger_description())
                .settled(Some(transfer.transaction_id.clone()), Utc::now());
        // The ledger row is best-effort. Failing to write it must not undo the payment.
        let mut savepoint = Connection::begin(&mut *tx).await?;
        let transaction = match transactions::insert_transaction(ledger_row, &mut savepoint).await {
            Ok(t) => {
                savepoint.commit().await?;
                Some(t)
            },
            Err(e) => {
                warn!("🗃️ Order #{} is paid, but the bank transfer could not be recorded in the ledger. {e}", order.id);
                savepoint.rollback().await?;
                None
            },
        };
        let ambiguous_matches = orders::pending_bank_matches(transfer.amount, tolerance, &mut tx).await?;
        tx.commit().await?;
        Ok(BankSettlementResult::Paid { order, transaction, ambiguous_matches })
    }
}
