use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewOrderLine, Order, OrderLine, PaymentMethod, PaymentStatus, Vnd},
    order_objects::{OrderLineView, OrderQueryFilter, OrderSummary},
};

/// Inserts a new order row using the given connection. This is not atomic. Embed the call in a transaction along with
/// [`insert_order_lines`] and pass `&mut tx` as the connection argument.
pub async fn insert_order(
    user_id: i64,
    total_amount: Vnd,
    payment_method: PaymentMethod,
    note: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                user_id,
                total_amount,
                payment_method,
                payment_status,
                note
            ) VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(total_amount)
    .bind(payment_method)
    .bind(payment_method.initial_status())
    .bind(note)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

/// Inserts all the lines of an order as a single batch.
pub async fn insert_order_lines(
    order_id: i64,
    lines: &[NewOrderLine],
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderLine>, sqlx::Error> {
    if lines.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "INSERT INTO order_details (order_id, product_id, product_name, quantity, price_at_order, \
         discount_percent_at_order) ",
    );
    builder.push_values(lines, |mut row, line| {
        row.push_bind(order_id)
            .push_bind(line.product_id)
            .push_bind(line.product_name.clone())
            .push_bind(line.quantity)
            .push_bind(line.price_at_order)
            .push_bind(line.discount_percent_at_order);
    });
    builder.push(" RETURNING *");
    let lines = builder.build_query_as::<OrderLine>().fetch_all(conn).await?;
    trace!("🗃️ {} lines saved for order #{order_id}", lines.len());
    Ok(lines)
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_lines(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderLine>, sqlx::Error> {
    let lines = sqlx::query_as("SELECT * FROM order_details WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(lines)
}

/// Order lines joined with the product's current image. Lines whose product has since vanished are still returned.
pub async fn fetch_order_line_views(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderLineView>, sqlx::Error> {
    let lines = sqlx::query_as(
        r#"
            SELECT
                d.product_id,
                d.product_name AS name,
                d.quantity,
                d.price_at_order AS price,
                d.discount_percent_at_order AS discount_percent,
                p.image_url
            FROM order_details d
            LEFT JOIN products p ON p.id = d.product_id
            WHERE d.order_id = $1
            ORDER BY d.id
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(lines)
}

/// Moves an order from `from` to `to`, but only if it is currently in `from`. This is the only way order status
/// changes, so concurrent transitions can never both succeed.
///
/// Returns `None` if the order does not exist or is not in `from`.
pub async fn transition_status(
    id: i64,
    from: PaymentStatus,
    to: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET payment_status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND payment_status = $3
            RETURNING *;
        "#,
    )
    .bind(to)
    .bind(id)
    .bind(from)
    .fetch_optional(conn)
    .await?;
    if order.is_some() {
        debug!("🗃️ Order #{id} moved from {from} to {to}");
    }
    Ok(order)
}

/// Marks the most recently created pending bank-transfer order whose total is within `tolerance` of `amount` as paid,
/// in one statement. Orders created in the same second are ordered by id.
///
/// If `transaction_id` is already in the ledger the statement changes nothing, so a replayed notification can never
/// pay a second order.
pub async fn pay_best_bank_match(
    amount: Vnd,
    tolerance: Vnd,
    transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET payment_status = 'paid', updated_at = CURRENT_TIMESTAMP
            WHERE id = (
                SELECT id FROM orders
                WHERE payment_method = 'bank_transfer'
                  AND payment_status = 'pending'
                  AND ABS(total_amount - $1) <= $2
                ORDER BY created_at DESC, id DESC
                LIMIT 1
            )
            AND payment_status = 'pending'
            AND NOT EXISTS (SELECT 1 FROM transactions WHERE app_trans_id = $3)
            RETURNING *;
        "#,
    )
    .bind(amount)
    .bind(tolerance)
    .bind(transaction_id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Ids of pending bank-transfer orders within `tolerance` of `amount`, newest first.
pub async fn pending_bank_matches(
    amount: Vnd,
    tolerance: Vnd,
    conn: &mut SqliteConnection,
) -> Result<Vec<i64>, sqlx::Error> {
    let ids: Vec<(i64,)> = sqlx::query_as(
        r#"
            SELECT id FROM orders
            WHERE payment_method = 'bank_transfer'
              AND payment_status = 'pending'
              AND ABS(total_amount - $1) <= $2
            ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(amount)
    .bind(tolerance)
    .fetch_all(conn)
    .await?;
    Ok(ids.into_iter().map(|(id,)| id).collect())
}

/// Fetches order summaries according to the criteria in the `OrderQueryFilter`.
///
/// Results are ordered by `created_at`, newest first.
pub async fn search_orders(
    query: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderSummary>, sqlx::Error> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
    SELECT
        o.id AS order_id,
        o.created_at,
        o.total_amount,
        o.payment_method,
        o.payment_status,
        o.note,
        u.id AS customer_id,
        u.name AS customer_name,
        u.phone AS customer_phone,
        (SELECT COUNT(*) FROM order_details d WHERE d.order_id = o.id) AS product_count
    FROM orders o
    JOIN users u ON u.id = o.user_id
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(cid) = query.customer_id {
        where_clause.push("o.user_id = ");
        where_clause.push_bind_unseparated(cid);
    }
    if let Some(method) = query.payment_method {
        where_clause.push("o.payment_method = ");
        where_clause.push_bind_unseparated(method);
    }
    if let Some(statuses) = query.payment_status.filter(|s| !s.is_empty()) {
        where_clause.push("o.payment_status IN (");
        for (i, status) in statuses.into_iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status);
        }
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("datetime(o.created_at) >= datetime(");
        where_clause.push_bind_unseparated(since);
        where_clause.push_unseparated(")");
    }
    if let Some(until) = query.until {
        where_clause.push("datetime(o.created_at) <= datetime(");
        where_clause.push_bind_unseparated(until);
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY o.created_at DESC, o.id DESC");
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }

    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<OrderSummary>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {:?}", orders.len());
    Ok(orders)
}
