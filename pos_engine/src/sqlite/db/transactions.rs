use chrono::{DateTime, Utc};
use log::trace;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewTransaction, Transaction},
    payment_objects::TransactionQueryFilter,
    traits::OrderFlowError,
};

/// Appends a row to the ledger. A taken correlation id is reported as
/// [`OrderFlowError::TransactionAlreadyExists`], and a dangling order reference as
/// [`OrderFlowError::OrderNotFound`].
pub async fn insert_transaction(
    transaction: NewTransaction,
    conn: &mut SqliteConnection,
) -> Result<Transaction, OrderFlowError> {
    let app_trans_id = transaction.app_trans_id.clone();
    let order_id = transaction.order_id;
    let result = sqlx::query_as(
        r#"
            INSERT INTO transactions (
                order_id,
                app_trans_id,
                channel,
                provider_token,
                amount,
                description,
                status,
                settlement_id,
                payment_time
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(transaction.order_id)
    .bind(transaction.app_trans_id)
    .bind(transaction.channel)
    .bind(transaction.provider_token)
    .bind(transaction.amount)
    .bind(transaction.description)
    .bind(transaction.status)
    .bind(transaction.settlement_id)
    .bind(transaction.payment_time)
    .fetch_one(conn)
    .await;
    match result {
        Ok(tx) => Ok(tx),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(OrderFlowError::TransactionAlreadyExists(app_trans_id))
        },
        Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => Err(OrderFlowError::OrderNotFound(order_id)),
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_transaction(
    app_trans_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let tx = sqlx::query_as("SELECT * FROM transactions WHERE app_trans_id = $1")
        .bind(app_trans_id)
        .fetch_optional(conn)
        .await?;
    Ok(tx)
}

/// Stores the provider's session token on an existing ledger row.
pub async fn set_provider_token(
    app_trans_id: &str,
    provider_token: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let tx = sqlx::query_as("UPDATE transactions SET provider_token = $1 WHERE app_trans_id = $2 RETURNING *")
        .bind(provider_token)
        .bind(app_trans_id)
        .fetch_optional(conn)
        .await?;
    Ok(tx)
}

/// Removes a ledger row, but only while it is still `pending`. Returns whether a row was removed.
pub async fn delete_pending(app_trans_id: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM transactions WHERE app_trans_id = $1 AND status = 'pending'")
        .bind(app_trans_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Settles the pending ledger row for `app_trans_id`, unless its order already has a successful row.
///
/// Returns `None` if there is no such pending row, or the order has already been paid through another row.
pub async fn settle_pending(
    app_trans_id: &str,
    settlement_id: &str,
    paid_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let tx = sqlx::query_as(
        r#"
            UPDATE transactions SET status = 'success', settlement_id = $1, payment_time = $2
            WHERE app_trans_id = $3
              AND status = 'pending'
              AND NOT EXISTS (
                  SELECT 1 FROM transactions t
                  WHERE t.order_id = transactions.order_id AND t.status = 'success'
              )
            RETURNING *;
        "#,
    )
    .bind(settlement_id)
    .bind(paid_at)
    .bind(app_trans_id)
    .fetch_optional(conn)
    .await?;
    Ok(tx)
}

pub async fn has_successful_payment(order_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM transactions WHERE order_id = $1 AND status = 'success')")
            .bind(order_id)
            .fetch_one(conn)
            .await?;
    Ok(exists)
}

/// Fetches ledger rows according to the criteria in the `TransactionQueryFilter`, newest first.
pub async fn search_transactions(
    query: TransactionQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Transaction>, sqlx::Error> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM transactions ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(order_id) = query.order_id {
        where_clause.push("order_id = ");
        where_clause.push_bind_unseparated(order_id);
    }
    if let Some(channel) = query.channel {
        where_clause.push("channel = ");
        where_clause.push_bind_unseparated(channel);
    }
    if let Some(status) = query.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status);
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    if let Some(limit) = query.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
    }
    trace!("🗃️ Executing query: {}", builder.sql());
    let transactions = builder.build_query_as::<Transaction>().fetch_all(conn).await?;
    Ok(transactions)
}
