use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Customer, Role},
    traits::OrderFlowError,
};

pub async fn fetch_customer(id: i64, conn: &mut SqliteConnection) -> Result<Option<Customer>, sqlx::Error> {
    let customer = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(customer)
}

/// Phone numbers are not unique in the schema. The oldest matching record is treated as the customer.
pub async fn fetch_customer_by_phone(phone: &str, conn: &mut SqliteConnection) -> Result<Option<Customer>, sqlx::Error> {
    let customer = sqlx::query_as("SELECT * FROM users WHERE phone = $1 ORDER BY id ASC LIMIT 1")
        .bind(phone)
        .fetch_optional(conn)
        .await?;
    Ok(customer)
}

pub async fn insert_customer(
    name: &str,
    phone: &str,
    role: Role,
    conn: &mut SqliteConnection,
) -> Result<Customer, sqlx::Error> {
    let customer = sqlx::query_as("INSERT INTO users (name, phone, role) VALUES ($1, $2, $3) RETURNING *")
        .bind(name)
        .bind(phone)
        .bind(role)
        .fetch_one(conn)
        .await?;
    Ok(customer)
}

/// Finds the customer for `phone`, or creates one with the `customer` role.
///
/// A name is only needed when the phone number has not been seen before. Returns the customer and whether it was
/// created by this call.
pub async fn fetch_or_create_customer(
    phone: &str,
    name: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<(Customer, bool), OrderFlowError> {
    if let Some(customer) = fetch_customer_by_phone(phone, conn).await? {
        return Ok((customer, false));
    }
    let name = name.map(str::trim).filter(|n| !n.is_empty()).ok_or_else(|| {
        OrderFlowError::ValidationError(format!("{phone} is a new customer, so a name is required"))
    })?;
    let customer = insert_customer(name, phone, Role::Customer, conn).await?;
    debug!("🗃️ New customer #{} created for {phone}", customer.id);
    Ok((customer, true))
}
