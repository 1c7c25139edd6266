use sqlx::SqliteConnection;

use crate::db_types::{NewProduct, Product, StockSnapshot};

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, sqlx::Error> {
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (
                category_id,
                name,
                description,
                price,
                discount_percent,
                image_url,
                manage_stock,
                stock_quantity
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(product.category_id)
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.discount_percent)
    .bind(product.image_url)
    .bind(product.manage_stock)
    .bind(product.stock_quantity)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}

/// Reserves `quantity` units of a product in one conditional statement.
///
/// Stock-managed products are decremented only if at least `quantity` units remain. Products that don't manage stock
/// always succeed and are left untouched. Returns `None` if the product does not exist or lacks stock; nothing is
/// changed in that case.
pub async fn reserve_stock(
    id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<StockSnapshot>, sqlx::Error> {
    let snapshot = sqlx::query_as(
        r#"
            UPDATE products
            SET stock_quantity = CASE WHEN manage_stock THEN stock_quantity - $1 ELSE stock_quantity END
            WHERE id = $2 AND (NOT manage_stock OR stock_quantity >= $1)
            RETURNING id, name, stock_quantity, manage_stock;
        "#,
    )
    .bind(quantity)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(snapshot)
}

/// Gives back the stock held by every stock-managed line of the order. Returns the new stock levels.
pub async fn restore_stock_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<StockSnapshot>, sqlx::Error> {
    let restored = sqlx::query_as(
        r#"
            UPDATE products
            SET stock_quantity = stock_quantity + (
                SELECT SUM(d.quantity) FROM order_details d WHERE d.order_id = $1 AND d.product_id = products.id
            )
            WHERE manage_stock AND id IN (SELECT product_id FROM order_details WHERE order_id = $1)
            RETURNING id, name, stock_quantity, manage_stock;
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(restored)
}
