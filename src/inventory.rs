//! Relational inventory walkthrough: users, products, orders.
//!
//! Self-contained demo schema driven by the `inventory_demo` binary. Order
//! placement is fully transactional: the stock decrement and the order row
//! commit together or not at all, and validation failures surface as typed
//! errors instead of partial writes.

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;

// ---

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("user '{0}' not found")]
    UnknownUser(String),

    #[error("product '{0}' not found")]
    UnknownProduct(String),

    #[error("insufficient stock for {product}: only {available} available")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub stock: i64,
}

/// One line of the revenue report.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SalesLine {
    pub product: String,
    pub units_sold: i64,
    pub revenue: f64,
}

/// Receipt for a successfully placed order.
#[derive(Debug, Clone)]
pub struct OrderReceipt {
    pub order_id: i64,
    pub total_price: f64,
    pub new_stock: i64,
}

// ---

/// Create the demo tables and seed them on first run.
///
/// Seeding is keyed off the users table so repeated runs against the same
/// database file reuse the existing data.
pub async fn initialize(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            username   TEXT NOT NULL UNIQUE,
            email      TEXT NOT NULL UNIQUE,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS products (
            id    INTEGER PRIMARY KEY AUTOINCREMENT,
            name  TEXT NOT NULL,
            price REAL NOT NULL,
            stock INTEGER DEFAULT 0
        )",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS orders (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id    INTEGER REFERENCES users(id),
            product_id INTEGER REFERENCES products(id),
            quantity   INTEGER,
            order_date TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(&mut *tx)
    .await?;

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&mut *tx)
        .await?;
    if users > 0 {
        tx.commit().await?;
        return Ok(());
    }

    // ---
    tracing::info!("Seeding inventory demo data");

    for (username, email) in [
        ("alice_wonder", "alice@example.com"),
        ("bob_builder", "bob@example.com"),
        ("charlie_dev", "charlie@example.com"),
    ] {
        sqlx::query("INSERT INTO users (username, email) VALUES (?1, ?2)")
            .bind(username)
            .bind(email)
            .execute(&mut *tx)
            .await?;
    }

    for (name, price, stock) in [
        ("Laptop", 999.99, 10_i64),
        ("Mouse", 25.50, 100),
        ("Keyboard", 45.00, 50),
        ("Monitor", 150.00, 30),
    ] {
        sqlx::query("INSERT INTO products (name, price, stock) VALUES (?1, ?2, ?3)")
            .bind(name)
            .bind(price)
            .bind(stock)
            .execute(&mut *tx)
            .await?;
    }

    // Historical orders, kept as-is for the sales report. Stock figures
    // reflect the count remaining after these sales.
    for (user_id, product_id, quantity) in
        [(1_i64, 1_i64, 1_i64), (1, 2, 2), (2, 3, 1), (3, 1, 1), (3, 4, 2)]
    {
        sqlx::query("INSERT INTO orders (user_id, product_id, quantity) VALUES (?1, ?2, ?3)")
            .bind(user_id)
            .bind(product_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Current product catalogue ordered by id.
pub async fn list_products(pool: &SqlitePool) -> Result<Vec<Product>, sqlx::Error> {
    // ---
    sqlx::query_as("SELECT id, name, price, stock FROM products ORDER BY id")
        .fetch_all(pool)
        .await
}

/// Place an order for a user, decrementing stock atomically.
///
/// The product is addressed by name. Every validation failure aborts the
/// transaction before commit, so a rejected order leaves stock and order
/// history untouched.
pub async fn place_order(
    pool: &SqlitePool,
    username: &str,
    product_name: &str,
    quantity: i64,
) -> Result<OrderReceipt, OrderError> {
    // ---
    let mut tx = pool.begin().await?;

    let user_id: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = ?1")
        .bind(username)
        .fetch_optional(&mut *tx)
        .await?;
    let user_id = user_id.ok_or_else(|| OrderError::UnknownUser(username.to_string()))?;

    let product: Option<Product> =
        sqlx::query_as("SELECT id, name, price, stock FROM products WHERE name = ?1")
            .bind(product_name)
            .fetch_optional(&mut *tx)
            .await?;
    let product =
        product.ok_or_else(|| OrderError::UnknownProduct(product_name.to_string()))?;

    if product.stock < quantity {
        // Dropping the transaction rolls it back.
        return Err(OrderError::InsufficientStock {
            product: product.name,
            available: product.stock,
            requested: quantity,
        });
    }

    let order_id =
        sqlx::query("INSERT INTO orders (user_id, product_id, quantity) VALUES (?1, ?2, ?3)")
            .bind(user_id)
            .bind(product.id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

    let new_stock = product.stock - quantity;
    sqlx::query("UPDATE products SET stock = ?1 WHERE id = ?2")
        .bind(new_stock)
        .bind(product.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!(
        "Order {} placed: {} x{} for {}",
        order_id,
        product.name,
        quantity,
        username
    );
    Ok(OrderReceipt {
        order_id,
        total_price: product.price * quantity as f64,
        new_stock,
    })
}

/// Revenue per product across all orders, highest earner first.
pub async fn sales_report(pool: &SqlitePool) -> Result<Vec<SalesLine>, sqlx::Error> {
    // ---
    sqlx::query_as(
        "SELECT p.name AS product,
                SUM(o.quantity) AS units_sold,
                SUM(o.quantity * p.price) AS revenue
         FROM orders o
         JOIN products p ON o.product_id = p.id
         GROUP BY p.name
         ORDER BY revenue DESC",
    )
    .fetch_all(pool)
    .await
}
