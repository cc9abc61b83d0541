//! Standalone inventory walkthrough against a local SQLite file.
//!
//! Exercises the `inventory` module end to end: first-run schema creation
//! and seeding, a valid order, an order rejected for insufficient stock,
//! an order for an unknown user, and the final revenue report. Runs
//! against `sample_database.db` in the working directory so repeated runs
//! accumulate orders.

use std::str::FromStr;

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use ecowatch_aqi::inventory;

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    let options =
        SqliteConnectOptions::from_str("sqlite://sample_database.db")?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    inventory::initialize(&pool).await?;

    print_inventory(&pool).await?;

    // One order that goes through, two that must roll back.
    demo_order(&pool, "alice_wonder", "Keyboard", 2).await;
    demo_order(&pool, "bob_builder", "Laptop", 50).await;
    demo_order(&pool, "fake_user_123", "Mouse", 1).await;

    print_sales_report(&pool).await?;

    Ok(())
}

// ---

async fn demo_order(pool: &SqlitePool, username: &str, product: &str, quantity: i64) {
    // ---
    println!("\n--- Processing Order: {username} wants {quantity} x {product} ---");
    match inventory::place_order(pool, username, product, quantity).await {
        Ok(receipt) => println!(
            "Success! Order placed for ${:.2}. New stock: {}",
            receipt.total_price, receipt.new_stock
        ),
        Err(e) => println!("Transaction failed: {e}"),
    }
}

async fn print_inventory(pool: &SqlitePool) -> Result<()> {
    // ---
    let products = inventory::list_products(pool).await?;

    println!("\n--- Current Inventory ---");
    println!(
        "{:<5} | {:<15} | {:<10} | {:<5}",
        "ID", "Name", "Price", "Stock"
    );
    println!("{}", "-".repeat(45));
    for p in products {
        println!(
            "{:<5} | {:<15} | ${:<9.2} | {:<5}",
            p.id, p.name, p.price, p.stock
        );
    }
    Ok(())
}

async fn print_sales_report(pool: &SqlitePool) -> Result<()> {
    // ---
    let report = inventory::sales_report(pool).await?;

    println!("\n--- Sales Report (Revenue by Product) ---");
    println!("{:<15} | {:<10} | {}", "Product", "Units Sold", "Revenue");
    println!("{}", "-".repeat(40));
    for line in report {
        println!(
            "{:<15} | {:<10} | ${:.2}",
            line.product, line.units_sold, line.revenue
        );
    }
    Ok(())
}
