//! # Seed Data Loader
//!
//! Writes the demo dataset into a SQLite database for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./tally_dev.db with the April 2024 demo
//! cargo run -p tally-db --bin seed
//!
//! # Another file, dated from a given day
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db --anchor 2024-09-01
//!
//! # Load records from a JSON dataset instead of the demo
//! cargo run -p tally-db --bin seed -- --file ./shop.json
//!
//! # Write the demo dataset as JSON (no database is touched)
//! cargo run -p tally-db --bin seed -- --export ./demo.json
//! ```
//!
//! An existing database that already holds customers, products or suppliers
//! is left untouched.

use chrono::NaiveDate;
use std::env;
use tally_db::{Database, DbConfig, MockDataset, Stores};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tally_dev.db");
    let mut anchor: Option<NaiveDate> = None;
    let mut file: Option<String> = None;
    let mut export: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--anchor" | "-a" => {
                if i + 1 < args.len() {
                    anchor = Some(args[i + 1].parse()?);
                    i += 1;
                }
            }
            "--file" | "-f" => {
                if i + 1 < args.len() {
                    file = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--export" | "-e" => {
                if i + 1 < args.len() {
                    export = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally ERP Seed Data Loader");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>          Database file path (default: ./tally_dev.db)");
                println!("  -a, --anchor <YYYY-MM-DD> First day of the demo period (default: 2024-04-01)");
                println!("  -f, --file <PATH>        Load a JSON dataset instead of the demo");
                println!("  -e, --export <PATH>      Write the demo dataset as JSON and exit");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let demo = || match anchor {
        Some(anchor) => MockDataset::demo_at(anchor),
        None => MockDataset::demo(),
    };

    if let Some(path) = export {
        std::fs::write(&path, demo()?.to_json()?)?;
        println!("✓ Demo dataset written to {}", path);
        return Ok(());
    }

    println!("Tally ERP Seed Data Loader");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let stores = Stores::sqlite(&db);
    if !stores.is_empty().await? {
        println!("⚠ Database already has master data");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let data = match &file {
        Some(path) => {
            println!("✓ Reading dataset from {}", path);
            MockDataset::from_json(&std::fs::read_to_string(path)?)?
        }
        None => demo()?,
    };
    let counts = [
        ("customers", data.customers.len()),
        ("products", data.products.len()),
        ("suppliers", data.suppliers.len()),
        ("supplier transactions", data.supplier_transactions.len()),
        ("purchases", data.purchases.len()),
        ("orders", data.orders.len()),
        ("sales", data.sales.len()),
    ];

    let start = std::time::Instant::now();
    stores.load(data).await?;

    println!();
    for (name, count) in counts {
        println!("  {:>3} {}", count, name);
    }
    println!();
    println!("✓ Seed complete in {:?}", start.elapsed());

    db.close().await;
    Ok(())
}
