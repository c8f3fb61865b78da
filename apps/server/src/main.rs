//! # Tally Server
//!
//! ## Usage
//! ```bash
//! # In-memory demo data on 127.0.0.1:3000
//! cargo run -p tally-server
//!
//! # Explicit config file
//! cargo run -p tally-server -- --config ./tally.toml
//!
//! # SQLite, overriding the file through the environment
//! TALLY_STORE_BACKEND=sqlite TALLY_DATABASE_PATH=./tally.db cargo run -p tally-server
//! ```

use std::env;
use std::path::PathBuf;

use tally_server::{init_tracing, run, AppConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Tally ERP Server");
                println!();
                println!("Usage: tally-server [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  TOML config file (default: ./tally.toml or the config dir)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    init_tracing();

    let config = AppConfig::load(config_path)?;
    info!(
        addr = %config.server.bind_address(),
        backend = %config.store.backend,
        accrue_customer_sales = config.ledger.accrue_customer_sales,
        "Configuration loaded"
    );

    if let Err(e) = run(config).await {
        error!(error = %e, "Server failed");
        return Err(e.into());
    }
    Ok(())
}
