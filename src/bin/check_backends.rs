//! Utility to verify connectivity to both hosted backends and print the
//! row counts of each record collection.

use rust_fiscal_api::config::Config;
use rust_fiscal_api::db::Database;
use rust_fiscal_api::search_client::SearchIndexClient;

const COLLECTIONS: [&str; 6] = [
    "entities",
    "guarantors",
    "contacts",
    "addresses",
    "banks",
    "jobs",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    // Relational backend
    let db = Database::new(&config.database_url).await?;
    println!("Database: connected");

    for collection in COLLECTIONS {
        let sql = format!("SELECT COUNT(*) FROM {}", collection);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&db.pool).await?;
        println!("  - {}: {} rows", collection, count);
    }

    // Search index backend
    let search = SearchIndexClient::from_config(&config).map_err(|e| e.to_string())?;
    match search.health().await {
        Ok(true) => println!("Search index: reachable at {}", config.search_base_url),
        Ok(false) => println!("Search index: responded with non-success status"),
        Err(e) => println!("Search index: unreachable ({})", e),
    }

    Ok(())
}
