pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod ws;


use std::sync::Arc;

use config::Config;
use db::book_store::BookStore;
use error::Result;
use services::{InventoryService, NotificationHub, SharedInventoryService};

/// Open the configured database and wire store, notification hub and service together.
pub async fn open_inventory(config: &Config) -> Result<SharedInventoryService> {
    let pool = db::init_db_pool(config).await?;
    let hub = Arc::new(NotificationHub::new());
    let store = Arc::new(BookStore::new(pool, hub));

    Ok(Arc::new(InventoryService::new(config.address_scheme(), store)))
}
