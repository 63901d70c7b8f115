use sqlx::{
    Pool, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::config::Config;
use crate::db::book_tables::BookTable;
use crate::error::{InventoryError, Result};

pub mod book_store;
pub mod book_tables;

pub type DbPool = Pool<Sqlite>;

/// Initialize the database connection pool
pub async fn init_db_pool(config: &Config) -> Result<DbPool> {
    // Create the database if it doesn't exist
    let options = SqliteConnectOptions::new()
        .filename(&config.database_path)
        .create_if_missing(true);

    // Create connection pool
    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_pool_size.max(1))
        .acquire_timeout(config.acquire_timeout())
        .connect_with(options)
        .await?;

    tracing::info!("Opened book database at {}", config.database_path);

    setup_database(&pool, config.reset_on_open).await?;

    Ok(pool)
}

/// Set up the database schema
///
/// Table creation is idempotent. When `reset` is set every existing row is
/// discarded by dropping and recreating the table.
pub async fn setup_database(pool: &DbPool, reset: bool) -> Result<()> {
    if reset {
        tracing::warn!("Resetting {} table on open", BookTable::TABLE_NAME);
        sqlx::query(&BookTable::drop_table()).execute(pool).await?;
        sqlx::query(&BookTable::create_table()).execute(pool).await?;
        set_schema_version(pool, BookTable::SCHEMA_VERSION).await?;
        return Ok(());
    }

    let found = schema_version(pool).await?;
    if found > BookTable::SCHEMA_VERSION {
        return Err(InventoryError::UnsupportedSchemaVersion {
            found,
            supported: BookTable::SCHEMA_VERSION,
        });
    }

    sqlx::query(&BookTable::create_table()).execute(pool).await?;

    if found == 0 {
        // Fresh or unversioned file
        set_schema_version(pool, BookTable::SCHEMA_VERSION).await?;
    } else if found < BookTable::SCHEMA_VERSION {
        migrate(pool, found, BookTable::SCHEMA_VERSION).await?;
    }

    Ok(())
}

/// Upgrade the schema from version `from` to version `to`.
///
/// Each entry of [`BookTable::MIGRATIONS`] moves the schema up one version;
/// all steps run in a single transaction together with the version bump.
pub async fn migrate(pool: &DbPool, from: i64, to: i64) -> Result<()> {
    let steps = usize::try_from(from - 1)
        .ok()
        .zip(usize::try_from(to - 1).ok())
        .and_then(|(start, end)| BookTable::MIGRATIONS.get(start..end))
        .ok_or(InventoryError::UnsupportedSchemaVersion {
            found: from,
            supported: BookTable::SCHEMA_VERSION,
        })?;

    let mut tx = pool.begin().await?;
    for (offset, step) in steps.iter().enumerate() {
        tracing::info!("Migrating books schema to version {}", from + offset as i64 + 1);
        sqlx::query(step).execute(&mut *tx).await?;
    }
    sqlx::query(&format!("PRAGMA user_version = {}", to))
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(())
}

pub async fn schema_version(pool: &DbPool) -> Result<i64> {
    let version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

async fn set_schema_version(pool: &DbPool, version: i64) -> Result<()> {
    sqlx::query(&format!("PRAGMA user_version = {}", version))
        .execute(pool)
        .await?;
    tracing::info!("Books schema at version {}", version);
    Ok(())
}
