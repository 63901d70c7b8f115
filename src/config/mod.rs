use std::env;
use std::time::Duration;

use crate::db::book_tables::BookTable;
use crate::models::address::AddressScheme;

pub const DEFAULT_AUTHORITY: &str = "com.example.android.inventory";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub authority: String,
    pub max_pool_size: u32,
    pub acquire_timeout_secs: u64,
    /// Drop and recreate the books table every time the store is opened.
    pub reset_on_open: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            database_path: "bookstore.db".to_string(),
            authority: DEFAULT_AUTHORITY.to_string(),
            max_pool_size: 5,
            acquire_timeout_secs: 3,
            reset_on_open: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        Ok(Self {
            port: parse_var("PORT", defaults.port, ConfigError::InvalidPort)?,
            database_path: env::var("DATABASE_PATH").unwrap_or(defaults.database_path),
            authority: env::var("INVENTORY_AUTHORITY").unwrap_or(defaults.authority),
            max_pool_size: parse_var(
                "MAX_POOL_SIZE",
                defaults.max_pool_size,
                ConfigError::InvalidNumber("MAX_POOL_SIZE"),
            )?,
            acquire_timeout_secs: parse_var(
                "DB_ACQUIRE_TIMEOUT",
                defaults.acquire_timeout_secs,
                ConfigError::InvalidNumber("DB_ACQUIRE_TIMEOUT"),
            )?,
            reset_on_open: match env::var("RESET_ON_OPEN") {
                Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag("RESET_ON_OPEN"))?,
                Err(_) => defaults.reset_on_open,
            },
        })
    }

    /// Address scheme for the books table under the configured authority.
    pub fn address_scheme(&self) -> AddressScheme {
        AddressScheme::new(&self.authority, BookTable::PATH)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn server_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T, err: ConfigError) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| err),
        Err(_) => Ok(default),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number")]
    InvalidPort,
    #[error("{0} must be a number")]
    InvalidNumber(&'static str),
    #[error("{0} must be a boolean flag")]
    InvalidFlag(&'static str),
}
