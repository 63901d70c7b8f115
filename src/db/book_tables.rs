/// Provides constants and utilities for working with
/// the "books" database table.
pub struct BookTable;

impl BookTable {
    /// The name of the database table
    pub const TABLE_NAME: &'static str = "books";

    /// The path segment addressing the table in resource addresses.
    pub const PATH: &'static str = "books";

    /// Schema upgrade steps. Entry `n` moves a version `n + 1` schema to `n + 2`.
    pub const MIGRATIONS: &'static [&'static str] = &[];

    /// Current schema version, stored in `PRAGMA user_version`.
    pub const SCHEMA_VERSION: i64 = 1 + Self::MIGRATIONS.len() as i64;

    /// The column name for the primary key identifier of a book.
    pub const COLUMN_ID: &'static str = "id";

    /// The column name for the title of the book.
    pub const COLUMN_TITLE: &'static str = "title";

    /// The column name for the author of the book.
    pub const COLUMN_AUTHOR: &'static str = "author";

    /// The column name for the unit price (stored as REAL).
    pub const COLUMN_PRICE: &'static str = "price";

    /// The column name for the stock quantity (stored as INTEGER).
    pub const COLUMN_QUANTITY: &'static str = "quantity";

    /// The column name for the supplier's name.
    pub const COLUMN_SUPPLIER_NAME: &'static str = "supplier_name";

    /// The column name for the supplier's email address. May be empty.
    pub const COLUMN_SUPPLIER_EMAIL: &'static str = "supplier_email";

    /// The column name for the supplier's phone number.
    pub const COLUMN_SUPPLIER_PHONE: &'static str = "supplier_phone";

    /// SQL statement for creating the books table with the defined schema.
    pub fn create_table() -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                {} INTEGER PRIMARY KEY AUTOINCREMENT,
                {} TEXT NOT NULL,
                {} TEXT NOT NULL,
                {} REAL NOT NULL DEFAULT 0.00,
                {} INTEGER NOT NULL DEFAULT 0,
                {} TEXT NOT NULL,
                {} TEXT NOT NULL DEFAULT '',
                {} TEXT NOT NULL
            )",
            Self::TABLE_NAME,
            Self::COLUMN_ID,
            Self::COLUMN_TITLE,
            Self::COLUMN_AUTHOR,
            Self::COLUMN_PRICE,
            Self::COLUMN_QUANTITY,
            Self::COLUMN_SUPPLIER_NAME,
            Self::COLUMN_SUPPLIER_EMAIL,
            Self::COLUMN_SUPPLIER_PHONE
        )
    }

    /// SQL statement for dropping the books table.
    pub fn drop_table() -> String {
        format!("DROP TABLE IF EXISTS {}", Self::TABLE_NAME)
    }
}
