use serde_json::{Map, Number, Value};
use sqlx::{QueryBuilder, Row, Sqlite, sqlite::SqliteRow};
use tokio::sync::Mutex;

use crate::{
    db::{DbPool, book_tables::BookTable},
    error::{InventoryError, Result},
    models::{
        address::ResourceAddress,
        book::{Book, BookFields, Column, ColumnType},
        query::{Filter, Projection, SortOrder, push_value},
    },
    services::notification_hub::SharedNotificationHub,
};

/// A projected row: column name to JSON value, holding only the requested columns.
pub type Record = Map<String, Value>;

/// Book store for database operations
///
/// Reads run concurrently on the pool. Writes are serialized through a single
/// lock that is held until the change notification has been queued, so
/// notifications for one address arrive in commit order.
pub struct BookStore {
    pool: DbPool,
    write_lock: Mutex<()>,
    hub: SharedNotificationHub,
}

impl BookStore {
    /// Create a new BookStore with the provided database pool
    pub fn new(pool: DbPool, hub: SharedNotificationHub) -> Self {
        Self {
            pool,
            write_lock: Mutex::new(()),
            hub,
        }
    }

    pub fn hub(&self) -> &SharedNotificationHub {
        &self.hub
    }

    /// Fetch the projected columns of every row the address and filter select.
    pub async fn query(
        &self,
        address: &ResourceAddress,
        projection: &Projection,
        filter: Option<&Filter>,
        sort: Option<&SortOrder>,
    ) -> Result<Vec<Record>> {
        let columns = projection.columns();

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT ");
        push_column_list(&mut builder, &columns);
        builder.push(" FROM ").push(BookTable::TABLE_NAME);
        push_selection(&mut builder, address, filter)?;
        sort.cloned().unwrap_or_default().push_sql(&mut builder);

        let rows = builder.build().fetch_all(&self.pool).await?;
        tracing::debug!("Query on {} returned {} rows", address, rows.len());

        rows.iter().map(|row| decode_record(row, &columns)).collect()
    }

    /// Fetch full book rows the address and filter select.
    pub async fn query_books(
        &self,
        address: &ResourceAddress,
        filter: Option<&Filter>,
        sort: Option<&SortOrder>,
    ) -> Result<Vec<Book>> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT ");
        push_column_list(&mut builder, &Column::ALL);
        builder.push(" FROM ").push(BookTable::TABLE_NAME);
        push_selection(&mut builder, address, filter)?;
        sort.cloned().unwrap_or_default().push_sql(&mut builder);

        let books = builder
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    /// Insert a new row from the supplied fields and return its id.
    ///
    /// Absent fields take the column defaults. Callers validate first.
    pub async fn insert(&self, fields: &BookFields) -> Result<u64> {
        let present = fields.present();

        let mut builder = QueryBuilder::<Sqlite>::new("INSERT INTO ");
        builder.push(BookTable::TABLE_NAME);
        if present.is_empty() {
            builder.push(" DEFAULT VALUES");
        } else {
            builder.push(" (");
            let columns: Vec<Column> = present.iter().map(|(column, _)| *column).collect();
            push_column_list(&mut builder, &columns);
            builder.push(") VALUES (");
            for (index, (_, value)) in present.iter().enumerate() {
                if index > 0 {
                    builder.push(", ");
                }
                push_value(&mut builder, value);
            }
            builder.push(")");
        }

        let _guard = self.write_lock.lock().await;
        let result = builder.build().execute(&self.pool).await.map_err(|e| {
            tracing::error!("Failed to insert book: {}", e);
            InventoryError::StoreWriteFailure(e)
        })?;

        let id = u64::try_from(result.last_insert_rowid()).map_err(|_| {
            InventoryError::StoreWriteFailure(sqlx::Error::Protocol(format!(
                "negative row id {}",
                result.last_insert_rowid()
            )))
        })?;

        tracing::debug!("Inserted book {}", id);
        self.hub.publish(ResourceAddress::Collection).await;

        Ok(id)
    }

    /// Write the supplied fields to every selected row that differs from them.
    ///
    /// Returns the number of rows actually changed. Rows already holding the
    /// supplied values are neither rewritten nor counted.
    pub async fn update(
        &self,
        address: &ResourceAddress,
        fields: &BookFields,
        filter: Option<&Filter>,
    ) -> Result<u64> {
        let present = fields.present();
        if present.is_empty() {
            return Ok(0);
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE ");
        builder.push(BookTable::TABLE_NAME).push(" SET ");
        for (index, (column, value)) in present.iter().enumerate() {
            if index > 0 {
                builder.push(", ");
            }
            builder.push(column.name()).push(" = ");
            push_value(&mut builder, value);
        }

        let narrowed = push_selection(&mut builder, address, filter)?;
        builder.push(if narrowed { " AND (" } else { " WHERE (" });
        for (index, (column, value)) in present.iter().enumerate() {
            if index > 0 {
                builder.push(" OR ");
            }
            builder.push(column.name()).push(" IS NOT ");
            push_value(&mut builder, value);
        }
        builder.push(")");

        let _guard = self.write_lock.lock().await;
        let result = builder.build().execute(&self.pool).await.map_err(|e| {
            tracing::error!("Failed to update {}: {}", address, e);
            InventoryError::StoreWriteFailure(e)
        })?;

        let rows = result.rows_affected();
        tracing::debug!("Updated {} rows for {}", rows, address);
        if rows > 0 {
            self.hub.publish(*address).await;
        }

        Ok(rows)
    }

    /// Delete every selected row and return how many were removed.
    pub async fn delete(&self, address: &ResourceAddress, filter: Option<&Filter>) -> Result<u64> {
        let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM ");
        builder.push(BookTable::TABLE_NAME);
        push_selection(&mut builder, address, filter)?;

        let _guard = self.write_lock.lock().await;
        let result = builder.build().execute(&self.pool).await.map_err(|e| {
            tracing::error!("Failed to delete {}: {}", address, e);
            InventoryError::StoreWriteFailure(e)
        })?;

        let rows = result.rows_affected();
        tracing::debug!("Deleted {} rows for {}", rows, address);
        if rows > 0 {
            self.hub.publish(*address).await;
        }

        Ok(rows)
    }
}

fn push_column_list(builder: &mut QueryBuilder<'_, Sqlite>, columns: &[Column]) {
    let mut separated = builder.separated(", ");
    for column in columns {
        separated.push(column.name());
    }
}

/// Append the WHERE clause for `address` and `filter`. Returns whether one was written.
fn push_selection(
    builder: &mut QueryBuilder<'_, Sqlite>,
    address: &ResourceAddress,
    filter: Option<&Filter>,
) -> Result<bool> {
    let mut narrowed = false;

    if let ResourceAddress::Item(id) = address {
        let id = i64::try_from(*id)
            .map_err(|_| InventoryError::UnsupportedAddress(format!("item id {}", id)))?;
        builder
            .push(" WHERE ")
            .push(BookTable::COLUMN_ID)
            .push(" = ")
            .push_bind(id);
        narrowed = true;
    }

    if let Some(filter) = filter {
        builder.push(if narrowed { " AND " } else { " WHERE " });
        filter.push_sql(builder);
        narrowed = true;
    }

    Ok(narrowed)
}

fn decode_record(row: &SqliteRow, columns: &[Column]) -> Result<Record> {
    let mut record = Map::new();
    for column in columns {
        let name = column.name();
        let value = match column.column_type() {
            ColumnType::Integer => row.try_get::<Option<i64>, _>(name)?.map(Value::from),
            ColumnType::Real => row
                .try_get::<Option<f64>, _>(name)?
                .and_then(Number::from_f64)
                .map(Value::Number),
            ColumnType::Text => row.try_get::<Option<String>, _>(name)?.map(Value::String),
        };
        record.insert(name.to_string(), value.unwrap_or(Value::Null));
    }
    Ok(record)
}
