use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::db::book_tables::BookTable;
use crate::error::InventoryError;

/// A stored book row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub price: f64,
    pub quantity: i64,
    pub supplier_name: String,
    pub supplier_email: String,
    pub supplier_phone: String,
}

/// A partial book record: only the fields that are present are written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BookFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_phone: Option<String>,
}

/// A single bindable column value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl BookFields {
    pub fn is_empty(&self) -> bool {
        self.present().is_empty()
    }

    /// The supplied fields, in column order.
    pub fn present(&self) -> Vec<(Column, FieldValue)> {
        let mut fields = Vec::new();
        let text = |value: &Option<String>| value.clone().map(FieldValue::Text);

        let candidates = [
            (Column::Title, text(&self.title)),
            (Column::Author, text(&self.author)),
            (Column::Price, self.price.map(FieldValue::Real)),
            (Column::Quantity, self.quantity.map(FieldValue::Integer)),
            (Column::SupplierName, text(&self.supplier_name)),
            (Column::SupplierEmail, text(&self.supplier_email)),
            (Column::SupplierPhone, text(&self.supplier_phone)),
        ];
        for (column, value) in candidates {
            if let Some(value) = value {
                fields.push((column, value));
            }
        }
        fields
    }

    /// Apply the supplied fields on top of `book`.
    pub fn apply_to(&self, book: &Book) -> Book {
        let mut updated = book.clone();
        if let Some(title) = &self.title {
            updated.title = title.clone();
        }
        if let Some(author) = &self.author {
            updated.author = author.clone();
        }
        if let Some(price) = self.price {
            updated.price = price;
        }
        if let Some(quantity) = self.quantity {
            updated.quantity = quantity;
        }
        if let Some(name) = &self.supplier_name {
            updated.supplier_name = name.clone();
        }
        if let Some(email) = &self.supplier_email {
            updated.supplier_email = email.clone();
        }
        if let Some(phone) = &self.supplier_phone {
            updated.supplier_phone = phone.clone();
        }
        updated
    }
}

/// Storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

/// The columns of the books table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Id,
    Title,
    Author,
    Price,
    Quantity,
    SupplierName,
    SupplierEmail,
    SupplierPhone,
}

impl Column {
    pub const ALL: [Column; 8] = [
        Column::Id,
        Column::Title,
        Column::Author,
        Column::Price,
        Column::Quantity,
        Column::SupplierName,
        Column::SupplierEmail,
        Column::SupplierPhone,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Column::Id => BookTable::COLUMN_ID,
            Column::Title => BookTable::COLUMN_TITLE,
            Column::Author => BookTable::COLUMN_AUTHOR,
            Column::Price => BookTable::COLUMN_PRICE,
            Column::Quantity => BookTable::COLUMN_QUANTITY,
            Column::SupplierName => BookTable::COLUMN_SUPPLIER_NAME,
            Column::SupplierEmail => BookTable::COLUMN_SUPPLIER_EMAIL,
            Column::SupplierPhone => BookTable::COLUMN_SUPPLIER_PHONE,
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Column::Id | Column::Quantity => ColumnType::Integer,
            Column::Price => ColumnType::Real,
            Column::Title
            | Column::Author
            | Column::SupplierName
            | Column::SupplierEmail
            | Column::SupplierPhone => ColumnType::Text,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .into_iter()
            .find(|column| column.name() == s)
            .ok_or_else(|| InventoryError::BadRequest(format!("Unknown column: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_fields_follow_column_order() {
        let fields = BookFields {
            quantity: Some(2),
            title: Some("Dune".into()),
            ..Default::default()
        };
        assert_eq!(
            fields.present(),
            vec![
                (Column::Title, FieldValue::Text("Dune".into())),
                (Column::Quantity, FieldValue::Integer(2)),
            ]
        );
        assert!(BookFields::default().is_empty());
    }

    #[test]
    fn partial_json_leaves_missing_fields_absent() {
        let fields: BookFields = serde_json::from_str(r#"{"quantity": 4}"#).unwrap();
        assert_eq!(fields.quantity, Some(4));
        assert_eq!(fields.title, None);

        let unknown = serde_json::from_str::<BookFields>(r#"{"isbn": "123"}"#);
        assert!(unknown.is_err());
    }

    #[test]
    fn column_names_round_trip() {
        for column in Column::ALL {
            assert_eq!(column.name().parse::<Column>().unwrap(), column);
        }
        assert!("_id".parse::<Column>().is_err());
    }
}
