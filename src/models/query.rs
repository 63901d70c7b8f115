use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};

use crate::error::{InventoryError, Result};
use crate::models::book::{Column, FieldValue};

/// Which columns a query returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    All,
    Columns(Vec<Column>),
}

impl Projection {
    pub fn columns(&self) -> Vec<Column> {
        match self {
            Projection::All => Column::ALL.to_vec(),
            Projection::Columns(columns) if columns.is_empty() => Column::ALL.to_vec(),
            Projection::Columns(columns) => columns.clone(),
        }
    }

    /// Parse a comma separated column list, e.g. `title,price`.
    pub fn parse_list(list: &str) -> Result<Self> {
        let columns = list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(Column::from_str)
            .collect::<Result<Vec<_>>>()?;

        if columns.is_empty() {
            Ok(Projection::All)
        } else {
            Ok(Projection::Columns(columns))
        }
    }
}

/// Row filter. Column names come from [`Column`]; values are always bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    Eq(Column, FieldValue),
    Ne(Column, FieldValue),
    Gt(Column, FieldValue),
    Lt(Column, FieldValue),
    Ge(Column, FieldValue),
    Le(Column, FieldValue),
    Like(Column, String),
    IsNull(Column),
    NotNull(Column),
    And(Box<Filter>, Box<Filter>),
    Or(Box<Filter>, Box<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn eq(column: Column, value: impl Into<FieldValue>) -> Self {
        Filter::Eq(column, value.into())
    }

    pub fn gt(column: Column, value: impl Into<FieldValue>) -> Self {
        Filter::Gt(column, value.into())
    }

    pub fn lt(column: Column, value: impl Into<FieldValue>) -> Self {
        Filter::Lt(column, value.into())
    }

    pub fn like(column: Column, pattern: &str) -> Self {
        Filter::Like(column, pattern.to_string())
    }

    pub fn and(self, other: Filter) -> Self {
        Filter::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Filter) -> Self {
        Filter::Or(Box::new(self), Box::new(other))
    }

    pub fn negate(self) -> Self {
        Filter::Not(Box::new(self))
    }

    /// Append this filter as a parenthesized SQL expression.
    pub fn push_sql(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            Filter::Eq(column, value) => push_comparison(builder, column, " = ", value),
            Filter::Ne(column, value) => push_comparison(builder, column, " != ", value),
            Filter::Gt(column, value) => push_comparison(builder, column, " > ", value),
            Filter::Lt(column, value) => push_comparison(builder, column, " < ", value),
            Filter::Ge(column, value) => push_comparison(builder, column, " >= ", value),
            Filter::Le(column, value) => push_comparison(builder, column, " <= ", value),
            Filter::Like(column, pattern) => {
                builder
                    .push("(")
                    .push(column.name())
                    .push(" LIKE ")
                    .push_bind(pattern.clone())
                    .push(")");
            }
            Filter::IsNull(column) => {
                builder.push("(").push(column.name()).push(" IS NULL)");
            }
            Filter::NotNull(column) => {
                builder.push("(").push(column.name()).push(" IS NOT NULL)");
            }
            Filter::And(left, right) => {
                builder.push("(");
                left.push_sql(builder);
                builder.push(" AND ");
                right.push_sql(builder);
                builder.push(")");
            }
            Filter::Or(left, right) => {
                builder.push("(");
                left.push_sql(builder);
                builder.push(" OR ");
                right.push_sql(builder);
                builder.push(")");
            }
            Filter::Not(inner) => {
                builder.push("(NOT ");
                inner.push_sql(builder);
                builder.push(")");
            }
        }
    }
}

fn push_comparison(
    builder: &mut QueryBuilder<'_, Sqlite>,
    column: &Column,
    op: &str,
    value: &FieldValue,
) {
    builder.push("(").push(column.name()).push(op);
    push_value(builder, value);
    builder.push(")");
}

pub(crate) fn push_value(builder: &mut QueryBuilder<'_, Sqlite>, value: &FieldValue) {
    match value {
        FieldValue::Integer(value) => builder.push_bind(*value),
        FieldValue::Real(value) => builder.push_bind(*value),
        FieldValue::Text(value) => builder.push_bind(value.clone()),
    };
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Real(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    Desc,
}

/// Ordering of query results. Empty means ascending id, i.e. insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOrder(pub Vec<(Column, Direction)>);

impl SortOrder {
    pub fn by(column: Column, direction: Direction) -> Self {
        SortOrder(vec![(column, direction)])
    }

    pub fn then(mut self, column: Column, direction: Direction) -> Self {
        self.0.push((column, direction));
        self
    }

    /// Append the ORDER BY clause.
    pub fn push_sql(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        builder.push(" ORDER BY ");
        if self.0.is_empty() {
            builder.push(Column::Id.name()).push(" ASC");
            return;
        }

        let mut separated = builder.separated(", ");
        for (column, direction) in &self.0 {
            let direction = match direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            separated.push(format!("{} {}", column.name(), direction));
        }
    }
}

impl FromStr for SortOrder {
    type Err = InventoryError;

    /// Parses `price:desc,title` style lists; direction defaults to ascending.
    fn from_str(s: &str) -> Result<Self> {
        let mut order = SortOrder::default();
        for term in s.split(',').map(str::trim).filter(|term| !term.is_empty()) {
            let (name, direction) = match term.split_once(':') {
                Some((name, direction)) => (name, direction),
                None => (term, "asc"),
            };
            let direction = match direction.trim().to_ascii_lowercase().as_str() {
                "asc" => Direction::Asc,
                "desc" => Direction::Desc,
                other => {
                    return Err(InventoryError::BadRequest(format!(
                        "Unknown sort direction: {}",
                        other
                    )));
                }
            };
            order.0.push((name.trim().parse()?, direction));
        }
        Ok(order)
    }
}
