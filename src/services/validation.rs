use lazy_regex::{Lazy, Regex, lazy_regex};

use crate::db::book_tables::BookTable;
use crate::error::{InventoryError, Result};
use crate::models::book::BookFields;

static EMAIL_REGEX: Lazy<Regex> = lazy_regex!(
    r"^[a-zA-Z0-9+._%\-]{1,256}@[a-zA-Z0-9][a-zA-Z0-9\-]{0,64}(\.[a-zA-Z0-9][a-zA-Z0-9\-]{0,25})+$"
);

/// Whether a record is being created or patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Every required field must be supplied.
    Create,
    /// Only supplied fields are checked.
    Update,
}

/// Check `fields` against the book invariants.
///
/// Fields are checked in column order and the first violation is returned.
/// An empty supplier email is accepted while an empty supplier phone is not.
pub fn validate(fields: &BookFields, mode: ValidationMode) -> Result<()> {
    require_text(BookTable::COLUMN_TITLE, fields.title.as_deref(), mode)?;
    require_text(BookTable::COLUMN_AUTHOR, fields.author.as_deref(), mode)?;

    if let Some(price) = fields.price {
        validate_price(price)?;
    }
    if let Some(quantity) = fields.quantity {
        validate_quantity(quantity)?;
    }

    require_text(BookTable::COLUMN_SUPPLIER_NAME, fields.supplier_name.as_deref(), mode)?;

    if let Some(email) = fields.supplier_email.as_deref() {
        validate_email(email)?;
    }

    require_text(BookTable::COLUMN_SUPPLIER_PHONE, fields.supplier_phone.as_deref(), mode)?;

    Ok(())
}

fn require_text(field: &'static str, value: Option<&str>, mode: ValidationMode) -> Result<()> {
    match (value, mode) {
        (Some(text), _) if text.is_empty() => Err(InventoryError::MissingRequiredField(field)),
        (Some(_), _) => Ok(()),
        (None, ValidationMode::Create) => Err(InventoryError::MissingRequiredField(field)),
        (None, ValidationMode::Update) => Ok(()),
    }
}

fn validate_price(price: f64) -> Result<()> {
    if !price.is_finite() {
        return Err(InventoryError::invalid_value(
            BookTable::COLUMN_PRICE,
            "price must be a finite number",
        ));
    }
    if price < 0.0 {
        return Err(InventoryError::invalid_value(
            BookTable::COLUMN_PRICE,
            "price must be greater than or equal to 0.00",
        ));
    }
    Ok(())
}

fn validate_quantity(quantity: i64) -> Result<()> {
    if quantity < 0 {
        return Err(InventoryError::invalid_value(
            BookTable::COLUMN_QUANTITY,
            "quantity must be greater than or equal to 0",
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() || EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(InventoryError::invalid_value(
            BookTable::COLUMN_SUPPLIER_EMAIL,
            format!("'{}' is not a valid email address", email),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dune() -> BookFields {
        BookFields {
            title: Some("Dune".into()),
            author: Some("Herbert".into()),
            price: Some(12.50),
            quantity: Some(3),
            supplier_name: Some("Ace".into()),
            supplier_email: None,
            supplier_phone: Some("555-0100".into()),
        }
    }

    fn assert_missing(result: Result<()>, expected: &str) {
        match result {
            Err(InventoryError::MissingRequiredField(field)) => assert_eq!(field, expected),
            other => panic!("Expected missing {}, got {:?}", expected, other),
        }
    }

    fn assert_invalid(result: Result<()>, expected: &str) {
        match result {
            Err(InventoryError::InvalidValue { field, .. }) => assert_eq!(field, expected),
            other => panic!("Expected invalid {}, got {:?}", expected, other),
        }
    }

    #[test]
    fn complete_record_is_valid_for_create() {
        assert!(validate(&dune(), ValidationMode::Create).is_ok());
    }

    #[test]
    fn price_and_quantity_are_optional_on_create() {
        let fields = BookFields {
            price: None,
            quantity: None,
            ..dune()
        };
        assert!(validate(&fields, ValidationMode::Create).is_ok());
    }

    #[test]
    fn create_requires_every_required_field() {
        let cases: [(&str, fn(&mut BookFields)); 4] = [
            ("title", |f: &mut BookFields| f.title = None),
            ("author", |f: &mut BookFields| f.author = None),
            ("supplier_name", |f: &mut BookFields| f.supplier_name = None),
            ("supplier_phone", |f: &mut BookFields| f.supplier_phone = None),
        ];
        for (field, clear) in cases {
            let mut fields = dune();
            clear(&mut fields);
            assert_missing(validate(&fields, ValidationMode::Create), field);
        }
    }

    #[test]
    fn empty_text_counts_as_missing() {
        let fields = BookFields {
            title: Some(String::new()),
            ..dune()
        };
        assert_missing(validate(&fields, ValidationMode::Create), "title");

        let fields = BookFields {
            supplier_phone: Some(String::new()),
            ..Default::default()
        };
        assert_missing(validate(&fields, ValidationMode::Update), "supplier_phone");
    }

    #[test]
    fn rejects_negative_numbers() {
        let fields = BookFields {
            price: Some(-1.0),
            ..dune()
        };
        assert_invalid(validate(&fields, ValidationMode::Create), "price");

        let fields = BookFields {
            price: Some(f64::NAN),
            ..Default::default()
        };
        assert_invalid(validate(&fields, ValidationMode::Update), "price");

        let fields = BookFields {
            quantity: Some(-3),
            ..Default::default()
        };
        assert_invalid(validate(&fields, ValidationMode::Update), "quantity");

        let fields = BookFields {
            price: Some(0.0),
            quantity: Some(0),
            ..Default::default()
        };
        assert!(validate(&fields, ValidationMode::Update).is_ok());
    }

    #[test]
    fn email_may_be_empty_but_not_malformed() {
        let empty = BookFields {
            supplier_email: Some(String::new()),
            ..dune()
        };
        assert!(validate(&empty, ValidationMode::Create).is_ok());

        for email in ["orders@ace.com", "a.b+c@sub.example.co.uk", "x_y%z@a-b.io"] {
            let fields = BookFields {
                supplier_email: Some(email.into()),
                ..Default::default()
            };
            assert!(
                validate(&fields, ValidationMode::Update).is_ok(),
                "Expected '{}' to be valid",
                email
            );
        }

        for email in ["plainaddress", "@ace.com", "user@", "user@ace", "user@@ace.com", "user name@ace.com"] {
            let fields = BookFields {
                supplier_email: Some(email.into()),
                ..Default::default()
            };
            assert_invalid(validate(&fields, ValidationMode::Update), "supplier_email");
        }
    }

    #[test]
    fn update_checks_only_supplied_fields() {
        assert!(validate(&BookFields::default(), ValidationMode::Update).is_ok());

        let fields = BookFields {
            quantity: Some(2),
            ..Default::default()
        };
        assert!(validate(&fields, ValidationMode::Update).is_ok());
        assert_missing(validate(&fields, ValidationMode::Create), "title");
    }

    #[test]
    fn validation_is_repeatable_and_leaves_input_alone() {
        let fields = BookFields {
            price: Some(-5.0),
            ..dune()
        };
        let before = fields.clone();
        let first = validate(&fields, ValidationMode::Create).map_err(|e| e.to_string());
        let second = validate(&fields, ValidationMode::Create).map_err(|e| e.to_string());
        assert_eq!(first, second);
        assert_eq!(fields, before);
    }
}
