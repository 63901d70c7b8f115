use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, Result};

/// A resolved resource address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceAddress {
    /// Every row of the table.
    Collection,
    /// A single row, by id.
    Item(u64),
}

impl ResourceAddress {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            ResourceAddress::Collection => ResourceType::Collection,
            ResourceAddress::Item(_) => ResourceType::Item,
        }
    }

    /// Whether a subscriber registered on `self` should hear about a change at `changed`.
    ///
    /// A collection-wide change may have touched any row, so it reaches item
    /// subscribers as well; an item change reaches that item and the collection.
    pub fn covers(&self, changed: &ResourceAddress) -> bool {
        match (self, changed) {
            (ResourceAddress::Collection, _) => true,
            (ResourceAddress::Item(_), ResourceAddress::Collection) => true,
            (ResourceAddress::Item(scope), ResourceAddress::Item(id)) => scope == id,
        }
    }
}

/// Classification returned by the describe-type operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    Collection,
    Item,
}

impl ResourceType {
    /// Content type string for this kind of address under `scheme`.
    pub fn mime_type(&self, scheme: &AddressScheme) -> String {
        let base = match self {
            ResourceType::Collection => "vnd.android.cursor.dir",
            ResourceType::Item => "vnd.android.cursor.item",
        };
        format!("{}/{}/{}", base, scheme.authority(), scheme.table_path())
    }
}

/// The address grammar for one table: `<authority>/<table-path>[/<id>]`.
///
/// Built once from configuration and handed to whoever needs to resolve addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressScheme {
    authority: String,
    table_path: String,
}

impl AddressScheme {
    pub fn new(authority: &str, table_path: &str) -> Self {
        Self {
            authority: authority.to_string(),
            table_path: table_path.to_string(),
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn table_path(&self) -> &str {
        &self.table_path
    }

    /// Classify `address` as the collection or a single item.
    pub fn resolve(&self, address: &str) -> Result<ResourceAddress> {
        let unsupported = || InventoryError::UnsupportedAddress(address.to_string());

        let rest = address
            .strip_prefix(self.authority.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|rest| rest.strip_prefix(self.table_path.as_str()))
            .ok_or_else(unsupported)?;

        if rest.is_empty() {
            return Ok(ResourceAddress::Collection);
        }

        let id = rest.strip_prefix('/').ok_or_else(unsupported)?;
        if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(unsupported());
        }

        // Row ids are signed 64-bit in SQLite
        let id: u64 = id.parse().map_err(|_| unsupported())?;
        if i64::try_from(id).is_err() {
            return Err(unsupported());
        }

        Ok(ResourceAddress::Item(id))
    }

    /// Render a resolved address back into its canonical string form.
    pub fn address_of(&self, address: &ResourceAddress) -> String {
        match address {
            ResourceAddress::Collection => self.collection_address(),
            ResourceAddress::Item(id) => format!("{}/{}", self.collection_address(), id),
        }
    }

    pub fn collection_address(&self) -> String {
        format!("{}/{}", self.authority, self.table_path)
    }

    pub fn item_address(&self, id: u64) -> String {
        self.address_of(&ResourceAddress::Item(id))
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceAddress::Collection => write!(f, "collection"),
            ResourceAddress::Item(id) => write!(f, "item {}", id),
        }
    }
}
