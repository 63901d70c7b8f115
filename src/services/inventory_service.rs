use std::sync::Arc;

use crate::{
    db::book_store::{BookStore, Record},
    error::{InventoryError, Result},
    models::{
        address::{AddressScheme, ResourceAddress, ResourceType},
        book::{Book, BookFields},
        query::{Filter, Projection, SortOrder},
    },
    services::{
        notification_hub::{SharedNotificationHub, Subscription},
        validation::{ValidationMode, validate},
    },
};

/// Address-driven access to the book inventory.
///
/// Every operation resolves its address first, validates mutations before
/// touching the store, and leaves change publishing to the store.
pub struct InventoryService {
    scheme: AddressScheme,
    store: Arc<BookStore>,
}

impl InventoryService {
    pub fn new(scheme: AddressScheme, store: Arc<BookStore>) -> Self {
        Self { scheme, store }
    }

    pub fn scheme(&self) -> &AddressScheme {
        &self.scheme
    }

    pub fn hub(&self) -> &SharedNotificationHub {
        self.store.hub()
    }

    pub fn resolve(&self, address: &str) -> Result<ResourceAddress> {
        self.scheme.resolve(address)
    }

    /// Classify an address without touching the store.
    pub fn type_of(&self, address: &str) -> Result<ResourceType> {
        Ok(self.resolve(address)?.resource_type())
    }

    pub async fn query(
        &self,
        address: &str,
        projection: &Projection,
        filter: Option<&Filter>,
        sort: Option<&SortOrder>,
    ) -> Result<Vec<Record>> {
        let resolved = self.resolve(address)?;
        self.store.query(&resolved, projection, filter, sort).await
    }

    pub async fn query_books(
        &self,
        address: &str,
        filter: Option<&Filter>,
        sort: Option<&SortOrder>,
    ) -> Result<Vec<Book>> {
        let resolved = self.resolve(address)?;
        self.store.query_books(&resolved, filter, sort).await
    }

    /// Create a book from a complete field set. Only the collection accepts inserts.
    pub async fn insert(&self, address: &str, fields: &BookFields) -> Result<u64> {
        match self.resolve(address)? {
            ResourceAddress::Collection => {}
            ResourceAddress::Item(_) => {
                tracing::warn!("Insert rejected for item address {}", address);
                return Err(InventoryError::UnsupportedAddress(address.to_string()));
            }
        }

        validate(fields, ValidationMode::Create)?;
        self.store.insert(fields).await
    }

    /// Apply a partial field set to the addressed rows.
    pub async fn update(
        &self,
        address: &str,
        fields: &BookFields,
        filter: Option<&Filter>,
    ) -> Result<u64> {
        let resolved = self.resolve(address)?;
        validate(fields, ValidationMode::Update)?;

        if fields.is_empty() {
            return Ok(0);
        }

        self.store.update(&resolved, fields, filter).await
    }

    pub async fn delete(&self, address: &str, filter: Option<&Filter>) -> Result<u64> {
        let resolved = self.resolve(address)?;
        self.store.delete(&resolved, filter).await
    }

    /// Subscribe to changes at `address` and everything it covers.
    pub async fn subscribe(&self, address: &str) -> Result<Subscription> {
        let resolved = self.resolve(address)?;
        Ok(self.hub().subscribe(resolved).await)
    }
}

/// Shared handle to the inventory service
pub type SharedInventoryService = Arc<InventoryService>;
