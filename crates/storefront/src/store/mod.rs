//! Document store seam.
//!
//! The shop treats its database as an opaque key-value document service:
//! collections of JSON objects addressed by string IDs. Two backends
//! implement [`DocumentStore`]:
//!
//! - [`MemoryStore`] - process-local maps, used by the demo and every test
//! - [`crate::db::PgDocumentStore`] - `PostgreSQL` JSONB rows
//!
//! # Collections
//!
//! - `products` - catalog entries `{name, price, image}`
//! - `users` - profile documents `{email, name, cart: [...]}`
//! - `orders` - immutable order snapshots

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

/// A stored document: a JSON object.
pub type Document = Map<String, Value>;

/// Collection names.
pub mod collections {
    /// Catalog entries.
    pub const PRODUCTS: &str = "products";

    /// Per-user profile documents carrying the persisted cart.
    pub const USERS: &str = "users";

    /// Submitted orders.
    pub const ORDERS: &str = "orders";
}

/// Errors that can occur during document store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document does not exist.
    #[error("document {collection}/{id} not found")]
    NotFound {
        /// Collection that was searched.
        collection: String,
        /// Requested document ID.
        id: String,
    },

    /// A document with this key already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A document could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored data is not shaped like a document.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The backend refused or could not reach the write target.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Build a `NotFound` error.
    #[must_use]
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_owned(),
            id: id.to_owned(),
        }
    }

    /// Whether this error means the document is missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Opaque document database.
///
/// Writes are last-write-wins per document. Implementations must be safe to
/// share between tasks, but the shop issues at most one call at a time per
/// session.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs.
    fn backend_tag(&self) -> &'static str;

    /// Read one document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the document doesn't exist.
    async fn get_document(&self, collection: &str, id: &str) -> Result<Document, StoreError>;

    /// Create or replace a document.
    async fn set_document(
        &self,
        collection: &str,
        id: &str,
        data: Document,
    ) -> Result<(), StoreError>;

    /// Shallow-merge `partial` into an existing document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the document doesn't exist.
    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        partial: Document,
    ) -> Result<(), StoreError>;

    /// Insert a document under a generated ID and return that ID.
    async fn add_document(&self, collection: &str, data: Document) -> Result<String, StoreError>;

    /// All documents in a collection, as `(id, document)` pairs.
    async fn list_documents(&self, collection: &str)
    -> Result<Vec<(String, Document)>, StoreError>;

    /// The store's notion of "now", used for server-assigned timestamps.
    async fn server_time(&self) -> Result<DateTime<Utc>, StoreError> {
        Ok(Utc::now())
    }
}

/// Turn a JSON value into a document, rejecting non-objects.
///
/// # Errors
///
/// Returns `StoreError::DataCorruption` if `value` is not a JSON object.
pub fn into_document(value: Value) -> Result<Document, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::DataCorruption(format!(
            "expected a JSON object, found {}",
            json_kind(&other)
        ))),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_into_document_accepts_objects() {
        let doc = into_document(json!({"name": "Laptop"})).unwrap();
        assert_eq!(doc.get("name"), Some(&json!("Laptop")));
    }

    #[test]
    fn test_into_document_rejects_arrays() {
        let err = into_document(json!([1, 2])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "data corruption: expected a JSON object, found an array"
        );
    }

    #[test]
    fn test_not_found_display() {
        let err = StoreError::not_found("users", "u1");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "document users/u1 not found");
    }
}
