//! Catalog product.

use serde::Serialize;
use serde_json::json;

use shopfront_core::{Price, ProductId};

use super::sanitize::{Fallbacks, fields, price_or_zero};
use crate::store::{Document, StoreError, into_document};

/// Legacy image key written by early catalog seeds.
const LEGACY_IMAGE: &str = "imageurl";

/// A product as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: String,
}

impl Product {
    /// Decode a `products/{id}` document, defaulting missing fields.
    #[must_use]
    pub fn from_document(id: &str, doc: &Document, fallbacks: &Fallbacks) -> Self {
        let image = doc
            .get(fields::IMAGE)
            .filter(|v| v.as_str().is_some_and(|s| !s.trim().is_empty()))
            .or_else(|| doc.get(LEGACY_IMAGE));

        Self {
            id: ProductId::new(id),
            name: fallbacks.name_or_default(doc.get(fields::NAME)),
            price: price_or_zero(doc.get(fields::PRICE)),
            image: fallbacks.image_or_default(image),
        }
    }

    /// The stored form `{name, price, image}`; the ID is the document key.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature matches the other document
    /// encoders.
    pub fn to_document(&self) -> Result<Document, StoreError> {
        into_document(json!({
            fields::NAME: self.name,
            fields::PRICE: self.price.to_json(),
            fields::IMAGE: self.image,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::sanitize::{DEFAULT_PLACEHOLDER_IMAGE, FALLBACK_NAME};

    fn doc(value: serde_json::Value) -> Document {
        into_document(value).unwrap()
    }

    #[test]
    fn test_decodes_complete_document() {
        let product = Product::from_document(
            "p1",
            &doc(json!({"name": "Smartphone", "price": 699.99, "image": "https://img.test/p1.png"})),
            &Fallbacks::default(),
        );
        assert_eq!(product.id.as_str(), "p1");
        assert_eq!(product.name, "Smartphone");
        assert_eq!(product.price, Price::from_cents(69999));
        assert_eq!(product.image, "https://img.test/p1.png");
    }

    #[test]
    fn test_reads_legacy_image_key() {
        let product = Product::from_document(
            "p2",
            &doc(json!({"name": "Laptop", "price": 1299.99, "imageurl": "https://img.test/old.png"})),
            &Fallbacks::default(),
        );
        assert_eq!(product.image, "https://img.test/old.png");
    }

    #[test]
    fn test_defaults_missing_fields() {
        let product = Product::from_document("p9", &doc(json!({"price": "free"})), &Fallbacks::default());
        assert_eq!(product.name, FALLBACK_NAME);
        assert_eq!(product.price, Price::ZERO);
        assert_eq!(product.image, DEFAULT_PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_document_round_trip() {
        let product = Product {
            id: ProductId::new("p5"),
            name: "Tablet".to_owned(),
            price: Price::from_cents(49999),
            image: "https://img.test/p5.png".to_owned(),
        };
        let stored = product.to_document().unwrap();
        assert_eq!(stored.get("price"), Some(&json!(499.99)));
        assert_eq!(
            Product::from_document("p5", &stored, &Fallbacks::default()),
            product
        );
    }
}
