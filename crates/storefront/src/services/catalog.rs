//! Product catalog.
//!
//! Reads the `products` collection, seeding the demo products when it is
//! empty, and caches decoded products so adding to the cart does not hit the
//! store for every click.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use shopfront_core::{Price, ProductId};

use crate::models::{Fallbacks, Product};
use crate::store::{DocumentStore, StoreError, collections};

/// Maximum number of cached products.
const CACHE_CAPACITY: u64 = 1000;

/// Demo catalog: `(id, name, price in cents)`.
const DEMO_PRODUCTS: [(&str, &str, u32); 6] = [
    ("p1", "Smartphone", 69_999),
    ("p2", "Laptop", 129_999),
    ("p3", "Headphones", 19_999),
    ("p4", "Smartwatch", 29_999),
    ("p5", "Tablet", 49_999),
    ("p6", "Camera", 79_999),
];

/// The products every fresh store is seeded with.
#[must_use]
pub fn demo_products() -> Vec<Product> {
    DEMO_PRODUCTS
        .iter()
        .map(|(id, name, cents)| Product {
            id: ProductId::new(*id),
            name: (*name).to_owned(),
            price: Price::from_cents(*cents),
            image: format!("https://via.placeholder.com/300x300?text={name}"),
        })
        .collect()
}

/// Read-only product catalog over a document store.
pub struct Catalog {
    store: Arc<dyn DocumentStore>,
    fallbacks: Fallbacks,
    cache: Cache<ProductId, Product>,
}

impl Catalog {
    /// Create a catalog whose cache entries live for `ttl`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, fallbacks: Fallbacks, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();

        Self {
            store,
            fallbacks,
            cache,
        }
    }

    /// All products in store order, seeding the demo catalog if empty.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if listing or seeding fails.
    #[tracing::instrument(skip(self), fields(backend = self.store.backend_tag()))]
    pub async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let mut docs = self.store.list_documents(collections::PRODUCTS).await?;
        if docs.is_empty() {
            self.seed().await?;
            docs = self.store.list_documents(collections::PRODUCTS).await?;
        }

        let mut products = Vec::with_capacity(docs.len());
        for (id, doc) in docs {
            let product = Product::from_document(&id, &doc, &self.fallbacks);
            self.cache.insert(product.id.clone(), product.clone()).await;
            products.push(product);
        }

        tracing::debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Look up one product.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if there is no such product.
    #[tracing::instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, StoreError> {
        if let Some(product) = self.cache.get(id).await {
            return Ok(product);
        }

        let doc = self
            .store
            .get_document(collections::PRODUCTS, id.as_str())
            .await?;
        let product = Product::from_document(id.as_str(), &doc, &self.fallbacks);
        self.cache.insert(id.clone(), product.clone()).await;
        Ok(product)
    }

    /// Write the demo catalog if the collection is empty.
    ///
    /// Returns the number of products written.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if listing or a write fails.
    pub async fn seed_if_empty(&self) -> Result<usize, StoreError> {
        if self
            .store
            .list_documents(collections::PRODUCTS)
            .await?
            .is_empty()
        {
            self.seed().await
        } else {
            Ok(0)
        }
    }

    async fn seed(&self) -> Result<usize, StoreError> {
        let products = demo_products();
        for product in &products {
            self.store
                .set_document(
                    collections::PRODUCTS,
                    product.id.as_str(),
                    product.to_document()?,
                )
                .await?;
        }

        tracing::info!(count = products.len(), "Seeded demo catalog");
        Ok(products.len())
    }
}
