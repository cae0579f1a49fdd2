//! Cart and line items.
//!
//! `Cart` is pure state: every mutation is synchronous and reports whether
//! anything changed. Persisting the result is the cart service's job.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use shopfront_core::{Price, ProductId};

use super::product::Product;
use super::sanitize::fields;

/// One product's entry in a cart.
///
/// `name`, `price` and `image` are a snapshot of the product at the time it
/// was first added; later catalog changes do not touch existing lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: String,
    /// Always at least 1.
    pub quantity: u32,
}

impl CartLine {
    /// A fresh line for `product` with quantity 1.
    #[must_use]
    pub fn for_product(product: &Product) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            quantity: 1,
        }
    }

    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }

    /// The stored form `{productId, name, price, image, quantity}`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        json!({
            fields::PRODUCT_ID: self.product_id.as_str(),
            fields::NAME: self.name,
            fields::PRICE: self.price.to_json(),
            fields::IMAGE: self.image,
            fields::QUANTITY: self.quantity,
        })
    }
}

/// What [`Cart::decrement`] did to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    /// Quantity went down by one; the new quantity is attached.
    Decremented(u32),
    /// The line had quantity 1 and was removed.
    Removed,
}

/// Ordered line items; insertion order is the order products were added.
///
/// Holds at most one line per product, and never a line with quantity 0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a cart from sanitized lines.
    ///
    /// Duplicate product IDs (only possible in hand-edited stored data) are
    /// folded into the first occurrence.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            if line.quantity == 0 {
                continue;
            }
            match cart.position(&line.product_id) {
                Some(i) => {
                    if let Some(existing) = cart.lines.get_mut(i) {
                        existing.quantity = existing.quantity.saturating_add(line.quantity);
                    }
                }
                None => cart.lines.push(line),
            }
        }
        cart
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `product_id`, if present.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product_id == product_id)
    }

    /// Quantity of `product_id` in the cart (0 if absent).
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.line(product_id).map_or(0, |l| l.quantity)
    }

    /// Whether the cart holds a line for `product_id`.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.line(product_id).is_some()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Add one unit of `product`: bump the existing line or append a new one.
    pub fn add_product(&mut self, product: &Product) {
        if !self.increment(&product.id) {
            self.lines.push(CartLine::for_product(product));
        }
    }

    /// Bump an existing line by one. Returns `false` if there is no line.
    pub fn increment(&mut self, product_id: &ProductId) -> bool {
        match self.lines.iter_mut().find(|l| &l.product_id == product_id) {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Take one unit off a line, removing it when it reaches zero.
    ///
    /// Returns `None` if there is no line for `product_id`.
    pub fn decrement(&mut self, product_id: &ProductId) -> Option<LineChange> {
        let index = self.position(product_id)?;
        let line = self.lines.get_mut(index)?;

        if line.quantity > 1 {
            line.quantity -= 1;
            Some(LineChange::Decremented(line.quantity))
        } else {
            self.lines.remove(index);
            Some(LineChange::Removed)
        }
    }

    /// Remove every line. Returns `false` if the cart was already empty.
    pub fn clear(&mut self) -> bool {
        let had_lines = !self.lines.is_empty();
        self.lines.clear();
        had_lines
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, l| acc.saturating_add(l.quantity))
    }

    /// A copy of the current state for views and events.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.lines.clone(),
            total: self.total(),
            count: self.count(),
        }
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.lines.iter().position(|l| &l.product_id == product_id)
    }
}

/// Point-in-time copy of a cart, with derived totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    pub total: Price,
    pub count: u32,
}

impl CartSnapshot {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity of `product_id` (0 if absent).
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId) -> u32 {
        self.lines
            .iter()
            .find(|l| &l.product_id == product_id)
            .map_or(0, |l| l.quantity)
    }
}
