//! Submitted orders.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::json;

use shopfront_core::{OrderId, OrderStatus, Price, UserId};

use super::cart::CartLine;
use super::sanitize::to_cart_value;
use crate::store::{Document, StoreError, into_document};

/// An order before the store has assigned it an ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    pub user_id: UserId,
    /// Sanitized copy of the cart at submission.
    pub items: Vec<CartLine>,
    /// `Σ price × quantity` over `items`.
    pub total: Price,
    pub status: OrderStatus,
    /// Server-assigned submission time.
    pub timestamp: DateTime<Utc>,
}

impl OrderDraft {
    /// Build a draft from sanitized lines; the total is computed here.
    #[must_use]
    pub fn new(user_id: UserId, items: Vec<CartLine>, timestamp: DateTime<Utc>) -> Self {
        let total = items.iter().map(CartLine::line_total).sum();
        Self {
            user_id,
            items,
            total,
            status: OrderStatus::Placed,
            timestamp,
        }
    }

    /// The stored form `{userId, items, total, status, timestamp}`.
    ///
    /// # Errors
    ///
    /// Never fails in practice; the signature matches the other document
    /// encoders.
    pub fn to_document(&self) -> Result<Document, StoreError> {
        into_document(json!({
            "userId": self.user_id.as_str(),
            "items": to_cart_value(&self.items),
            "total": self.total.to_json(),
            "status": self.status.as_str(),
            "timestamp": self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        }))
    }

    /// Attach the store-assigned ID.
    #[must_use]
    pub fn placed(self, id: impl Into<OrderId>) -> Order {
        Order {
            id: id.into(),
            user_id: self.user_id,
            items: self.items,
            total: self.total,
            status: self.status,
            timestamp: self.timestamp,
        }
    }
}

/// An acknowledged, immutable order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub items: Vec<CartLine>,
    pub total: Price,
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
}

impl Order {
    /// Sum of quantities over the order's items.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, l| acc.saturating_add(l.quantity))
    }
}
