//! Cart sanitization.
//!
//! Every cart that reaches durable storage, and every cart read back from a
//! profile document, passes through [`sanitize_lines`]:
//!
//! 1. drop entries that are not objects, have no usable `productId`, or whose
//!    `quantity` is not a number;
//! 2. drop entries whose numeric quantity is not a positive integer;
//! 3. remap `name`, `price` and `image` through their fallbacks.
//!
//! The pass is idempotent: feeding its output back in returns the same lines.

use serde_json::Value;

use shopfront_core::{Price, ProductId};

use super::cart::CartLine;

/// Name used when a product or line has none.
pub const FALLBACK_NAME: &str = "Unknown Product";

/// Image used when a product or line has none.
pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300x300?text=Product";

/// Field names of a persisted cart line.
pub mod fields {
    pub const PRODUCT_ID: &str = "productId";
    pub const NAME: &str = "name";
    pub const PRICE: &str = "price";
    pub const IMAGE: &str = "image";
    pub const QUANTITY: &str = "quantity";
}

/// Default values substituted for missing fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fallbacks {
    /// Substitute for a missing name.
    pub name: String,
    /// Substitute for a missing image URL.
    pub image: String,
}

impl Default for Fallbacks {
    fn default() -> Self {
        Self {
            name: FALLBACK_NAME.to_owned(),
            image: DEFAULT_PLACEHOLDER_IMAGE.to_owned(),
        }
    }
}

impl Fallbacks {
    /// Fallbacks with a custom placeholder image.
    #[must_use]
    pub fn with_image(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Self::default()
        }
    }

    /// A non-blank string field, or the name fallback.
    #[must_use]
    pub fn name_or_default(&self, value: Option<&Value>) -> String {
        non_blank(value).unwrap_or_else(|| self.name.clone())
    }

    /// A non-blank string field, or the image fallback.
    #[must_use]
    pub fn image_or_default(&self, value: Option<&Value>) -> String {
        non_blank(value).unwrap_or_else(|| self.image.clone())
    }
}

/// A non-negative numeric price no larger than [`Price::MAX`], or zero.
///
/// Only JSON numbers count; numeric strings are treated as missing.
#[must_use]
pub fn price_or_zero(value: Option<&Value>) -> Price {
    match value {
        Some(v @ Value::Number(_)) => Price::from_json(v).unwrap_or(Price::ZERO),
        _ => Price::ZERO,
    }
}

/// Sanitize a raw `cart` value (expected to be an array of line objects).
///
/// Anything that is not an array yields an empty cart.
#[must_use]
pub fn sanitize_value(raw: &Value, fallbacks: &Fallbacks) -> Vec<CartLine> {
    raw.as_array()
        .map(|lines| sanitize_lines(lines, fallbacks))
        .unwrap_or_default()
}

/// Apply the filter-then-remap pass to raw line values.
#[must_use]
pub fn sanitize_lines<'a>(
    lines: impl IntoIterator<Item = &'a Value>,
    fallbacks: &Fallbacks,
) -> Vec<CartLine> {
    lines
        .into_iter()
        .filter_map(|line| sanitize_line(line, fallbacks))
        .collect()
}

/// Sanitize already-typed lines, as done before every write.
#[must_use]
pub fn sanitize_cart(lines: &[CartLine], fallbacks: &Fallbacks) -> Vec<CartLine> {
    let raw: Vec<Value> = lines.iter().map(CartLine::to_value).collect();
    sanitize_lines(&raw, fallbacks)
}

/// Render sanitized lines as the array stored under a profile's `cart` key.
#[must_use]
pub fn to_cart_value(lines: &[CartLine]) -> Value {
    Value::Array(lines.iter().map(CartLine::to_value).collect())
}

fn sanitize_line(raw: &Value, fallbacks: &Fallbacks) -> Option<CartLine> {
    let line = raw.as_object()?;

    let product_id = product_id(line.get(fields::PRODUCT_ID))?;
    let quantity = quantity(line.get(fields::QUANTITY)?)?;

    Some(CartLine {
        product_id,
        name: fallbacks.name_or_default(line.get(fields::NAME)),
        price: price_or_zero(line.get(fields::PRICE)),
        image: fallbacks.image_or_default(line.get(fields::IMAGE)),
        quantity,
    })
}

/// Product IDs may arrive as strings or, from older seed data, as numbers.
///
/// String keys are kept byte-for-byte so a line never changes identity
/// between the local cart and what gets stored.
fn product_id(value: Option<&Value>) -> Option<ProductId> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(ProductId::new(s.as_str())),
        Value::Number(n) => Some(ProductId::new(n.to_string())),
        _ => None,
    }
}

fn quantity(value: &Value) -> Option<u32> {
    let Value::Number(n) = value else {
        return None;
    };

    let whole = match (n.as_u64(), n.as_f64()) {
        (Some(q), _) => q,
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        (None, Some(f)) if f.fract() == 0.0 && f >= 1.0 && f <= f64::from(u32::MAX) => f as u64,
        _ => return None,
    };

    u32::try_from(whole).ok().filter(|q| *q >= 1)
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}
