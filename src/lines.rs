//! Lines
//!
//! The canonical line shape shared by carts, buy-now sessions, orders and catalog
//! listings, plus the local list operations used for optimistic quantity bounds.

use std::fmt;

use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;

use crate::{
    normalize::{amount_field, field, image, integer_field, reference, text_field},
    pricing::{PricingFields, ResolvedPrice},
    totals::{LineTotals, line_totals, normalize_tax},
};

/// Backend keys that may carry a line's tax percentage.
const TAX_KEYS: [&str; 5] = ["tax", "taxRate", "tax_rate", "taxPercentage", "tax_percentage"];

/// Errors from local line-list operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LineError {
    /// Quantities added to a list must be positive.
    #[error("quantity must be greater than zero")]
    InvalidQuantity,
}

/// Stable line identifier.
///
/// For a variant line this is `"<product id>.<variant id>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LineId(String);

impl LineId {
    /// Identifier for a product, optionally narrowed to one variant.
    pub fn for_product(product_id: &str, variant_id: Option<&str>) -> Self {
        match variant_id {
            Some(variant) => Self(format!("{product_id}.{variant}")),
            None => Self(product_id.to_string()),
        }
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LineId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for LineId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One product (or variant) entry in a cart, buy-now session, order or listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Stable identifier, unique within an aggregate.
    pub id: LineId,

    /// Backend line identifier (`_id`), when the backend assigned one.
    pub backend_id: Option<String>,

    /// Product this line refers to.
    pub product_id: String,

    /// Variant this line refers to, for variable products.
    pub variant_id: Option<String>,

    /// Display name.
    pub name: String,

    /// Product slug.
    pub slug: Option<String>,

    /// Image URL.
    pub image: Option<String>,

    /// Raw pricing fields.
    pub pricing: PricingFields,

    /// Units on this line, at least one.
    pub quantity: u32,

    /// Units available, when known.
    pub stock: Option<i64>,

    /// Tax percentage. `None` means no tax information, which differs from an
    /// explicit zero.
    pub tax: Option<Decimal>,

    /// Backend-computed grand total, preferred for display when present.
    pub item_total: Option<Decimal>,

    /// Locally derived totals, refreshed whenever the owning aggregate is set.
    pub totals: LineTotals,
}

impl Line {
    /// Create a single-unit line with the given pricing and no other details.
    pub fn new(id: LineId, product_id: impl Into<String>, pricing: PricingFields) -> Self {
        Self {
            id,
            backend_id: None,
            product_id: product_id.into(),
            variant_id: None,
            name: String::new(),
            slug: None,
            image: None,
            pricing,
            quantity: 1,
            stock: None,
            tax: None,
            item_total: None,
            totals: LineTotals::default(),
        }
    }

    /// Normalise a backend line object.
    ///
    /// Missing or malformed fields default: price to zero, quantity to one and tax
    /// to `None`. Returns `None` only when no identifier can be found.
    pub fn from_json(value: &Value) -> Option<Self> {
        let backend_id = text_field(value, &["_id"]);
        let product_id = field(value, &["productId", "product_id", "product"]).and_then(reference);
        let variant_id =
            field(value, &["variantId", "variant_id", "variationId", "variant"]).and_then(reference);

        let id = text_field(value, &["id"])
            .map(LineId::from)
            .or_else(|| {
                product_id
                    .as_deref()
                    .map(|product| LineId::for_product(product, variant_id.as_deref()))
            })
            .or_else(|| backend_id.clone().map(LineId::from))?;

        let product_id = product_id.unwrap_or_else(|| id.as_str().to_string());

        let pricing = PricingFields {
            price: amount_field(value, &["price"]).unwrap_or_default(),
            original_price: amount_field(value, &["originalPrice", "original_price"]),
            deal_price: amount_field(value, &["dealPrice", "deal_price"]),
            sale_price: amount_field(value, &["sale_price", "salePrice"]),
        };

        let quantity = integer_field(value, &["quantity", "qty"]).unwrap_or(1).max(1);

        let mut line = Self {
            id,
            backend_id,
            product_id,
            variant_id,
            name: text_field(value, &["name", "title"]).unwrap_or_default(),
            slug: text_field(value, &["slug"]),
            image: field(value, &["image", "thumbnail"]).and_then(image),
            pricing,
            quantity: u32::try_from(quantity).unwrap_or(u32::MAX),
            stock: integer_field(value, &["stock", "stockQuantity"]),
            tax: field(value, &TAX_KEYS).and_then(normalize_tax),
            item_total: amount_field(value, &["itemTotal", "item_total"]),
            totals: LineTotals::default(),
        };

        line.refresh_totals();

        Some(line)
    }

    /// Recompute [`Line::totals`] from the current pricing, quantity and tax.
    pub fn refresh_totals(&mut self) {
        self.totals = line_totals(self);
    }

    /// Resolved pricing for this line.
    pub fn resolved_price(&self) -> ResolvedPrice {
        ResolvedPrice::resolve(&self.pricing)
    }

    /// Grand total for display: the backend's `itemTotal` when supplied, otherwise
    /// the locally derived grand total.
    pub fn display_total(&self) -> Decimal {
        self.item_total.unwrap_or(self.totals.grand_total)
    }

    /// Whether one more unit fits within the known stock.
    pub fn can_increment(&self) -> bool {
        self.stock
            .is_some_and(|stock| i64::from(self.quantity) < stock)
    }
}

/// Add `quantity` units of `line`, merging into an existing line with the same id.
///
/// # Errors
///
/// Returns [`LineError::InvalidQuantity`] when `quantity` is zero.
pub fn add_with_quantity(lines: &mut Vec<Line>, line: Line, quantity: u32) -> Result<(), LineError> {
    if quantity == 0 {
        return Err(LineError::InvalidQuantity);
    }

    if let Some(existing) = lines.iter_mut().find(|existing| existing.id == line.id) {
        existing.quantity = existing.quantity.saturating_add(quantity);
        existing.refresh_totals();

        return Ok(());
    }

    let mut line = line;
    line.quantity = quantity;
    line.refresh_totals();

    lines.push(line);

    Ok(())
}

/// Remove `quantity` units from the line with `id`, dropping the line when nothing
/// remains.
pub fn remove_or_decrement(lines: &mut Vec<Line>, id: &LineId, quantity: u32) {
    let Some(position) = lines.iter().position(|line| &line.id == id) else {
        return;
    };

    let remaining = lines
        .get(position)
        .map_or(0, |line| line.quantity.saturating_sub(quantity));

    if remaining == 0 {
        lines.remove(position);
    } else if let Some(line) = lines.get_mut(position) {
        line.quantity = remaining;
        line.refresh_totals();
    }
}

/// Find the line with `id`.
pub fn find<'a>(lines: &'a [Line], id: &LineId) -> Option<&'a Line> {
    lines.iter().find(|line| &line.id == id)
}

/// Apply `update` to the line with `id`. Returns whether a line was found.
pub fn update(lines: &mut [Line], id: &LineId, update: impl FnOnce(&mut Line)) -> bool {
    match lines.iter_mut().find(|line| &line.id == id) {
        Some(line) => {
            update(line);
            line.refresh_totals();

            true
        }
        None => false,
    }
}

/// Remove the line with `id`, returning it.
pub fn remove(lines: &mut Vec<Line>, id: &LineId) -> Option<Line> {
    let position = lines.iter().position(|line| &line.id == id)?;

    Some(lines.remove(position))
}

/// Whether the line with `id` exists and can take one more unit.
///
/// Unknown stock counts as zero.
pub fn in_stock(lines: &[Line], id: &LineId) -> bool {
    find(lines, id).is_some_and(|line| i64::from(line.quantity) < line.stock.unwrap_or(0))
}
