//! Catalog
//!
//! Product listings as the storefront reads them, and construction of aggregate
//! lines from a product or one of its variants.

use rust_decimal::Decimal;
use serde_json::Value;

use crate::{
    lines::{Line, LineId},
    normalize::{amount_field, field, image, integer_field, text_field},
    pricing::{PricingFields, ResolvedPrice},
    totals::normalize_tax,
    variants::{Selection, Variant, find_matching_variant},
};

/// Whether a product is sold as-is or through variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductType {
    /// A single priced item.
    #[default]
    Simple,

    /// Priced and stocked per variant.
    Variable,
}

/// Lowest and highest unit price of a variable product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    /// Lowest price.
    pub min: Decimal,

    /// Highest price.
    pub max: Decimal,
}

/// A catalog product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Product {
    /// Backend identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// URL slug.
    pub slug: Option<String>,

    /// Main image URL.
    pub image: Option<String>,

    /// Simple or variable.
    pub product_type: ProductType,

    /// Raw pricing fields.
    pub pricing: PricingFields,

    /// Backend-supplied lowest variant price.
    pub min_price: Option<Decimal>,

    /// Backend-supplied highest variant price.
    pub max_price: Option<Decimal>,

    /// Units available for a simple product.
    pub stock: i64,

    /// Tax percentage applied to every line built from this product.
    pub tax: Option<Decimal>,

    /// Variants, for variable products.
    pub variants: Vec<Variant>,
}

impl Product {
    /// Normalise a backend product object. Returns `None` without an identifier.
    pub fn from_json(value: &Value) -> Option<Self> {
        let variants: Vec<Variant> = value
            .get("variants")
            .and_then(Value::as_array)
            .map(|variants| variants.iter().map(Variant::from_json).collect())
            .unwrap_or_default();

        let product_type = match text_field(value, &["product_type", "productType", "type"]) {
            Some(kind) if kind.eq_ignore_ascii_case("variable") => ProductType::Variable,
            Some(_) => ProductType::Simple,
            None if variants.is_empty() => ProductType::Simple,
            None => ProductType::Variable,
        };

        Some(Self {
            id: text_field(value, &["_id", "id"])?,
            name: text_field(value, &["name", "title"]).unwrap_or_default(),
            slug: text_field(value, &["slug"]),
            image: field(value, &["image", "thumbnail"]).and_then(image),
            product_type,
            pricing: PricingFields {
                price: amount_field(value, &["price"]).unwrap_or_default(),
                original_price: amount_field(value, &["originalPrice", "original_price"]),
                deal_price: amount_field(value, &["dealPrice", "deal_price"]),
                sale_price: amount_field(value, &["sale_price", "salePrice"]),
            },
            min_price: amount_field(value, &["min_price", "minPrice"]),
            max_price: amount_field(value, &["max_price", "maxPrice"]),
            stock: integer_field(value, &["quantity", "stock"]).unwrap_or_default(),
            tax: field(value, &["tax", "taxRate", "tax_rate"]).and_then(normalize_tax),
            variants,
        })
    }

    /// Resolved pricing for the product itself.
    pub fn resolved_price(&self) -> ResolvedPrice {
        ResolvedPrice::resolve(&self.pricing)
    }

    /// Price range of a variable product.
    ///
    /// Backend min/max values win when positive; otherwise they are derived from the
    /// positive variant prices, and finally fall back to the product's list price.
    /// Simple products have no range.
    pub fn price_range(&self) -> Option<PriceRange> {
        if self.product_type != ProductType::Variable {
            return None;
        }

        let positive = |price: Option<Decimal>| price.filter(|price| *price > Decimal::ZERO);

        let variant_prices = || {
            self.variants
                .iter()
                .map(|variant| variant.price)
                .filter(|price| *price > Decimal::ZERO)
        };

        let min = positive(self.min_price).or_else(|| variant_prices().min());
        let max = positive(self.max_price).or_else(|| variant_prices().max());

        Some(match (min, max) {
            (Some(min), Some(max)) => PriceRange { min, max },
            (Some(only), None) | (None, Some(only)) => PriceRange {
                min: only,
                max: only,
            },
            (None, None) => PriceRange {
                min: self.pricing.price,
                max: self.pricing.price,
            },
        })
    }

    /// Variant matching `selection`, first in input order.
    pub fn resolve_variant(&self, selection: &Selection) -> Option<&Variant> {
        find_matching_variant(&self.variants, selection)
    }

    /// Unit price for `selection`, falling back to the product's own effective price
    /// when no variant matches.
    pub fn unit_price(&self, selection: &Selection) -> Decimal {
        self.resolve_variant(selection)
            .map_or_else(|| self.resolved_price().effective, Variant::unit_price)
    }

    /// Stock for `selection`, falling back to the product's own stock.
    pub fn stock_for(&self, selection: &Selection) -> i64 {
        self.resolve_variant(selection)
            .map_or(self.stock, |variant| variant.stock)
    }

    /// Build a single-unit line for this product, or for one of its variants.
    ///
    /// Tax always comes from the product.
    pub fn to_line(&self, variant: Option<&Variant>) -> Line {
        let mut line = match variant {
            Some(variant) => {
                let variant_id = variant.id.clone();

                Line {
                    variant_id: variant_id.clone(),
                    name: format!("{} - {}", self.name, variant.title()),
                    image: variant.image.clone().or_else(|| self.image.clone()),
                    stock: Some(variant.stock),
                    ..Line::new(
                        LineId::for_product(&self.id, variant_id.as_deref()),
                        self.id.clone(),
                        variant.pricing(),
                    )
                }
            }
            None => Line {
                name: self.name.clone(),
                image: self.image.clone(),
                stock: Some(self.stock),
                ..Line::new(LineId::from(self.id.as_str()), self.id.clone(), self.pricing)
            },
        };

        line.slug.clone_from(&self.slug);
        line.tax = self.tax;
        line.refresh_totals();

        line
    }
}
