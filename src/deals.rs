//! Deals
//!
//! Promotional banners and the products they feature.

use serde_json::Value;

use crate::{
    normalize::{amount_field, field, text_field},
    pricing::{PricingFields, ResolvedPrice},
};

/// Variant name of the primary hero deals.
pub const MAIN_VARIANT: &str = "MAIN";

/// CTA label used when the backend supplies none.
pub const DEFAULT_CTA_TEXT: &str = "Shop Now";

/// A product featured by a deal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DealProduct {
    /// Backend identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// URL slug.
    pub slug: Option<String>,

    /// Raw pricing fields.
    pub pricing: PricingFields,
}

impl DealProduct {
    /// Normalise a backend deal product. Returns `None` without an identifier.
    pub fn from_json(value: &Value) -> Option<Self> {
        Some(Self {
            id: text_field(value, &["_id", "id"])?,
            name: text_field(value, &["name"]).unwrap_or_default(),
            slug: text_field(value, &["slug"]),
            pricing: PricingFields {
                price: amount_field(value, &["price"]).unwrap_or_default(),
                original_price: amount_field(value, &["originalPrice", "original_price"]),
                deal_price: amount_field(value, &["dealPrice", "deal_price"]),
                sale_price: amount_field(value, &["sale_price", "salePrice", "discountedPrice"]),
            },
        })
    }

    /// Storefront path of the product page.
    pub fn path(&self) -> String {
        format!("/product/{}", self.slug.as_deref().unwrap_or(&self.id))
    }

    /// Resolved pricing for the product.
    pub fn resolved_price(&self) -> ResolvedPrice {
        ResolvedPrice::resolve(&self.pricing)
    }
}

/// A promotional banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deal {
    /// Backend identifier.
    pub id: String,

    /// Headline.
    pub title: String,

    /// Supporting copy.
    pub description: Option<String>,

    /// Upper-cased variant, `MAIN` when absent.
    pub variant: String,

    /// Mobile image URL.
    pub image_mobile: Option<String>,

    /// Desktop image URL.
    pub image_desktop: Option<String>,

    /// Call-to-action label.
    pub cta_text: String,

    /// Call-to-action target.
    pub cta_url: Option<String>,

    /// Whether the backend marks the deal active. Absent means active.
    pub active: bool,

    /// Featured products.
    pub products: Vec<DealProduct>,
}

impl Deal {
    /// Normalise a backend deal. Returns `None` without an identifier.
    pub fn from_json(value: &Value) -> Option<Self> {
        let products: Vec<DealProduct> = value
            .get("products")
            .and_then(Value::as_array)
            .map(|products| products.iter().filter_map(DealProduct::from_json).collect())
            .unwrap_or_default();

        let variant = text_field(value, &["dealVariant", "variant"])
            .map_or_else(|| MAIN_VARIANT.to_string(), |variant| variant.to_uppercase());

        let cta_url = text_field(value, &["ctaUrl", "buttonUrl", "btnUrl"])
            .or_else(|| products.first().map(DealProduct::path));

        let image_url = |size: &str| {
            value
                .get("image")
                .and_then(|image| image.get(size))
                .and_then(|image| text_field(image, &["url"]))
        };

        Some(Self {
            id: text_field(value, &["_id", "id"])?,
            title: text_field(value, &["title"]).unwrap_or_default(),
            description: text_field(value, &["description"]),
            image_mobile: image_url("mobile"),
            image_desktop: image_url("desktop"),
            cta_text: text_field(value, &["ctaText", "buttonText", "btnText"])
                .unwrap_or_else(|| DEFAULT_CTA_TEXT.to_string()),
            cta_url,
            active: field(value, &["isActive"])
                .and_then(Value::as_bool)
                .unwrap_or(true),
            variant,
            products,
        })
    }

    /// Whether this is a primary hero deal.
    pub fn is_main(&self) -> bool {
        self.variant == MAIN_VARIANT
    }
}

/// Deals split by placement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealSections {
    /// `MAIN` deals, in input order.
    pub main: Vec<Deal>,

    /// Every other variant, in input order.
    pub special: Vec<Deal>,
}

/// Read the deal list from a backend response, accepting `{data:{deals}}`,
/// `{deals}` or a bare array.
pub fn deals_from_json(value: &Value) -> Vec<Deal> {
    let list = value
        .pointer("/data/deals")
        .or_else(|| value.get("deals"))
        .unwrap_or(value);

    list.as_array()
        .map(|deals| deals.iter().filter_map(Deal::from_json).collect())
        .unwrap_or_default()
}

/// Split deals into main and special sections.
pub fn partition_deals(deals: Vec<Deal>) -> DealSections {
    let (main, special) = deals.into_iter().partition(Deal::is_main);

    DealSections { main, special }
}
