//! Variants
//!
//! Resolves a selected attribute combination to a concrete, separately priced
//! variant of a variable product.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;

use crate::{
    normalize::{amount_field, field, image, integer_field, text_field},
    pricing::{PricingFields, effective_unit_price},
};

/// Attribute dimension a variant can vary over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    /// Storage capacity, e.g. `128GB`.
    Storage,

    /// Memory, e.g. `8GB`.
    Ram,

    /// Colour name.
    Color,

    /// Bundle option.
    Bundle,

    /// Warranty option.
    Warranty,
}

impl Attribute {
    /// Every dimension, in display order.
    pub const ALL: [Attribute; 5] = [
        Attribute::Storage,
        Attribute::Ram,
        Attribute::Color,
        Attribute::Bundle,
        Attribute::Warranty,
    ];

    /// Backend field name for this dimension.
    pub fn key(self) -> &'static str {
        match self {
            Attribute::Storage => "storage",
            Attribute::Ram => "ram",
            Attribute::Color => "color",
            Attribute::Bundle => "bundle",
            Attribute::Warranty => "warranty",
        }
    }

    /// Parse a backend field name.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|attribute| attribute.key().eq_ignore_ascii_case(key.trim()))
    }
}

/// A concrete priced and stocked combination of attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variant {
    /// Backend identifier.
    pub id: Option<String>,

    /// Stock keeping unit.
    pub sku: Option<String>,

    /// Unit price. Missing values are zero.
    pub price: Decimal,

    /// Discounted unit price, when the backend supplies one.
    pub sale_price: Option<Decimal>,

    /// Units available.
    pub stock: i64,

    /// Image URL.
    pub image: Option<String>,

    /// Attribute values, keyed by dimension. Dimensions without a value are absent.
    pub attributes: BTreeMap<Attribute, String>,
}

impl Variant {
    /// Normalise a backend variant object.
    pub fn from_json(value: &Value) -> Self {
        let attributes = Attribute::ALL
            .into_iter()
            .filter_map(|attribute| {
                text_field(value, &[attribute.key()]).map(|text| (attribute, text))
            })
            .collect();

        Self {
            id: text_field(value, &["_id", "id"]),
            sku: text_field(value, &["sku"]),
            price: amount_field(value, &["price"]).unwrap_or_default(),
            sale_price: amount_field(value, &["sale_price", "salePrice"]),
            stock: integer_field(value, &["stock", "quantity"]).unwrap_or_default(),
            image: field(value, &["image", "imageUrl", "image_url", "thumbnail", "img"])
                .and_then(image),
            attributes,
        }
    }

    /// Value of one attribute dimension.
    pub fn attribute(&self, attribute: Attribute) -> Option<&str> {
        self.attributes.get(&attribute).map(String::as_str)
    }

    /// Human-readable title: present attribute values joined with `" - "`, or
    /// `"Default"` when the variant has none.
    pub fn title(&self) -> String {
        if self.attributes.is_empty() {
            return "Default".to_string();
        }

        Attribute::ALL
            .into_iter()
            .filter_map(|attribute| self.attribute(attribute))
            .collect::<Vec<_>>()
            .join(" - ")
    }

    /// Out-of-stock variants cannot be selected.
    pub fn is_disabled(&self) -> bool {
        self.stock <= 0
    }

    /// Pricing fields for this variant. Variants carry no deal or original price.
    pub fn pricing(&self) -> PricingFields {
        PricingFields {
            price: self.price,
            sale_price: self.sale_price,
            ..PricingFields::default()
        }
    }

    /// Unit price charged for this variant, resolved like any other line.
    pub fn unit_price(&self) -> Decimal {
        effective_unit_price(&self.pricing())
    }

    /// Whether this variant satisfies every dimension present in `selection`.
    pub fn matches(&self, selection: &Selection) -> bool {
        selection
            .iter()
            .all(|(attribute, value)| self.attribute(attribute) == Some(value))
    }
}

/// Selected attribute values. Dimensions absent from the selection match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(BTreeMap<Attribute, String>);

impl Selection {
    /// An empty selection, which matches every variant.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select `value` for `attribute`. Empty values clear the dimension.
    #[must_use]
    pub fn with(mut self, attribute: Attribute, value: impl Into<String>) -> Self {
        self.select(attribute, value);
        self
    }

    /// Select `value` for `attribute`. Empty values clear the dimension.
    pub fn select(&mut self, attribute: Attribute, value: impl Into<String>) {
        let value = value.into();

        if value.trim().is_empty() {
            self.0.remove(&attribute);
        } else {
            self.0.insert(attribute, value);
        }
    }

    /// Selected value for `attribute`.
    pub fn get(&self, attribute: Attribute) -> Option<&str> {
        self.0.get(&attribute).map(String::as_str)
    }

    /// Selected dimensions and their values.
    pub fn iter(&self) -> impl Iterator<Item = (Attribute, &str)> {
        self.0.iter().map(|(attribute, value)| (*attribute, value.as_str()))
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether every dimension offered by `variants` has a selected value.
    pub fn is_complete(&self, variants: &[Variant]) -> bool {
        attribute_values(variants)
            .keys()
            .all(|attribute| self.0.contains_key(attribute))
    }
}

impl FromIterator<(Attribute, String)> for Selection {
    fn from_iter<T: IntoIterator<Item = (Attribute, String)>>(iter: T) -> Self {
        let mut selection = Self::new();

        for (attribute, value) in iter {
            selection.select(attribute, value);
        }

        selection
    }
}

/// First variant, in input order, matching `selection`.
///
/// Returns `None` when nothing matches; callers fall back to the base product's own
/// price and stock.
pub fn find_matching_variant<'a>(variants: &'a [Variant], selection: &Selection) -> Option<&'a Variant> {
    variants.iter().find(|variant| variant.matches(selection))
}

/// Distinct values offered per dimension, in first-seen order.
pub fn attribute_values(variants: &[Variant]) -> BTreeMap<Attribute, SmallVec<[String; 4]>> {
    let mut values: BTreeMap<Attribute, SmallVec<[String; 4]>> = BTreeMap::new();

    for variant in variants {
        for (attribute, value) in &variant.attributes {
            let seen = values.entry(*attribute).or_default();

            if !seen.contains(value) {
                seen.push(value.clone());
            }
        }
    }

    values
}

/// Selection preselecting the first offered value of every dimension.
pub fn initial_selection(variants: &[Variant]) -> Selection {
    attribute_values(variants)
        .into_iter()
        .filter_map(|(attribute, values)| values.into_iter().next().map(|value| (attribute, value)))
        .collect()
}
