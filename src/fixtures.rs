//! Fixtures
//!
//! YAML descriptions of backend payloads. Every fixture goes through the same
//! normalisation as live responses, so fixtures exercise the JSON boundary too.

use std::{fs, path::PathBuf};

use rustc_hash::FxHashMap;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::{
    aggregate::{Aggregate, AggregateSnapshot},
    catalog::Product,
    deals::{Deal, deals_from_json},
};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// A product without an identifier
    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Snapshot not found
    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(String),
}

#[derive(Debug, Deserialize)]
struct SnapshotsFixture {
    snapshots: FxHashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ProductsFixture {
    products: FxHashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct DealsFixture {
    deals: Value,
}

/// Fixture
#[derive(Debug)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Raw backend snapshots by key
    snapshots: FxHashMap<String, Value>,

    /// Normalised products by key
    products: FxHashMap<String, Product>,

    /// Normalised deals in file order
    deals: Vec<Deal>,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            snapshots: FxHashMap::default(),
            products: FxHashMap::default(),
            deals: Vec::new(),
        }
    }

    /// Load cart/buy-now snapshots from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_snapshots(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: SnapshotsFixture = self.read("snapshots", name)?;

        self.snapshots.extend(fixture.snapshots);

        Ok(self)
    }

    /// Load catalog products from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a product has no
    /// identifier.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: ProductsFixture = self.read("products", name)?;

        for (key, value) in fixture.products {
            let product =
                Product::from_json(&value).ok_or_else(|| FixtureError::InvalidProduct(key.clone()))?;

            self.products.insert(key, product);
        }

        Ok(self)
    }

    /// Load deals from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_deals(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let fixture: DealsFixture = self.read("deals", name)?;

        self.deals.extend(deals_from_json(&fixture.deals));

        Ok(self)
    }

    /// Load a complete fixture set (snapshots, products and deals with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture
            .load_snapshots(name)?
            .load_products(name)?
            .load_deals(name)?;

        Ok(fixture)
    }

    /// Get a raw snapshot by its key
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is not found.
    pub fn snapshot(&self, key: &str) -> Result<&Value, FixtureError> {
        self.snapshots
            .get(key)
            .ok_or_else(|| FixtureError::SnapshotNotFound(key.to_string()))
    }

    /// Build an aggregate from a snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is not found.
    pub fn aggregate(&self, key: &str) -> Result<Aggregate, FixtureError> {
        let mut aggregate = Aggregate::new();

        aggregate.set(AggregateSnapshot::from_json(self.snapshot(key)?));

        Ok(aggregate)
    }

    /// Get a product by its key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product(&self, key: &str) -> Result<&Product, FixtureError> {
        self.products
            .get(key)
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Get all loaded deals
    pub fn deals(&self) -> &[Deal] {
        &self.deals
    }

    fn read<T: for<'de> Deserialize<'de>>(&self, kind: &str, name: &str) -> Result<T, FixtureError> {
        let file_path = self.base_path.join(kind).join(format!("{name}.yml"));
        let contents = fs::read_to_string(&file_path)?;

        Ok(serde_norway::from_str(&contents)?)
    }
}
