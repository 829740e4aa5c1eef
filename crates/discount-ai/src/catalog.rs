//! Read-only product catalog and region set used by the dashboards.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::prediction::{our_price, round2};

/// Product the dashboards can price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub category: String,
    pub base_price: f64,
}

const STANDARD_PRODUCTS: &[(&str, &str, f64)] = &[
    ("Laptop", "Electronics", 50_000.0),
    ("Gaming Laptop", "Electronics", 75_000.0),
    ("Mobile", "Electronics", 20_000.0),
    ("Premium Mobile", "Electronics", 40_000.0),
    ("Tablet", "Electronics", 25_000.0),
    ("Smartwatch", "Electronics", 8_000.0),
    ("Headphones", "Electronics", 3_000.0),
    ("Bluetooth Speaker", "Electronics", 4_500.0),
    ("Washing Machine", "Appliances", 30_000.0),
    ("Refrigerator", "Appliances", 45_000.0),
    ("Microwave Oven", "Appliances", 15_000.0),
    ("Air Conditioner", "Appliances", 42_000.0),
    ("Power Bank", "Accessories", 2_500.0),
    ("Wireless Mouse", "Accessories", 1_200.0),
    ("Keyboard", "Accessories", 1_800.0),
    ("Fitness Band", "Wearables", 3_500.0),
    ("Smart Glasses", "Wearables", 12_000.0),
];

pub const STANDARD_REGIONS: [&str; 5] = ["North", "South", "East", "West", "Central"];

/// Discount-adjusted price shaved by 2%, used to pre-fill the competitor price.
pub fn default_competitor_price(base_price: f64, discount_pct: f64) -> f64 {
    round2(our_price(base_price, discount_pct) * 0.98)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Catalog {
    products: Vec<CatalogEntry>,
    regions: Vec<String>,
}

impl Catalog {
    pub fn standard() -> Self {
        let products = STANDARD_PRODUCTS
            .iter()
            .map(|(name, category, base_price)| CatalogEntry {
                name: (*name).to_string(),
                category: (*category).to_string(),
                base_price: *base_price,
            })
            .collect();
        Self {
            products,
            regions: STANDARD_REGIONS.iter().map(|region| region.to_string()).collect(),
        }
    }

    pub fn new(products: Vec<CatalogEntry>, regions: Vec<String>) -> Result<Self, CatalogError> {
        if products.is_empty() {
            return Err(CatalogError::NoProducts);
        }
        if regions.is_empty() {
            return Err(CatalogError::NoRegions);
        }
        for entry in &products {
            if !entry.base_price.is_finite() || entry.base_price <= 0.0 {
                return Err(CatalogError::InvalidBasePrice {
                    product: entry.name.clone(),
                });
            }
        }
        Ok(Self { products, regions })
    }

    pub fn from_products_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_products_reader(file)
    }

    /// Reads `name,category,base_price` rows and pairs them with the standard regions.
    pub fn from_products_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let products = csv_reader
            .deserialize::<CatalogEntry>()
            .collect::<Result<Vec<_>, _>>()?;
        let regions = STANDARD_REGIONS.iter().map(|region| region.to_string()).collect();
        Self::new(products, regions)
    }

    /// Standard catalog unless a products CSV is configured.
    pub fn load(products_csv: Option<&Path>) -> Result<Self, CatalogError> {
        match products_csv {
            Some(path) => Self::from_products_path(path),
            None => Ok(Self::standard()),
        }
    }

    pub fn products(&self) -> &[CatalogEntry] {
        &self.products
    }

    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    pub fn product(&self, name: &str) -> Result<&CatalogEntry, CatalogError> {
        self.products
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| CatalogError::UnknownProduct(name.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown product '{0}'")]
    UnknownProduct(String),
    #[error("catalog contains no products")]
    NoProducts,
    #[error("catalog contains no regions")]
    NoRegions,
    #[error("product '{product}' needs a positive base price")]
    InvalidBasePrice { product: String },
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog CSV: {0}")]
    Csv(#[from] csv::Error),
}
