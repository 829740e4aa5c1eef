use std::collections::BTreeSet;

use crate::prediction::SalesFeatures;

/// One-hot encodes product/category/region and passes numeric columns through.
///
/// Categories are learned at fit time and kept sorted so the column layout is stable. A value
/// that was never seen during fitting encodes to all zeros for its block.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureEncoder {
    products: Vec<String>,
    categories: Vec<String>,
    regions: Vec<String>,
}

const NUMERIC_COLUMNS: usize = 3;

impl FeatureEncoder {
    pub fn fit<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a SalesFeatures>,
    {
        let mut products = BTreeSet::new();
        let mut categories = BTreeSet::new();
        let mut regions = BTreeSet::new();

        for row in rows {
            products.insert(row.product.clone());
            categories.insert(row.category.clone());
            regions.insert(row.region.clone());
        }

        Self {
            products: products.into_iter().collect(),
            categories: categories.into_iter().collect(),
            regions: regions.into_iter().collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.products.len() + self.categories.len() + self.regions.len() + NUMERIC_COLUMNS
    }

    pub fn encode(&self, row: &SalesFeatures) -> Vec<f64> {
        let mut encoded = Vec::with_capacity(self.width());
        one_hot(&self.products, &row.product, &mut encoded);
        one_hot(&self.categories, &row.category, &mut encoded);
        one_hot(&self.regions, &row.region, &mut encoded);
        encoded.push(row.base_price);
        encoded.push(row.discount_pct);
        encoded.push(row.competitor_price);
        encoded
    }
}

fn one_hot(levels: &[String], value: &str, out: &mut Vec<f64>) {
    let hit = levels.binary_search_by(|level| level.as_str().cmp(value)).ok();
    out.extend((0..levels.len()).map(|idx| if Some(idx) == hit { 1.0 } else { 0.0 }));
}
