use serde::{Deserialize, Serialize};

use super::pricing::{our_price, PriceAlert};

/// Feature tuple accepted by `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub product: String,
    pub category: String,
    pub region: String,
    pub base_price: f64,
    pub discount_pct: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitor_price: Option<f64>,
}

impl PredictionRequest {
    /// Checks the request schema before any model work happens.
    pub fn validate(&self) -> Result<(), RequestViolation> {
        for (field, value) in [
            ("product", &self.product),
            ("category", &self.category),
            ("region", &self.region),
        ] {
            if value.trim().is_empty() {
                return Err(RequestViolation::Blank { field });
            }
        }

        if !self.base_price.is_finite() || self.base_price <= 0.0 {
            return Err(RequestViolation::NotPositive {
                field: "base_price",
                value: self.base_price,
            });
        }

        if !self.discount_pct.is_finite() || !(0.0..=100.0).contains(&self.discount_pct) {
            return Err(RequestViolation::DiscountOutOfRange(self.discount_pct));
        }

        if let Some(competitor_price) = self.competitor_price {
            if !competitor_price.is_finite() || competitor_price <= 0.0 {
                return Err(RequestViolation::NotPositive {
                    field: "competitor_price",
                    value: competitor_price,
                });
            }
        }

        Ok(())
    }

    pub fn our_price(&self) -> f64 {
        our_price(self.base_price, self.discount_pct)
    }

    /// Model input. A missing competitor price is assumed to match our own price.
    pub fn features(&self) -> SalesFeatures {
        SalesFeatures {
            product: self.product.clone(),
            category: self.category.clone(),
            region: self.region.clone(),
            base_price: self.base_price,
            discount_pct: self.discount_pct,
            competitor_price: self.competitor_price.unwrap_or_else(|| self.our_price()),
        }
    }
}

/// Fully populated feature row shared by training and inference.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesFeatures {
    pub product: String,
    pub category: String,
    pub region: String,
    pub base_price: f64,
    pub discount_pct: f64,
    pub competitor_price: f64,
}

/// Response body of `POST /predict`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predicted_profit: f64,
    pub predicted_units_sold: f64,
    pub our_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_alert: Option<PriceAlert>,
}

/// Raw model output before business rules are applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelEstimate {
    pub profit: f64,
    pub units_sold: f64,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RequestViolation {
    #[error("{field} must not be blank")]
    Blank { field: &'static str },
    #[error("{field} must be a positive number (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("discount_pct must be between 0 and 100 (got {0})")]
    DiscountOutOfRange(f64),
}
