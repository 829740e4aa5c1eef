//! Decision dashboards: discount curves, constrained recommendations, and Monte Carlo risk
//! simulation. Every dashboard issues its prediction calls sequentially through a
//! [`PredictionClient`] and aborts on the first failed call.

pub mod client;
pub mod curve;
pub mod recommendation;
pub mod simulation;

#[cfg(test)]
pub(crate) mod testing;

use serde::Serialize;

use crate::catalog::CatalogEntry;
use crate::prediction::PredictionRequest;

pub use client::{ClientError, HttpPredictionClient, LocalPredictionClient, PredictionClient};
pub use curve::{
    discount_curve, region_average, region_breakdown, run_curve_dashboard,
    standard_discount_range, CurveDashboard, CurvePoint, DiscountCurve, RegionAverage,
    RegionPrediction,
};
pub use recommendation::{
    recommend, run_recommendation_dashboard, score_curve, BusinessConstraints, Objective,
    Recommendation, RecommendationDashboard, RecommendationSettings, ScoredRow,
};
pub use simulation::{
    histogram, run_simulation, summarize, HistogramBin, MonteCarloSettings, SimulationRun,
    SimulationSample, SimulationSummary,
};

/// Product chosen in the dashboard sidebar plus the competitor price, when one applies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSelection {
    pub product: CatalogEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitor_price: Option<f64>,
}

impl ProductSelection {
    pub fn new(product: CatalogEntry, competitor_price: Option<f64>) -> Self {
        Self {
            product,
            competitor_price,
        }
    }

    pub fn request(&self, region: &str, discount_pct: f64) -> PredictionRequest {
        self.request_with_competitor(region, discount_pct, self.competitor_price)
    }

    pub fn request_with_competitor(
        &self,
        region: &str,
        discount_pct: f64,
        competitor_price: Option<f64>,
    ) -> PredictionRequest {
        PredictionRequest {
            product: self.product.name.clone(),
            category: self.product.category.clone(),
            region: region.to_string(),
            base_price: self.product.base_price,
            discount_pct,
            competitor_price,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("no regions configured")]
    NoRegions,
    #[error("no discounts to evaluate")]
    NoDiscounts,
    #[error("invalid dashboard settings: {0}")]
    InvalidSettings(String),
}
