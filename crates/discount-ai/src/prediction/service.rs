use std::sync::Arc;

use tracing::debug;

use super::domain::{
    ModelEstimate, PredictionRequest, PredictionResponse, RequestViolation, SalesFeatures,
};
use super::pricing::{round2, PriceAlert};

/// Trained estimator for profit and units sold. Implementations are immutable once built.
pub trait SalesModel: Send + Sync {
    fn estimate(&self, features: &SalesFeatures) -> Result<ModelEstimate, ModelError>;
}

/// Failure inside the estimator itself.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model produced a non-finite {target} estimate")]
    NonFinite { target: &'static str },
    #[error("model unavailable: {0}")]
    Unavailable(String),
}

/// Applies validation and the pricing rules around an injected model.
pub struct PredictionService<M> {
    model: Arc<M>,
}

impl<M> Clone for PredictionService<M> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
        }
    }
}

impl<M> PredictionService<M>
where
    M: SalesModel + 'static,
{
    pub fn new(model: Arc<M>) -> Self {
        Self { model }
    }

    pub fn predict(
        &self,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse, PredictionError> {
        request.validate()?;

        let estimate = self.model.estimate(&request.features())?;
        let our_price = request.our_price();
        let price_alert = request
            .competitor_price
            .map(|competitor| PriceAlert::compare(our_price, competitor));

        debug!(
            product = %request.product,
            region = %request.region,
            discount_pct = request.discount_pct,
            profit = estimate.profit,
            units = estimate.units_sold,
            "prediction served"
        );

        Ok(PredictionResponse {
            predicted_profit: round2(estimate.profit),
            predicted_units_sold: round2(estimate.units_sold),
            our_price: round2(our_price),
            price_alert,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("invalid prediction request: {0}")]
    InvalidRequest(#[from] RequestViolation),
    #[error(transparent)]
    Model(#[from] ModelError),
}
