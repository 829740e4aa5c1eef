use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::client::{ClientError, PredictionClient};
use super::ProductSelection;
use crate::catalog::{Catalog, STANDARD_REGIONS};
use crate::prediction::{
    round2, ModelError, PredictionError, PredictionRequest, PredictionResponse, PriceAlert,
};

/// Deterministic client: profit = 1000 - 10*discount + 100*region_index,
/// units = 10 + discount/2. Optionally fails once `fail_after` calls succeeded.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    calls: AtomicUsize,
    fail_after: Option<usize>,
}

impl ScriptedClient {
    pub(crate) fn failing_after(successes: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_after: Some(successes),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PredictionClient for ScriptedClient {
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, ClientError> {
        let previous = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_after.is_some_and(|limit| previous >= limit) {
            return Err(ClientError::Prediction(PredictionError::Model(
                ModelError::Unavailable("scripted failure".to_string()),
            )));
        }

        let region_index = STANDARD_REGIONS
            .iter()
            .position(|region| *region == request.region)
            .unwrap_or_default() as f64;
        let our_price = request.our_price();
        Ok(PredictionResponse {
            predicted_profit: 1000.0 - 10.0 * request.discount_pct + 100.0 * region_index,
            predicted_units_sold: 10.0 + request.discount_pct / 2.0,
            our_price: round2(our_price),
            price_alert: request
                .competitor_price
                .map(|competitor| PriceAlert::compare(our_price, competitor)),
        })
    }
}

pub(crate) fn regions() -> Vec<String> {
    Catalog::standard().regions().to_vec()
}

pub(crate) fn laptop_selection() -> ProductSelection {
    let catalog = Catalog::standard();
    let laptop = catalog.product("Laptop").expect("laptop in catalog").clone();
    ProductSelection::new(laptop, Some(44_100.0))
}
