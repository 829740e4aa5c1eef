//! Prediction endpoint: request validation, pricing rules, and the HTTP router that wraps an
//! injected [`SalesModel`].

pub mod domain;
pub mod pricing;
pub mod router;
pub mod service;

pub use domain::{
    ModelEstimate, PredictionRequest, PredictionResponse, RequestViolation, SalesFeatures,
};
pub use pricing::{our_price, round2, PriceAlert};
pub use router::prediction_router;
pub use service::{ModelError, PredictionError, PredictionService, SalesModel};
