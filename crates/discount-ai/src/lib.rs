//! Discount pricing decisions: a sales model trained on historical data, the prediction
//! endpoint that serves it, and the dashboards that sweep, rank, and stress-test discounts.

pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod model;
pub mod prediction;
pub mod telemetry;
