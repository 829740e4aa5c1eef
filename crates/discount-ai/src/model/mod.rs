//! Profit and demand estimators trained from historical sales.

mod encoder;
mod forest;
mod training;
mod tree;

pub use encoder::FeatureEncoder;
pub use forest::{ForestError, ForestParams, RandomForestRegressor};
pub use training::{
    RegressionPipeline, SalesHistory, SalesRecord, TrainedSalesModel, TrainingError,
};
pub use tree::{RegressionTree, TreeParams};

use crate::config::ModelConfig;

impl ForestParams {
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            trees: config.trees,
            seed: config.seed,
            tree: TreeParams {
                max_depth: config.max_depth,
                ..TreeParams::default()
            },
        }
    }
}

/// Reads the configured training CSV and fits both pipelines.
pub fn train_from_config(config: &ModelConfig) -> Result<TrainedSalesModel, TrainingError> {
    let history = SalesHistory::from_path(&config.training_data)?;
    TrainedSalesModel::train(&history, &ForestParams::from_config(config))
}
