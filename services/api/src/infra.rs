use crate::cli::SourceArgs;
use discount_ai::config::AppConfig;
use discount_ai::dashboard::{HttpPredictionClient, LocalPredictionClient, PredictionClient};
use discount_ai::error::AppError;
use discount_ai::model::{train_from_config, TrainedSalesModel};
use discount_ai::prediction::PredictionService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Fits both regressors from the configured training CSV.
pub(crate) fn train_service(
    config: &AppConfig,
) -> Result<Arc<PredictionService<TrainedSalesModel>>, AppError> {
    let model = train_from_config(&config.model)?;
    info!(
        rows = model.trained_rows(),
        trees = config.model.trees,
        source = %config.model.training_data.display(),
        "sales models trained"
    );
    Ok(Arc::new(PredictionService::new(Arc::new(model))))
}

/// Remote client when an API URL is requested, otherwise an in-process model.
pub(crate) fn prediction_client(
    source: &SourceArgs,
    config: &AppConfig,
) -> Result<Arc<dyn PredictionClient>, AppError> {
    let client = match &source.api_url {
        Some(url) => HttpPredictionClient::new(url.clone(), config.client.timeout)?,
        None if source.remote => HttpPredictionClient::from_config(&config.client)?,
        None => return Ok(Arc::new(LocalPredictionClient::new(train_service(config)?))),
    };

    info!(url = client.url(), "using remote prediction api");
    Ok(Arc::new(client))
}
