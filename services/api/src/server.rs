use crate::cli::ServeArgs;
use crate::infra::{train_service, AppState};
use crate::routes::with_prediction_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use discount_ai::catalog::Catalog;
use discount_ai::config::AppConfig;
use discount_ai::error::AppError;
use discount_ai::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let catalog = Arc::new(Catalog::load(config.catalog.products_csv.as_deref())?);
    let prediction_service = train_service(&config)?;

    let app = with_prediction_routes(prediction_service, catalog)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "discount optimization api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
