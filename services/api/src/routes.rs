use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use discount_ai::catalog::Catalog;
use discount_ai::prediction::{prediction_router, PredictionService, SalesModel};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_prediction_routes<M>(
    service: Arc<PredictionService<M>>,
    catalog: Arc<Catalog>,
) -> axum::Router
where
    M: SalesModel + 'static,
{
    prediction_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/catalog",
            axum::routing::get(catalog_endpoint).layer(Extension(catalog)),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Products and regions the dashboards can query.
pub(crate) async fn catalog_endpoint(
    Extension(catalog): Extension<Arc<Catalog>>,
) -> Json<Catalog> {
    Json(catalog.as_ref().clone())
}
