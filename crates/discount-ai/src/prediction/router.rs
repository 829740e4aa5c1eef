use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{error, warn};

use super::domain::{PredictionRequest, PredictionResponse};
use super::service::{PredictionService, SalesModel};
use crate::error::AppError;

pub const STATUS_MESSAGE: &str = "Discount Optimization API is running";

/// Router exposing the status root and the prediction endpoint.
pub fn prediction_router<M>(service: Arc<PredictionService<M>>) -> Router
where
    M: SalesModel + 'static,
{
    Router::new()
        .route("/", get(status_handler))
        .route("/predict", post(predict_handler::<M>))
        .with_state(service)
}

pub(crate) async fn status_handler() -> Json<serde_json::Value> {
    Json(json!({ "message": STATUS_MESSAGE }))
}

pub(crate) async fn predict_handler<M>(
    State(service): State<Arc<PredictionService<M>>>,
    Json(request): Json<PredictionRequest>,
) -> Result<Json<PredictionResponse>, AppError>
where
    M: SalesModel + 'static,
{
    let prediction = service.predict(&request).map_err(|err| {
        let err = AppError::from(err);
        if err.status().is_client_error() {
            warn!(error = %err, "rejected prediction request");
        } else {
            error!(error = %err, "prediction failed");
        }
        err
    })?;
    Ok(Json(prediction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::domain::{ModelEstimate, SalesFeatures};
    use crate::prediction::service::ModelError;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::response::Response;
    use serde_json::Value;
    use tower::ServiceExt;

    struct FlatModel;

    impl SalesModel for FlatModel {
        fn estimate(&self, _: &SalesFeatures) -> Result<ModelEstimate, ModelError> {
            Ok(ModelEstimate {
                profit: 1234.567,
                units_sold: 42.0,
            })
        }
    }

    struct BrokenModel;

    impl SalesModel for BrokenModel {
        fn estimate(&self, _: &SalesFeatures) -> Result<ModelEstimate, ModelError> {
            Err(ModelError::Unavailable("not trained".to_string()))
        }
    }

    fn router<M: SalesModel + 'static>(model: M) -> Router {
        prediction_router(Arc::new(PredictionService::new(Arc::new(model))))
    }

    async fn read_json_body(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    fn post_predict(body: Value) -> Request<Body> {
        Request::post("/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("encode body")))
            .expect("request builds")
    }

    #[tokio::test]
    async fn root_reports_status() {
        let response = router(FlatModel)
            .oneshot(Request::get("/").body(Body::empty()).expect("request builds"))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json_body(response).await;
        assert_eq!(payload["message"], STATUS_MESSAGE);
    }

    #[tokio::test]
    async fn predict_returns_fixed_schema() {
        let response = router(FlatModel)
            .oneshot(post_predict(json!({
                "product": "Laptop",
                "category": "Electronics",
                "region": "North",
                "base_price": 50000,
                "discount_pct": 10,
                "competitor_price": 40000
            })))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json_body(response).await;
        assert_eq!(payload["predicted_profit"], json!(1234.57));
        assert_eq!(payload["predicted_units_sold"], json!(42.0));
        assert_eq!(payload["our_price"], json!(45000.0));
        assert_eq!(payload["price_alert"], "Expensive");
    }

    #[tokio::test]
    async fn predict_rejects_invalid_values() {
        let response = router(FlatModel)
            .oneshot(post_predict(json!({
                "product": "Laptop",
                "category": "Electronics",
                "region": "North",
                "base_price": -1,
                "discount_pct": 10,
                "competitor_price": 40000
            })))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let payload = read_json_body(response).await;
        let message = payload["error"].as_str().unwrap_or_default();
        assert!(message.starts_with("prediction error:"));
        assert!(message.contains("base_price"));
    }

    #[tokio::test]
    async fn predict_rejects_missing_fields() {
        let response = router(FlatModel)
            .oneshot(post_predict(json!({ "product": "Laptop" })))
            .await
            .expect("route executes");

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn model_failure_is_internal_error() {
        let response = router(BrokenModel)
            .oneshot(post_predict(json!({
                "product": "Laptop",
                "category": "Electronics",
                "region": "North",
                "base_price": 50000,
                "discount_pct": 10
            })))
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let payload = read_json_body(response).await;
        let message = payload["error"].as_str().unwrap_or_default();
        assert!(message.starts_with("prediction error:"));
        assert!(message.contains("not trained"));
    }
}
