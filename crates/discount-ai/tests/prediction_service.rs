//! End-to-end checks of the prediction endpoint backed by models trained on the bundled
//! sales history.

mod common {
    use std::path::PathBuf;
    use std::sync::Arc;

    use discount_ai::model::{ForestParams, SalesHistory, TrainedSalesModel};
    use discount_ai::prediction::PredictionService;

    pub(super) fn history() -> SalesHistory {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/sales_history.csv");
        SalesHistory::from_path(path).expect("bundled sales history loads")
    }

    pub(super) fn params() -> ForestParams {
        ForestParams {
            trees: 25,
            ..ForestParams::default()
        }
    }

    pub(super) fn service() -> Arc<PredictionService<TrainedSalesModel>> {
        let model = TrainedSalesModel::train(&history(), &params()).expect("models train");
        Arc::new(PredictionService::new(Arc::new(model)))
    }
}

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use discount_ai::model::TrainedSalesModel;
use discount_ai::prediction::{prediction_router, round2, PredictionRequest, PriceAlert};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn post_predict(payload: Value) -> (StatusCode, Value) {
    let app = prediction_router(common::service());
    let request = Request::post("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds");
    let response = app.oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

fn laptop(discount_pct: f64, competitor_price: Option<f64>) -> Value {
    let mut payload = json!({
        "product": "Laptop",
        "category": "Electronics",
        "region": "North",
        "base_price": 50000.0,
        "discount_pct": discount_pct,
    });
    if let Some(price) = competitor_price {
        payload["competitor_price"] = json!(price);
    }
    payload
}

#[test]
fn bundled_history_covers_every_region() {
    let history = common::history();
    assert!(history.len() >= 300);
    for region in ["North", "South", "East", "West", "Central"] {
        assert!(history
            .records()
            .iter()
            .any(|record| record.features.region == region));
    }
}

#[tokio::test]
async fn trained_model_serves_rounded_predictions() {
    let (status, body) = post_predict(laptop(10.0, Some(44_000.0))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["our_price"], 45000.0);
    assert_eq!(body["price_alert"], "Expensive");
    for field in ["predicted_profit", "predicted_units_sold"] {
        let value = body[field].as_f64().expect("numeric prediction");
        assert!(value.is_finite());
        assert_eq!(round2(value), value, "{field} is rounded to cents");
    }
}

#[tokio::test]
async fn competitor_price_is_optional() {
    let (status, body) = post_predict(laptop(20.0, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["our_price"], 40000.0);
    assert!(body.get("price_alert").is_none());
}

#[tokio::test]
async fn invalid_requests_are_rejected_before_scoring() {
    let (status, body) = post_predict(laptop(120.0, Some(44_000.0))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().is_some());

    let (status, _) = post_predict(json!({ "product": "Laptop" })).await;
    assert!(status.is_client_error());
}

#[test]
fn unknown_categories_still_predict() {
    let service = common::service();
    let request = PredictionRequest {
        product: "Hoverboard".to_string(),
        category: "Mobility".to_string(),
        region: "Atlantis".to_string(),
        base_price: 30_000.0,
        discount_pct: 25.0,
        competitor_price: Some(22_500.0),
    };

    let response = service.predict(&request).expect("unseen categories are ignored");
    assert_eq!(response.our_price, 22_500.0);
    assert_eq!(response.price_alert, Some(PriceAlert::Equal));
    assert!(response.predicted_profit.is_finite());
}

#[test]
fn fixed_seed_makes_training_deterministic() {
    let history = common::history();
    let first = TrainedSalesModel::train(&history, &common::params()).expect("trains");
    let second = TrainedSalesModel::train(&history, &common::params()).expect("trains");
    assert_eq!(first, second);
}
