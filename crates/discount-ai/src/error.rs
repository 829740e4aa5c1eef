use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::dashboard::{ClientError, DashboardError};
use crate::model::TrainingError;
use crate::prediction::PredictionError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Training(TrainingError),
    Catalog(CatalogError),
    Prediction(PredictionError),
    Client(ClientError),
    Dashboard(DashboardError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Catalog(CatalogError::UnknownProduct(_)) => StatusCode::NOT_FOUND,
            AppError::Prediction(PredictionError::InvalidRequest(_))
            | AppError::Client(ClientError::Prediction(PredictionError::InvalidRequest(_)))
            | AppError::Dashboard(DashboardError::Client(ClientError::Prediction(
                PredictionError::InvalidRequest(_),
            ))) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Dashboard(DashboardError::InvalidSettings(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Training(err) => write!(f, "training error: {}", err),
            AppError::Catalog(err) => write!(f, "catalog error: {}", err),
            AppError::Prediction(err) => write!(f, "prediction error: {}", err),
            AppError::Client(err) => write!(f, "client error: {}", err),
            AppError::Dashboard(err) => write!(f, "dashboard error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Training(err) => Some(err),
            AppError::Catalog(err) => Some(err),
            AppError::Prediction(err) => Some(err),
            AppError::Client(err) => Some(err),
            AppError::Dashboard(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<TrainingError> for AppError {
    fn from(value: TrainingError) -> Self {
        Self::Training(value)
    }
}

impl From<CatalogError> for AppError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value)
    }
}

impl From<PredictionError> for AppError {
    fn from(value: PredictionError) -> Self {
        Self::Prediction(value)
    }
}

impl From<ClientError> for AppError {
    fn from(value: ClientError) -> Self {
        Self::Client(value)
    }
}

impl From<DashboardError> for AppError {
    fn from(value: DashboardError) -> Self {
        Self::Dashboard(value)
    }
}
