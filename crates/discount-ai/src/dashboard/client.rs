use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::ClientConfig;
use crate::prediction::{
    PredictionError, PredictionRequest, PredictionResponse, PredictionService, SalesModel,
};

/// Source of predictions for the dashboards. Calls are issued one at a time.
#[async_trait]
pub trait PredictionClient: Send + Sync {
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, ClientError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("prediction request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
}

/// Calls a remote `POST /predict` endpoint. No retries: the first failure ends the run.
#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    client: reqwest::Client,
    url: String,
}

impl HttpPredictionClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(config.api_url.clone(), config.timeout)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PredictionClient for HttpPredictionClient {
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, ClientError> {
        debug!(
            url = %self.url,
            region = %request.region,
            discount_pct = request.discount_pct,
            "calling prediction api"
        );
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<PredictionResponse>().await?)
    }
}

/// Serves predictions from an in-process model.
pub struct LocalPredictionClient<M> {
    service: Arc<PredictionService<M>>,
}

impl<M> LocalPredictionClient<M>
where
    M: SalesModel + 'static,
{
    pub fn new(service: Arc<PredictionService<M>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<M> PredictionClient for LocalPredictionClient<M>
where
    M: SalesModel + 'static,
{
    async fn predict(&self, request: &PredictionRequest) -> Result<PredictionResponse, ClientError> {
        Ok(self.service.predict(request)?)
    }
}
