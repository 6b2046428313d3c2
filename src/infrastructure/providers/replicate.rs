use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};
use zeroize::Zeroizing;

use super::{error_from_response, VideoGenerator};
use crate::entities::generation::VideoGenerationRequest;
use crate::errors::{Provider, ProviderError, ProviderErrorKind};

const MODEL_PATH: &str = "pixverse/pixverse-v4.5";
const POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct ReplicateClient {
    http: reqwest::Client,
    api_token: Zeroizing<String>,
    base_url: String,
    timeout: Duration,
    poll_interval: Duration,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: String,
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<serde_json::Value>,
    urls: Option<PredictionUrls>,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    get: Option<String>,
}

impl Prediction {
    fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "succeeded" | "failed" | "canceled")
    }

    fn video_url(&self) -> Option<String> {
        match self.output.as_ref()? {
            serde_json::Value::String(url) => Some(url.clone()),
            serde_json::Value::Array(items) => items.first()?.as_str().map(str::to_string),
            _ => None,
        }
    }

    fn into_result(self) -> Result<String, ProviderError> {
        match self.status.as_str() {
            "succeeded" => self.video_url().ok_or_else(|| {
                ProviderError::new(Provider::Replicate, ProviderErrorKind::Upstream, "Prediction returned no output")
            }),
            _ => {
                let message = match &self.error {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => format!("Prediction {} {}", self.id, self.status),
                };
                Err(ProviderError::from_message(Provider::Replicate, message))
            }
        }
    }
}

impl ReplicateClient {
    pub fn new(api_token: &str, base_url: &str, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_token: Zeroizing::new(api_token.to_string()),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    fn transport(e: reqwest::Error) -> ProviderError {
        ProviderError::from_transport(Provider::Replicate, &e)
    }

    async fn read_prediction(response: reqwest::Response) -> Result<Prediction, ProviderError> {
        if !response.status().is_success() {
            return Err(error_from_response(Provider::Replicate, response).await);
        }
        response.json().await.map_err(Self::transport)
    }

    async fn poll(&self, mut prediction: Prediction, started: Instant) -> Result<Prediction, ProviderError> {
        while !prediction.is_terminal() {
            if started.elapsed() >= self.timeout {
                return Err(ProviderError::new(
                    Provider::Replicate,
                    ProviderErrorKind::Timeout,
                    format!("Prediction {} timeout after {}s", prediction.id, self.timeout.as_secs()),
                ));
            }

            let get_url = prediction
                .urls
                .as_ref()
                .and_then(|u| u.get.clone())
                .unwrap_or_else(|| format!("{}/v1/predictions/{}", self.base_url, prediction.id));

            tokio::time::sleep(self.poll_interval).await;
            debug!(id = %prediction.id, status = %prediction.status, "Polling prediction");

            let response = self
                .http
                .get(get_url)
                .bearer_auth(self.api_token.as_str())
                .send()
                .await
                .map_err(Self::transport)?;
            prediction = Self::read_prediction(response).await?;
        }
        Ok(prediction)
    }
}

#[async_trait]
impl VideoGenerator for ReplicateClient {
    async fn generate(&self, request: &VideoGenerationRequest) -> Result<String, ProviderError> {
        let started = Instant::now();
        let response = self
            .http
            .post(format!("{}/v1/models/{}/predictions", self.base_url, MODEL_PATH))
            .bearer_auth(self.api_token.as_str())
            .header("Prefer", "wait")
            .json(&serde_json::json!({ "input": request.model_input() }))
            .send()
            .await
            .map_err(Self::transport)?;

        let prediction = Self::read_prediction(response).await?;
        let prediction = self.poll(prediction, started).await?;

        info!(id = %prediction.id, status = %prediction.status, "Video prediction finished");
        prediction.into_result()
    }
}
