//! Remote prediction services.
//!
//! The imputation and classification services are opaque collaborators reached with a JSON
//! `POST`. [`PredictionService`] is the seam the orchestrator talks to; [`HttpPredictionClient`]
//! is the production implementation.

use crate::config::CoreConfig;
use crate::error::{AssessmentError, AssessmentResult, RemoteError, RemoteService};
use crate::record::FormRecord;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The record returned by the imputation service, with missing optional values filled in.
///
/// It is passed on to the classification service as-is.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImputedRecord(serde_json::Map<String, serde_json::Value>);

impl ImputedRecord {
    pub fn new(fields: serde_json::Map<String, serde_json::Value>) -> Self {
        Self(fields)
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The two-step prediction pipeline.
#[async_trait]
pub trait PredictionService: Send + Sync {
    /// Fills in missing optional measurements.
    async fn impute(&self, record: &FormRecord) -> Result<ImputedRecord, RemoteError>;

    /// Returns the raw classification code: `0` for AGA, anything else for SGA.
    async fn classify(&self, record: &ImputedRecord) -> Result<i64, RemoteError>;
}

/// Builds the shared HTTP client. No timeout is applied unless one is configured.
pub(crate) fn build_http_client(timeout: Option<Duration>) -> AssessmentResult<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(AssessmentError::HttpClient)
}

/// Sends a request and decodes a JSON response body.
///
/// Transport failures, non-2xx statuses and undecodable bodies are kept distinct so the logged
/// cause says which one happened.
pub(crate) async fn send_json<T: DeserializeOwned>(
    service: RemoteService,
    request: RequestBuilder,
) -> Result<T, RemoteError> {
    let response = request
        .send()
        .await
        .map_err(|source| RemoteError::Transport { service, source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(RemoteError::Status {
            service,
            status: status.as_u16(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|source| RemoteError::Transport { service, source })?;
    serde_json::from_slice(&body).map_err(|e| RemoteError::Malformed {
        service,
        reason: e.to_string(),
    })
}

/// Reads a classification code from the service's JSON response.
///
/// Integers are taken as-is and other JSON numbers are compared against zero; anything that is
/// not a number is malformed.
pub fn classification_code(value: &serde_json::Value) -> Result<i64, RemoteError> {
    if let Some(code) = value.as_i64() {
        return Ok(code);
    }
    match value.as_f64() {
        Some(code) if code == 0.0 => Ok(0),
        Some(_) => Ok(1),
        None => Err(RemoteError::Malformed {
            service: RemoteService::Classification,
            reason: format!("expected a number, got {value}"),
        }),
    }
}

/// Prediction service reached over HTTP.
#[derive(Clone, Debug)]
pub struct HttpPredictionClient {
    client: Client,
    impute_url: Url,
    classify_url: Url,
}

impl HttpPredictionClient {
    pub fn new(cfg: &CoreConfig) -> AssessmentResult<Self> {
        Ok(Self {
            client: build_http_client(cfg.request_timeout())?,
            impute_url: cfg.impute_url().clone(),
            classify_url: cfg.classify_url().clone(),
        })
    }
}

#[async_trait]
impl PredictionService for HttpPredictionClient {
    async fn impute(&self, record: &FormRecord) -> Result<ImputedRecord, RemoteError> {
        tracing::debug!(url = %self.impute_url, fields = record.len(), "posting record for imputation");
        let request = self.client.post(self.impute_url.clone()).json(record);
        send_json(RemoteService::Imputation, request).await
    }

    async fn classify(&self, record: &ImputedRecord) -> Result<i64, RemoteError> {
        tracing::debug!(url = %self.classify_url, fields = record.len(), "posting imputed record for classification");
        let request = self.client.post(self.classify_url.clone()).json(record);
        let value: serde_json::Value = send_json(RemoteService::Classification, request).await?;
        classification_code(&value)
    }
}
