use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::{collaborators::ExternalProcessTrigger, validation::DynError};

pub const DEFAULT_HOPPER_URL: &str = "http://localhost:8080";
/// Bound on each hopper request, so a silent hopper fails the trigger.
pub const DEFAULT_HOPPER_TIMEOUT: Duration = Duration::from_secs(60);
const CHROMOSOMES_PATH: &str = "chromosomes";

#[derive(Debug, Error)]
pub enum HopperError {
    #[error("invalid hopper url '{url}': {message}")]
    InvalidUrl { url: String, message: String },
    #[error("hopper request {method} {url} failed: {source}")]
    Request {
        method: &'static str,
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to build hopper http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("hopper returned an unusable batch id: {0}")]
    BatchId(Value),
}

/// HTTP client for the chromosome batch processor ("hopper").
#[derive(Clone, Debug)]
pub struct HopperClient {
    base_url: Url,
    client: Client,
}

impl HopperClient {
    pub fn new(base_url: &str) -> Result<Self, HopperError> {
        Self::with_timeout(base_url, DEFAULT_HOPPER_TIMEOUT)
    }

    /// Every request (connect through body) must complete within `timeout`.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, HopperError> {
        let mut base_url = Url::parse(base_url).map_err(|err| HopperError::InvalidUrl {
            url: base_url.to_owned(),
            message: err.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(HopperError::InvalidUrl {
                url: base_url.to_string(),
                message: "url cannot be a base".to_owned(),
            });
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(HopperError::Client)?;

        Ok(Self { base_url, client })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Starts a batch and returns the ids of the tickers it processed.
    pub async fn batch_process_tickers(&self) -> Result<Vec<Value>, HopperError> {
        let batch_id = self.create_batch().await?;
        self.batch_result(&batch_id).await
    }

    async fn create_batch(&self) -> Result<String, HopperError> {
        let url = self.join(CHROMOSOMES_PATH)?;
        debug!(%url, "creating hopper batch");
        let response = self.client.post(url.clone()).send().await;
        let batch_id: Value = Self::decode("POST", url, response).await?;

        match batch_id {
            Value::String(id) if !id.is_empty() => Ok(id),
            Value::Number(id) => Ok(id.to_string()),
            other => Err(HopperError::BatchId(other)),
        }
    }

    async fn batch_result(&self, batch_id: &str) -> Result<Vec<Value>, HopperError> {
        let url = self.join(&format!("{CHROMOSOMES_PATH}/{batch_id}"))?;
        debug!(%url, batch_id, "fetching hopper batch result");
        let response = self.client.get(url.clone()).send().await;
        Self::decode("GET", url, response).await
    }

    async fn decode<T>(
        method: &'static str,
        url: Url,
        response: reqwest::Result<reqwest::Response>,
    ) -> Result<T, HopperError>
    where
        T: DeserializeOwned,
    {
        let decoded = match response.and_then(reqwest::Response::error_for_status) {
            Ok(response) => response.json::<T>().await,
            Err(err) => Err(err),
        };
        decoded.map_err(|source| HopperError::Request {
            method,
            url,
            source,
        })
    }

    fn join(&self, path: &str) -> Result<Url, HopperError> {
        self.base_url
            .join(path)
            .map_err(|err| HopperError::InvalidUrl {
                url: format!("{}{path}", self.base_url),
                message: err.to_string(),
            })
    }
}

#[async_trait]
impl ExternalProcessTrigger for HopperClient {
    async fn run(&self) -> Result<(), DynError> {
        let processed = self.batch_process_tickers().await?;
        info!(
            hopper = %self.base_url,
            processed = processed.len(),
            "hopper batch processing finished"
        );
        Ok(())
    }
}
