//! Review API client.
//!
//! Issues `GET <endpoint>?from_date=<cursor>` with an OAuth header and hands
//! back the decoded JSON body without interpreting it. Shape checks live in
//! [`crate::homework`].

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::instrument;

use crate::config::Config;
use crate::error::{HwbotError, Result};

/// Source of homework status documents.
///
/// The poller only depends on this trait, so tests can substitute scripted
/// responses for the network.
#[async_trait]
pub trait HomeworkApi: Send + Sync {
    /// Fetches every homework changed since `from_date` (unix seconds).
    async fn fetch_homeworks(&self, from_date: i64) -> Result<Value>;
}

/// Builds the HTTP client shared by both transports, with the configured
/// request timeout.
///
/// # Errors
///
/// `ConnectionFailure` if the TLS backend cannot be initialised.
pub fn http_client(config: &Config) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(HwbotError::ConnectionFailure)
}

/// HTTP client for the review API.
#[derive(Debug, Clone)]
pub struct ReviewApiClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl ReviewApiClient {
    /// Creates a client around an existing `reqwest::Client`.
    pub fn new(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }

    /// Creates a client from configuration, applying the request timeout.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = http_client(config)?;
        Ok(Self::new(
            client,
            config.endpoint.clone(),
            config.credentials.api_token(),
        ))
    }
}

#[async_trait]
impl HomeworkApi for ReviewApiClient {
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch_homeworks(&self, from_date: i64) -> Result<Value> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .send()
            .await
            .map_err(HwbotError::ConnectionFailure)?;

        tracing::info!(status = %response.status(), "Review API request completed");

        if response.status() != StatusCode::OK {
            return Err(HwbotError::UnexpectedStatus {
                status: response.status().as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(HwbotError::ConnectionFailure)?;
        serde_json::from_slice(&body).map_err(HwbotError::InvalidJson)
    }
}
