//! HTTP adapter for the remote reasoning service
//!
//! Posts `{"prompt": ...}` and hands the raw response body back to the
//! analyzer, which does its own parsing.

use crate::tx::ReasoningTransport;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;

/// Reasoning service reached over HTTP
pub struct HttpTransport {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpTransport {
    /// Create a transport for `endpoint`
    ///
    /// # Arguments
    /// * `endpoint` - full URL the prompt is posted to
    /// * `api_key` - sent as a bearer token when present
    pub fn new(endpoint: &str, api_key: Option<&str>) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()).map(str::to_string),
            client: Client::new(),
        }
    }

    /// Create from `OMNIGUARD_REMOTE_ENDPOINT` / `OMNIGUARD_REMOTE_API_KEY`
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("OMNIGUARD_REMOTE_ENDPOINT").map_err(|_| {
            anyhow!("Remote endpoint required. Set remote_endpoint in the config file or OMNIGUARD_REMOTE_ENDPOINT.")
        })?;
        let api_key = std::env::var("OMNIGUARD_REMOTE_API_KEY").ok();
        Ok(Self::new(&endpoint, api_key.as_deref()))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReasoningTransport for HttpTransport {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let payload = serde_json::json!({ "prompt": prompt });

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Reasoning service returned HTTP {}", status));
        }

        let body = response.text().await.context("Failed to read response body")?;
        tracing::debug!(bytes = body.len(), "reasoning service replied");
        Ok(body)
    }
}
