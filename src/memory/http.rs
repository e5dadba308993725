//! HTTP memory store: POSTs the rendered command as `text/plain`.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, error};

use super::StoreError;

#[derive(Debug, Clone)]
pub struct HttpMemoryStore {
    client: Client,
    endpoint: String,
}

impl HttpMemoryStore {
    /// `timeout_seconds == 0` disables the client timeout.
    pub fn new(endpoint: String, timeout_seconds: u64) -> Result<Self, StoreError> {
        let mut builder = Client::builder();
        if timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(timeout_seconds));
        }
        let client = builder
            .build()
            .map_err(|e| StoreError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, endpoint })
    }

    /// Send `command` and return the response body.
    ///
    /// Non-2xx responses are errors; the body is kept for the diagnostic.
    pub async fn send(&self, command: &str) -> Result<String, StoreError> {
        debug!(endpoint = %self.endpoint, len = command.len(), "persisting memory");

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "text/plain")
            .body(command.to_string())
            .send()
            .await
            .map_err(|e| {
                error!(endpoint = %self.endpoint, error = %e, "memory store unreachable");
                StoreError::Request(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::Request(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(StoreError::Status { status: status.as_u16(), body });
        }
        Ok(body)
    }
}
