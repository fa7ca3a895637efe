use crate::error::{ExportError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Delivers one serialized payload to the collector.
#[async_trait]
pub trait ExportTransport: Send + Sync {
    /// POSTs `body` as JSON and returns the response status.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::HttpStatus`] for a non-2xx status, or a
    /// transport error when the collector cannot be reached in time.
    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: String,
        timeout: Duration,
    ) -> Result<u16>;
}

/// [`ExportTransport`] backed by `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExportTransport for ReqwestTransport {
    async fn post(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: String,
        timeout: Duration,
    ) -> Result<u16> {
        let mut request = self
            .client
            .post(url)
            .timeout(timeout)
            .header("Content-Type", "application/json");
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.body(body).send().await.map_err(|e| {
            if e.is_connect() {
                ExportError::Unreachable {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            } else {
                ExportError::Http(e)
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExportError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(status.as_u16())
    }
}
