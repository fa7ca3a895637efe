use crate::error::{CloudError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Minimal HTTP capability needed to talk to metadata services.
///
/// Chosen once at startup and shared by the prober and the harvester, so
/// tests can substitute an in-memory implementation.
#[async_trait]
pub trait MetadataClient: Send + Sync {
    /// Issues a GET and returns the body of a 2xx response.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::HttpStatus`] for a non-2xx status, or a transport
    /// error when the service cannot be reached in time.
    async fn get(&self, url: &str, headers: &[(&str, &str)], timeout: Duration) -> Result<String>;
}

/// [`MetadataClient`] backed by `reqwest`.
pub struct ReqwestMetadataClient {
    client: Client,
}

impl ReqwestMetadataClient {
    /// Builds a client that never goes through a proxy: metadata services are
    /// link-local and must be reached directly.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self> {
        let client = Client::builder().no_proxy().build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MetadataClient for ReqwestMetadataClient {
    async fn get(&self, url: &str, headers: &[(&str, &str)], timeout: Duration) -> Result<String> {
        let mut request = self.client.get(url).timeout(timeout);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                CloudError::Timeout {
                    url: url.to_string(),
                    timeout_ms: timeout.as_millis(),
                }
            } else if e.is_connect() {
                CloudError::Unreachable {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            } else {
                CloudError::Network(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CloudError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}
