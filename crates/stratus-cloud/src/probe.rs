use crate::endpoint::ProviderTable;
use crate::error::CloudError;
use crate::http::MetadataClient;
use crate::ProviderKind;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Determines which cloud platform the host runs on.
///
/// Providers are probed one after the other in table order; the first check
/// URL that answers with a 2xx status wins. Worst-case latency is the number
/// of providers times the probe timeout.
pub struct Prober {
    client: Arc<dyn MetadataClient>,
    table: Arc<ProviderTable>,
    timeout: Duration,
}

impl Prober {
    pub fn new(client: Arc<dyn MetadataClient>, table: Arc<ProviderTable>, timeout: Duration) -> Self {
        Self {
            client,
            table,
            timeout,
        }
    }

    /// Returns the detected provider, or [`ProviderKind::None`] when every
    /// probe failed. Probe failures are never surfaced.
    pub async fn detect(&self) -> ProviderKind {
        for spec in self.table.iter() {
            let result = timeout(
                self.timeout,
                self.client.get(&spec.check_url, &spec.headers, self.timeout),
            )
            .await
            .unwrap_or_else(|_| {
                Err(CloudError::Timeout {
                    url: spec.check_url.clone(),
                    timeout_ms: self.timeout.as_millis(),
                })
            });

            match result {
                Ok(_) => {
                    tracing::debug!(provider = %spec.kind, "Cloud provider detected");
                    return spec.kind;
                }
                Err(e) => {
                    tracing::debug!(provider = %spec.kind, error = %e, "Provider probe missed");
                }
            }
        }
        ProviderKind::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeClient, Reply};

    const AWS_CHECK: &str = "http://169.254.169.254/latest/dynamic/instance-identity/document";
    const AZURE_CHECK: &str = "http://169.254.169.254/metadata/instance?api-version=2017-12-01";
    const GCP_CHECK: &str = "http://metadata.google.internal/computeMetadata/v1/instance/id";
    const ALIBABA_CHECK: &str = "http://100.100.100.200/latest/meta-data/instance-id";

    fn prober(client: Arc<FakeClient>) -> Prober {
        Prober::new(
            client,
            Arc::new(ProviderTable::standard()),
            Duration::from_millis(100),
        )
    }

    #[tokio::test]
    async fn aws_check_success_detects_aws() {
        let client = Arc::new(FakeClient::new().body(AWS_CHECK, "{}"));
        assert_eq!(prober(client.clone()).detect().await, ProviderKind::Aws);
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn failures_advance_to_next_candidate() {
        let client = Arc::new(
            FakeClient::new()
                .with(AWS_CHECK, Reply::Status(404))
                .with(AZURE_CHECK, Reply::Status(500))
                .body(GCP_CHECK, "1234567890"),
        );

        assert_eq!(prober(client.clone()).detect().await, ProviderKind::Gcp);
        assert_eq!(client.calls(), vec![AWS_CHECK, AZURE_CHECK, GCP_CHECK]);
    }

    #[tokio::test]
    async fn probes_send_provider_headers() {
        let client = Arc::new(FakeClient::new().body(ALIBABA_CHECK, "i-abc"));

        assert_eq!(prober(client.clone()).detect().await, ProviderKind::Alibaba);
        assert_eq!(
            client.headers_for(AZURE_CHECK).unwrap(),
            vec![("Metadata".to_string(), "true".to_string())]
        );
        assert_eq!(
            client.headers_for(GCP_CHECK).unwrap(),
            vec![("Metadata-Flavor".to_string(), "Google".to_string())]
        );
        assert!(client.headers_for(ALIBABA_CHECK).unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_answer_returns_none() {
        let client = Arc::new(FakeClient::new());
        assert_eq!(prober(client.clone()).detect().await, ProviderKind::None);
        assert_eq!(client.call_count(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_services_time_out_within_budget() {
        let mut client = FakeClient::new();
        for spec in ProviderTable::standard().iter() {
            client = client.with(&spec.check_url, Reply::Hang);
        }
        let prober = prober(Arc::new(client));

        let started = tokio::time::Instant::now();
        let detected = prober.detect().await;

        assert_eq!(detected, ProviderKind::None);
        assert!(started.elapsed() <= Duration::from_millis(5 * 100));
    }
}
