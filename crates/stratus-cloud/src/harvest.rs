use crate::endpoint::{EndpointSpec, FetchStrategy, ProviderTable};
use crate::error::{CloudError, Result};
use crate::http::MetadataClient;
use crate::{MetadataSnapshot, ProviderKind};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Fetches a detected provider's instance metadata.
///
/// Harvesting is best effort: every failure is logged at debug level and only
/// removes the affected key from the snapshot. Once a provider is known the
/// snapshot always carries its `type` tag.
pub struct Harvester {
    client: Arc<dyn MetadataClient>,
    table: Arc<ProviderTable>,
    timeout: Duration,
}

impl Harvester {
    pub fn new(client: Arc<dyn MetadataClient>, table: Arc<ProviderTable>, timeout: Duration) -> Self {
        Self {
            client,
            table,
            timeout,
        }
    }

    pub async fn harvest(&self, provider: ProviderKind) -> MetadataSnapshot {
        let Some(spec) = self.table.get(provider) else {
            tracing::debug!(provider = %provider, "No metadata endpoint for provider");
            return MetadataSnapshot::empty();
        };

        let mut snapshot = MetadataSnapshot::for_provider(provider);
        match &spec.strategy {
            FetchStrategy::Document { url, fields } => {
                self.harvest_document(spec, url, fields, &mut snapshot).await
            }
            FetchStrategy::Enumeration { base_url, entries } => {
                self.harvest_entries(spec, base_url, entries, &mut snapshot)
                    .await
            }
        }
        snapshot
    }

    async fn fetch(&self, url: &str, spec: &EndpointSpec) -> Result<String> {
        match timeout(self.timeout, self.client.get(url, &spec.headers, self.timeout)).await {
            Ok(result) => result,
            Err(_) => Err(CloudError::Timeout {
                url: url.to_string(),
                timeout_ms: self.timeout.as_millis(),
            }),
        }
    }

    async fn harvest_document(
        &self,
        spec: &EndpointSpec,
        url: &str,
        fields: &[&'static str],
        snapshot: &mut MetadataSnapshot,
    ) {
        let document = match self.fetch(url, spec).await.and_then(|body| {
            serde_json::from_str::<Value>(&body).map_err(CloudError::from)
        }) {
            Ok(document) => document,
            Err(e) => {
                tracing::debug!(provider = %spec.kind, url = %url, error = %e, "Cannot fetch metadata document");
                return;
            }
        };

        for field in fields {
            match document.get(*field) {
                Some(value) => snapshot.insert(*field, value.clone()),
                None => {
                    let e = CloudError::MissingField {
                        provider: spec.kind,
                        field: field.to_string(),
                    };
                    tracing::debug!(error = %e, "Metadata field skipped");
                }
            }
        }
    }

    async fn harvest_entries(
        &self,
        spec: &EndpointSpec,
        base_url: &str,
        entries: &[(&'static str, &'static str)],
        snapshot: &mut MetadataSnapshot,
    ) {
        for (key, sub_path) in entries {
            let url = EndpointSpec::entry_url(base_url, sub_path);
            match self.fetch(&url, spec).await {
                Ok(body) => snapshot.insert(*key, Value::String(body)),
                Err(e) => {
                    tracing::debug!(provider = %spec.kind, url = %url, error = %e, "Metadata entry skipped");
                }
            }
        }
    }
}
