use crate::buffer::ExportBuffer;
use crate::error::{ExportError, Result};
use crate::transport::ExportTransport;
use crate::ExportConfig;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use stratus_common::types::Stats;
use stratus_common::AGENT_VERSION;

/// Timestamp format of the `sent_at` field.
pub const SENT_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Result of one [`HttpExporter::flush`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was recorded since the last flush.
    Empty,
    /// The collector accepted the batch.
    Delivered { status: u16 },
    /// Delivery failed; the batch is gone.
    Dropped,
    /// Offline mode wrote the batch to this file.
    Dumped(PathBuf),
}

enum Target {
    Endpoint(String),
    Dump(PathBuf),
}

/// Accumulates plugin stats and ships them as one JSON payload per flush.
pub struct HttpExporter {
    buffer: ExportBuffer,
    transport: Arc<dyn ExportTransport>,
    target: Target,
    headers: Vec<(String, String)>,
    metadata: Value,
    timeout: Duration,
}

fn required(value: &Option<String>, name: &'static str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ExportError::MissingConfig(name)),
    }
}

impl HttpExporter {
    /// # Errors
    ///
    /// Returns [`ExportError::MissingConfig`] when the API key or host is
    /// missing, or when neither an endpoint URL nor a dump path is set.
    /// Exporting without credentials is pointless, so this aborts setup.
    pub fn new(config: &ExportConfig, transport: Arc<dyn ExportTransport>) -> Result<Self> {
        let api_key = required(&config.api_key, "api_key")?;
        let host = required(&config.host, "host")?;
        let target = match &config.dump_path {
            Some(path) => Target::Dump(path.clone()),
            None => Target::Endpoint(required(&config.url, "url")?),
        };

        Ok(Self {
            buffer: ExportBuffer::new(),
            transport,
            target,
            headers: vec![
                ("apikey".to_string(), api_key.clone()),
                ("host".to_string(), host),
            ],
            metadata: json!({
                "api-key": api_key,
                "version": AGENT_VERSION,
            }),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    /// Records the latest stats of plugin `name`.
    pub fn record(&self, name: &str, data: Value) {
        self.buffer.record(name, data);
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Sends everything recorded since the previous flush.
    ///
    /// The buffer is emptied before delivery starts, so it is empty
    /// afterwards whatever the outcome.
    pub async fn flush(&self) -> FlushOutcome {
        let batch = self.buffer.take();
        if batch.is_empty() {
            return FlushOutcome::Empty;
        }

        let plugins = batch.len();
        let payload = self.build_payload(batch, Utc::now());
        let body = match serde_json::to_string(&payload) {
            Ok(body) => body,
            Err(e) => {
                tracing::info!(error = %e, "Cannot serialize export batch, dropping it");
                return FlushOutcome::Dropped;
            }
        };

        match &self.target {
            Target::Dump(path) => match tokio::fs::write(path, body).await {
                Ok(()) => {
                    tracing::info!(path = %path.display(), plugins, "Export batch written to dump file");
                    FlushOutcome::Dumped(path.clone())
                }
                Err(e) => {
                    tracing::info!(path = %path.display(), error = %ExportError::from(e), "Cannot write dump file");
                    FlushOutcome::Dropped
                }
            },
            Target::Endpoint(url) => {
                match self
                    .transport
                    .post(url, &self.headers, body, self.timeout)
                    .await
                {
                    Ok(status) => {
                        tracing::debug!(status, plugins, "Export batch delivered");
                        FlushOutcome::Delivered { status }
                    }
                    Err(e) => {
                        tracing::info!(url = %url, error = %e, "Cannot deliver export batch, dropping it");
                        FlushOutcome::Dropped
                    }
                }
            }
        }
    }

    /// Adds `metadata` and `sent_at` to a drained batch.
    fn build_payload(&self, mut batch: Stats, sent_at: DateTime<Utc>) -> Value {
        batch.insert("metadata".to_string(), self.metadata.clone());
        batch.insert(
            "sent_at".to_string(),
            Value::String(sent_at.format(SENT_AT_FORMAT).to_string()),
        );
        Value::Object(batch)
    }
}
