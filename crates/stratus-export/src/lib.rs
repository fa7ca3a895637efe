//! Batched export of plugin stats to a remote HTTP collector.
//!
//! Every plugin records its latest stats into an [`exporter::HttpExporter`];
//! a [`scheduler::FlushScheduler`] periodically sends everything recorded as
//! one JSON document. Delivery is fire-and-forget: a failed flush is logged
//! and dropped, never retried or persisted.

pub mod buffer;
pub mod error;
pub mod exporter;
pub mod scheduler;
pub mod transport;

#[cfg(test)]
mod tests;

use serde::Deserialize;
use std::path::PathBuf;

/// Export settings, usually the `[export]` table of the agent config.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    /// Collector endpoint receiving the POSTed batches.
    pub url: Option<String>,
    /// Sent as the `apikey` header and inside the payload metadata.
    pub api_key: Option<String>,
    /// Host identifier, sent as the `host` header.
    pub host: Option<String>,
    #[serde(default = "default_flush_interval")]
    pub flush_interval_secs: u64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Offline mode. When set, a flush writes the payload to this file
    /// instead of sending it, and the agent exits afterwards. Off unless
    /// configured explicitly.
    #[serde(default)]
    pub dump_path: Option<PathBuf>,
}

fn default_flush_interval() -> u64 {
    60
}

fn default_timeout() -> u64 {
    5
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            host: None,
            flush_interval_secs: default_flush_interval(),
            timeout_secs: default_timeout(),
            dump_path: None,
        }
    }
}
