use crate::collector::BackgroundCollector;
use crate::scanner::MetadataScanner;
use crate::{MetadataSnapshot, ProviderKind};
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use stratus_collector::StatsPlugin;
use stratus_common::types::{InputMethod, Stats};
use tokio::runtime::Handle;

enum Source {
    /// Copies the background collector's latest snapshot; no I/O on update.
    Background(BackgroundCollector),
    /// Detects and harvests on every update, blocking the caller.
    Inline { scanner: MetadataScanner, runtime: Handle },
}

/// Exposes the host's cloud instance metadata as the `cloud` stats.
///
/// Detection only runs when the agent reads local stats; in remote mode the
/// plugin reports nothing.
pub struct CloudPlugin {
    source: Source,
    input_method: InputMethod,
    stats: Stats,
}

impl CloudPlugin {
    /// Starts `collector` and serves its snapshots. Must be called inside a
    /// tokio runtime.
    pub fn background(collector: BackgroundCollector, input_method: InputMethod) -> Self {
        if input_method == InputMethod::Local {
            collector.start();
        }
        Self {
            source: Source::Background(collector),
            input_method,
            stats: Stats::new(),
        }
    }

    /// Scans synchronously on `runtime` inside every `update`.
    ///
    /// `update` then blocks for up to the full probe budget and must be
    /// called from a thread that is not driving an async runtime (for
    /// instance a `spawn_blocking` worker). `runtime` must belong to a
    /// multi-threaded runtime so its timers keep running.
    pub fn inline(scanner: MetadataScanner, runtime: Handle, input_method: InputMethod) -> Self {
        Self {
            source: Source::Inline { scanner, runtime },
            input_method,
            stats: Stats::new(),
        }
    }

    /// One-line description for display, empty when no provider is known.
    pub fn summary(&self) -> String {
        let provider = self
            .stats
            .get(crate::TYPE_KEY)
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<ProviderKind>().ok())
            .unwrap_or(ProviderKind::None);
        if provider == ProviderKind::None {
            return String::new();
        }

        let text = |key: &str| self.stats.get(key).and_then(Value::as_str);
        match (text("instanceType"), text("instanceId"), text("region")) {
            (Some(kind), Some(id), Some(region)) if provider == ProviderKind::Aws => {
                format!("{} {kind} instance {id} ({region})", provider.title())
            }
            _ => provider.title().to_string(),
        }
    }

    fn current_snapshot(&self) -> Arc<MetadataSnapshot> {
        match &self.source {
            Source::Background(collector) => collector.snapshot(),
            Source::Inline { scanner, runtime } => Arc::new(runtime.block_on(scanner.scan())),
        }
    }
}

impl StatsPlugin for CloudPlugin {
    fn name(&self) -> &str {
        "cloud"
    }

    fn reset(&mut self) {
        self.stats = Stats::new();
    }

    fn update(&mut self) -> Result<Stats> {
        self.reset();
        if self.input_method != InputMethod::Local {
            return Ok(self.stats.clone());
        }

        self.stats = self.current_snapshot().as_stats().clone();
        Ok(self.stats.clone())
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }

    fn exit(&mut self) {
        if let Source::Background(collector) = &self.source {
            collector.stop();
        }
    }
}
