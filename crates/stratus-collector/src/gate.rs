use crate::StatsPlugin;
use anyhow::Result;
use std::time::{Duration, Instant};
use stratus_common::types::{format_stats, Stats};

/// Wraps a plugin with the enable switch and refresh-interval throttle.
///
/// When the plugin is disabled or its interval has not elapsed since the last
/// run, `update` returns the last stats without calling the inner plugin.
/// Every real update is logged at debug level.
pub struct Gated<P> {
    inner: P,
    enabled: bool,
    refresh_interval: Duration,
    last_refresh: Option<Instant>,
}

impl<P: StatsPlugin> Gated<P> {
    pub fn new(inner: P, refresh_interval: Duration) -> Self {
        Self {
            inner,
            enabled: true,
            refresh_interval,
            last_refresh: None,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn is_due(&self, now: Instant) -> bool {
        match self.last_refresh {
            Some(last) => now.duration_since(last) >= self.refresh_interval,
            None => true,
        }
    }
}

impl<P: StatsPlugin> StatsPlugin for Gated<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn reset(&mut self) {
        self.inner.reset();
    }

    fn update(&mut self) -> Result<Stats> {
        let now = Instant::now();
        if !self.enabled || !self.is_due(now) {
            return Ok(self.inner.stats().clone());
        }

        let stats = self.inner.update()?;
        self.last_refresh = Some(now);
        tracing::debug!(
            plugin = self.inner.name(),
            stats = %format_stats(&stats),
            "Plugin updated"
        );
        Ok(stats)
    }

    fn stats(&self) -> &Stats {
        self.inner.stats()
    }

    fn is_disabled(&self) -> bool {
        !self.enabled || self.inner.is_disabled()
    }

    fn exit(&mut self) {
        self.inner.exit();
    }
}
