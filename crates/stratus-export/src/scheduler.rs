use crate::exporter::{FlushOutcome, HttpExporter};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

/// Flushes an exporter on a fixed interval until told to stop.
///
/// Runs independently of the cloud collector; stopping one never cancels
/// the other. A flush already in progress when the stop signal arrives is
/// completed, then one final flush drains whatever is left.
pub struct FlushScheduler {
    exporter: Arc<HttpExporter>,
    interval: Duration,
}

impl FlushScheduler {
    pub fn new(exporter: Arc<HttpExporter>, interval: Duration) -> Self {
        Self { exporter, interval }
    }

    /// Runs until `stop` flips to `true` or a flush lands in the dump file.
    ///
    /// Returns the outcome of the last flush, so the caller can tell whether
    /// offline mode asked for the process to end.
    pub async fn run(&self, mut stop: watch::Receiver<bool>) -> FlushOutcome {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Export flush scheduler started"
        );

        let mut tick = interval_at(Instant::now() + self.interval, self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let outcome = self.exporter.flush().await;
                    if matches!(outcome, FlushOutcome::Dumped(_)) {
                        return outcome;
                    }
                }
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }

        let outcome = self.exporter.flush().await;
        tracing::info!(outcome = ?outcome, "Export flush scheduler stopped");
        outcome
    }
}
