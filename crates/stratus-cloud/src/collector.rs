use crate::scanner::MetadataScanner;
use crate::MetadataSnapshot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Shortest pause accepted between two collection cycles.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(10);

/// Holds the latest published snapshot.
///
/// Snapshots are immutable once published: the writer builds a complete new
/// snapshot and swaps the `Arc`, so a reader either sees the old snapshot or
/// the new one, never a mix.
#[derive(Default)]
pub struct SnapshotCell {
    current: RwLock<Arc<MetadataSnapshot>>,
}

impl SnapshotCell {
    pub fn load(&self) -> Arc<MetadataSnapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn publish(&self, snapshot: MetadataSnapshot) {
        let next = Arc::new(snapshot);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = next;
    }
}

/// Runs detection and harvesting on its own task, independent of the
/// plugin's refresh cadence.
///
/// The task is the only writer of the snapshot. Stopping is cooperative: the
/// loop checks the stop flag before each cycle and wakes from its pause when
/// the flag is raised, but an in-flight request is left to finish or time
/// out.
pub struct BackgroundCollector {
    scanner: Arc<MetadataScanner>,
    refresh_interval: Duration,
    cell: Arc<SnapshotCell>,
    running: Arc<AtomicBool>,
    stop_tx: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl BackgroundCollector {
    /// `refresh_interval` is raised to [`MIN_REFRESH_INTERVAL`] if shorter.
    pub fn new(scanner: MetadataScanner, refresh_interval: Duration) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            scanner: Arc::new(scanner),
            refresh_interval: refresh_interval.max(MIN_REFRESH_INTERVAL),
            cell: Arc::new(SnapshotCell::default()),
            running: Arc::new(AtomicBool::new(false)),
            stop_tx,
            task: Mutex::new(None),
        }
    }

    /// Spawns the collection loop on the current tokio runtime.
    ///
    /// Must be called once per collector; later calls only log a warning.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(&self) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.is_some() {
            tracing::warn!("Cloud metadata collector already started");
            return;
        }

        self.running.store(true, Ordering::SeqCst);
        *task = Some(tokio::spawn(run_loop(
            Arc::clone(&self.scanner),
            Arc::clone(&self.cell),
            Arc::clone(&self.running),
            self.refresh_interval,
            self.stop_tx.subscribe(),
        )));
    }

    /// Raises the stop flag. Returns immediately.
    pub fn stop(&self) {
        tracing::debug!("Stopping cloud metadata collector");
        self.stop_tx.send_replace(true);
    }

    /// Waits for the collection loop to exit after [`stop`](Self::stop).
    pub async fn join(&self) {
        let handle = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Cloud metadata collector task panicked");
            }
        }
    }

    /// Point-in-time view of the latest snapshot. Never blocks on I/O.
    pub fn snapshot(&self) -> Arc<MetadataSnapshot> {
        self.cell.load()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for BackgroundCollector {
    fn drop(&mut self) {
        self.stop_tx.send_replace(true);
    }
}

async fn run_loop(
    scanner: Arc<MetadataScanner>,
    cell: Arc<SnapshotCell>,
    running: Arc<AtomicBool>,
    refresh_interval: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    tracing::info!(
        interval_secs = refresh_interval.as_secs(),
        "Cloud metadata collector started"
    );

    loop {
        if *stop_rx.borrow_and_update() {
            break;
        }

        let snapshot = scanner.scan().await;
        tracing::debug!(
            provider = %snapshot.provider(),
            fields = snapshot.len(),
            "Cloud metadata refreshed"
        );
        cell.publish(snapshot);

        tokio::select! {
            _ = sleep(refresh_interval) => {}
            changed = stop_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    running.store(false, Ordering::SeqCst);
    tracing::info!("Cloud metadata collector stopped");
}
