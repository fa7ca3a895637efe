mod config;
mod plugins;

use anyhow::Result;
use serde_json::Value;
use std::sync::{Arc, Mutex, PoisonError};
use stratus_collector::registry::PluginRegistry;
use stratus_common::AGENT_VERSION;
use stratus_export::exporter::{FlushOutcome, HttpExporter};
use stratus_export::scheduler::FlushScheduler;
use stratus_export::transport::ReqwestTransport;
use tokio::signal;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing_subscriber::EnvFilter;

/// Updates every plugin and hands the results to the exporter.
///
/// Runs on a blocking worker: inline cloud detection may wait on the network
/// here.
async fn refresh_cycle(registry: Arc<Mutex<PluginRegistry>>, exporter: Arc<HttpExporter>) {
    let result = tokio::task::spawn_blocking(move || {
        let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
        let results = registry.update_all();
        let count = results.len();
        for (name, stats) in results {
            exporter.record(&name, Value::Object(stats));
        }
        count
    })
    .await;

    match result {
        Ok(count) => tracing::debug!(plugins = count, "Refresh cycle done"),
        Err(e) => tracing::error!(error = %e, "Refresh cycle panicked"),
    }
}

fn exit_after_dump(outcome: &FlushOutcome) {
    if let FlushOutcome::Dumped(path) = outcome {
        tracing::info!(path = %path.display(), "Offline dump written, exiting");
        std::process::exit(0);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("stratus=info".parse()?))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/agent.toml".to_string());

    let config = config::AgentConfig::load(&config_path)?;
    tracing::info!(version = AGENT_VERSION, config = %config_path, "stratus-agent starting");

    let exporter = match HttpExporter::new(&config.export, Arc::new(ReqwestTransport::new())) {
        Ok(exporter) => Arc::new(exporter),
        Err(e) => {
            tracing::error!(error = %e, "Cannot start exporter");
            return Err(e.into());
        }
    };
    if config.export.dump_path.is_some() {
        tracing::warn!("Offline dump mode enabled: the first flush ends the agent");
    }

    let registry = Arc::new(Mutex::new(plugins::build_registry(&config)?));

    let (stop_tx, stop_rx) = watch::channel(false);
    let scheduler = FlushScheduler::new(
        Arc::clone(&exporter),
        Duration::from_secs(config.export.flush_interval_secs.max(1)),
    );
    let mut flush_task = tokio::spawn(async move { scheduler.run(stop_rx).await });
    let mut flush_done = false;

    let mut tick = interval(config.refresh_interval());
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(
        interval_secs = config.refresh_interval().as_secs(),
        flush_interval_secs = config.export.flush_interval_secs,
        input_method = %config.input_method,
        "Starting refresh loop"
    );

    loop {
        tokio::select! {
            _ = tick.tick() => {
                refresh_cycle(Arc::clone(&registry), Arc::clone(&exporter)).await;
            }
            outcome = &mut flush_task => {
                flush_done = true;
                match outcome {
                    Ok(outcome) => exit_after_dump(&outcome),
                    Err(e) => tracing::error!(error = %e, "Export scheduler panicked"),
                }
                break;
            }
            _ = signal::ctrl_c() => {
                tracing::info!("Shutting down gracefully");
                break;
            }
        }
    }

    // The cloud collector and the export scheduler shut down independently.
    registry
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .exit_all();

    stop_tx.send_replace(true);
    if !flush_done {
        match flush_task.await {
            Ok(outcome) => exit_after_dump(&outcome),
            Err(e) => tracing::error!(error = %e, "Export scheduler panicked"),
        }
    }

    Ok(())
}
