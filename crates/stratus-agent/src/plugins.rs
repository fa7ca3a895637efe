use crate::config::{AgentConfig, CloudMode};
use anyhow::Result;
use std::sync::Arc;
use stratus_cloud::collector::BackgroundCollector;
use stratus_cloud::endpoint::ProviderTable;
use stratus_cloud::http::ReqwestMetadataClient;
use stratus_cloud::plugin::CloudPlugin;
use stratus_cloud::scanner::MetadataScanner;
use stratus_collector::cpu::CpuPlugin;
use stratus_collector::gate::Gated;
use stratus_collector::load::LoadPlugin;
use stratus_collector::memory::MemoryPlugin;
use stratus_collector::registry::PluginRegistry;
use stratus_collector::version::VersionPlugin;
use stratus_collector::StatsPlugin;
use tokio::runtime::Handle;

fn gate<P: StatsPlugin + 'static>(config: &AgentConfig, plugin: P) -> Gated<P> {
    let name = plugin.name().to_string();
    let gated = Gated::new(plugin, config.plugins.refresh_for(&name));
    if config.plugins.is_disabled(&name) {
        gated.disabled()
    } else {
        gated
    }
}

/// Builds the plugin set described by `config`.
///
/// Must run inside the tokio runtime: the background cloud collector is
/// spawned here.
pub fn build_registry(config: &AgentConfig) -> Result<PluginRegistry> {
    let mut registry = PluginRegistry::new();
    registry.register(gate(config, CpuPlugin::new()));
    registry.register(gate(config, MemoryPlugin::new()));
    registry.register(gate(config, LoadPlugin::new()));
    registry.register(gate(config, VersionPlugin::new(config.input_method)));

    if config.cloud.enabled {
        let settings = config.cloud.settings();
        let scanner = MetadataScanner::new(
            Arc::new(ReqwestMetadataClient::new()?),
            Arc::new(ProviderTable::standard()),
            &settings,
        );
        let plugin = match config.cloud.mode {
            CloudMode::Background => CloudPlugin::background(
                BackgroundCollector::new(scanner, settings.refresh_interval),
                config.input_method,
            ),
            CloudMode::Inline => CloudPlugin::inline(scanner, Handle::current(), config.input_method),
        };
        registry.register(gate(config, plugin));
    }

    tracing::info!(plugins = ?registry.plugin_names(), "Plugins registered");
    Ok(registry)
}
