use crate::StatsPlugin;
use stratus_common::types::Stats;

/// Ordered set of plugins driven by the agent's refresh loop.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Box<dyn StatsPlugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a plugin. Names are expected to be unique; a later plugin with
    /// the same name shadows the earlier one in the export payload.
    pub fn register<P: StatsPlugin + 'static>(&mut self, plugin: P) {
        tracing::debug!(plugin = plugin.name(), "Plugin registered");
        self.plugins.push(Box::new(plugin));
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Last stats of the named plugin, without triggering an update.
    pub fn get_raw(&self, name: &str) -> Option<&Stats> {
        self.plugins
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.stats())
    }

    /// Updates every enabled plugin and returns `(name, stats)` pairs.
    ///
    /// A failing plugin is logged and left out of the result; it never stops
    /// the others from updating.
    pub fn update_all(&mut self) -> Vec<(String, Stats)> {
        let mut results = Vec::with_capacity(self.plugins.len());
        for plugin in &mut self.plugins {
            if plugin.is_disabled() {
                continue;
            }
            match plugin.update() {
                Ok(stats) => results.push((plugin.name().to_string(), stats)),
                Err(e) => {
                    tracing::warn!(plugin = plugin.name(), error = %e, "Plugin update failed")
                }
            }
        }
        results
    }

    pub fn exit_all(&mut self) {
        for plugin in &mut self.plugins {
            plugin.exit();
        }
    }
}
