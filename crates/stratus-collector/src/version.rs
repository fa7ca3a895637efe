use crate::StatsPlugin;
use anyhow::Result;
use serde_json::json;
use stratus_common::types::{InputMethod, Stats};
use stratus_common::AGENT_VERSION;

/// Reports the agent version so the collector can tell agent builds apart.
///
/// The version describes the local agent, so nothing is reported when stats
/// come from a remote source.
pub struct VersionPlugin {
    input_method: InputMethod,
    stats: Stats,
}

impl VersionPlugin {
    pub fn new(input_method: InputMethod) -> Self {
        Self {
            input_method,
            stats: Stats::new(),
        }
    }
}

impl StatsPlugin for VersionPlugin {
    fn name(&self) -> &str {
        "version"
    }

    fn reset(&mut self) {
        self.stats = Stats::new();
    }

    fn update(&mut self) -> Result<Stats> {
        self.reset();
        if self.input_method == InputMethod::Local {
            self.stats
                .insert("version".to_string(), json!(AGENT_VERSION));
        }
        Ok(self.stats.clone())
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}
