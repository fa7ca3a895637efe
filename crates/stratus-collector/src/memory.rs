use crate::StatsPlugin;
use anyhow::Result;
use serde_json::json;
use stratus_common::types::Stats;
use sysinfo::System;

fn percent(used: u64, total: u64) -> f64 {
    if total > 0 {
        (used as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

pub struct MemoryPlugin {
    system: System,
    stats: Stats,
}

impl MemoryPlugin {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            stats: Stats::new(),
        }
    }
}

impl Default for MemoryPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsPlugin for MemoryPlugin {
    fn name(&self) -> &str {
        "mem"
    }

    fn reset(&mut self) {
        self.stats = Stats::new();
    }

    fn update(&mut self) -> Result<Stats> {
        self.reset();
        self.system.refresh_memory();

        let total = self.system.total_memory();
        let used = self.system.used_memory();
        self.stats.insert("total".to_string(), json!(total));
        self.stats.insert("used".to_string(), json!(used));
        self.stats
            .insert("available".to_string(), json!(self.system.available_memory()));
        self.stats.insert("percent".to_string(), json!(percent(used, total)));

        // Swap
        let swap_total = self.system.total_swap();
        let swap_used = self.system.used_swap();
        self.stats.insert("swap_total".to_string(), json!(swap_total));
        self.stats.insert("swap_used".to_string(), json!(swap_used));
        self.stats
            .insert("swap_percent".to_string(), json!(percent(swap_used, swap_total)));

        Ok(self.stats.clone())
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}
