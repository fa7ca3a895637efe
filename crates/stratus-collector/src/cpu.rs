use crate::StatsPlugin;
use anyhow::Result;
use serde_json::json;
use stratus_common::types::Stats;
use sysinfo::System;

pub struct CpuPlugin {
    system: System,
    stats: Stats,
}

impl CpuPlugin {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        Self {
            system,
            stats: Stats::new(),
        }
    }
}

impl Default for CpuPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsPlugin for CpuPlugin {
    fn name(&self) -> &str {
        "cpu"
    }

    fn reset(&mut self) {
        self.stats = Stats::new();
    }

    fn update(&mut self) -> Result<Stats> {
        self.reset();
        self.system.refresh_cpu_all();

        let per_core: Vec<f32> = self.system.cpus().iter().map(|c| c.cpu_usage()).collect();
        self.stats
            .insert("total".to_string(), json!(self.system.global_cpu_usage()));
        self.stats.insert("cpucore".to_string(), json!(per_core.len()));
        self.stats.insert("percpu".to_string(), json!(per_core));

        Ok(self.stats.clone())
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_core_count_matching_per_core_list() {
        let mut plugin = CpuPlugin::new();
        let stats = plugin.update().unwrap();
        let cores = stats["cpucore"].as_u64().unwrap() as usize;
        assert_eq!(stats["percpu"].as_array().unwrap().len(), cores);
        assert!(stats.contains_key("total"));
    }
}
