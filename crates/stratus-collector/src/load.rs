use crate::StatsPlugin;
use anyhow::Result;
use serde_json::json;
use stratus_common::types::Stats;
use sysinfo::System;

#[derive(Default)]
pub struct LoadPlugin {
    stats: Stats,
}

impl LoadPlugin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatsPlugin for LoadPlugin {
    fn name(&self) -> &str {
        "load"
    }

    fn reset(&mut self) {
        self.stats = Stats::new();
    }

    fn update(&mut self) -> Result<Stats> {
        self.reset();
        let load_avg = System::load_average();

        self.stats.insert("min1".to_string(), json!(load_avg.one));
        self.stats.insert("min5".to_string(), json!(load_avg.five));
        self.stats.insert("min15".to_string(), json!(load_avg.fifteen));
        self.stats.insert("uptime".to_string(), json!(System::uptime()));

        Ok(self.stats.clone())
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }
}
