use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use stratus_cloud::CloudSettings;
use stratus_common::types::InputMethod;
use stratus_export::ExportConfig;

#[derive(Debug, Deserialize)]
pub struct AgentConfig {
    /// Seconds between two plugin refresh cycles.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub input_method: InputMethod,
    #[serde(default)]
    pub plugins: PluginsConfig,
    #[serde(default)]
    pub cloud: CloudConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct PluginsConfig {
    /// Plugin names that stay registered but never update.
    #[serde(default)]
    pub disabled: Vec<String>,
    /// Minimum seconds between two updates of a plugin. Plugins not listed
    /// update on every refresh cycle.
    #[serde(default)]
    pub refresh_secs: HashMap<String, u64>,
}

impl PluginsConfig {
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.iter().any(|d| d == name)
    }

    pub fn refresh_for(&self, name: &str) -> Duration {
        Duration::from_secs(self.refresh_secs.get(name).copied().unwrap_or(0))
    }
}

/// Where cloud detection runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudMode {
    /// Dedicated task; refresh cycles only copy its latest snapshot.
    #[default]
    Background,
    /// Inside the refresh cycle itself. Can stall a cycle for the whole
    /// probe budget when no provider answers.
    Inline,
}

#[derive(Debug, Deserialize)]
pub struct CloudConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub mode: CloudMode,
    #[serde(default = "default_cloud_refresh_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    #[serde(default = "default_harvest_timeout_ms")]
    pub harvest_timeout_ms: u64,
}

fn default_refresh_interval() -> u64 {
    2
}

fn default_true() -> bool {
    true
}

fn default_cloud_refresh_interval() -> u64 {
    60
}

fn default_probe_timeout_ms() -> u64 {
    100
}

fn default_harvest_timeout_ms() -> u64 {
    3000
}

/// Lowest accepted metadata request timeout. Anything shorter cannot reach
/// even a link-local service.
const MIN_METADATA_TIMEOUT_MS: u64 = 10;

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: CloudMode::default(),
            refresh_interval_secs: default_cloud_refresh_interval(),
            probe_timeout_ms: default_probe_timeout_ms(),
            harvest_timeout_ms: default_harvest_timeout_ms(),
        }
    }
}

impl CloudConfig {
    /// Timing for the cloud plugin. A zero refresh interval is raised to one
    /// second so the collector never hammers the metadata service.
    pub fn settings(&self) -> CloudSettings {
        CloudSettings {
            probe_timeout: Duration::from_millis(self.probe_timeout_ms.max(MIN_METADATA_TIMEOUT_MS)),
            harvest_timeout: Duration::from_millis(
                self.harvest_timeout_ms.max(MIN_METADATA_TIMEOUT_MS),
            ),
            refresh_interval: Duration::from_secs(self.refresh_interval_secs.max(1)),
        }
    }
}

impl AgentConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Environment values win over the file for the export credentials and
    /// the offline dump switch.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("STRATUS_EXPORT_URL") {
            self.export.url = Some(url);
        }
        if let Some(key) = lookup("STRATUS_API_KEY") {
            self.export.api_key = Some(key);
        }
        if let Some(host) = lookup("STRATUS_HOST") {
            self.export.host = Some(host);
        }
        if let Some(path) = lookup("STRATUS_EXPORT_DUMP") {
            self.export.dump_path = Some(PathBuf::from(path));
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
refresh_interval_secs = 5
input_method = "local"

[plugins]
disabled = ["load"]
refresh_secs = { cloud = 30 }

[cloud]
mode = "inline"
probe_timeout_ms = 150

[export]
url = "https://collector.example.com/ingest"
api_key = "file-key"
host = "web-01"
flush_interval_secs = 30
"#;

    #[test]
    fn loads_file_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = AgentConfig::load(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.refresh_interval_secs, 5);
        assert_eq!(config.input_method, InputMethod::Local);
        assert_eq!(config.cloud.mode, CloudMode::Inline);
        assert!(config.cloud.enabled);
        assert_eq!(config.cloud.refresh_interval_secs, 60);
        assert_eq!(config.cloud.settings().probe_timeout, Duration::from_millis(150));
        assert_eq!(config.export.flush_interval_secs, 30);
        assert_eq!(config.export.timeout_secs, 5);
        assert!(config.plugins.is_disabled("load"));
        assert!(!config.plugins.is_disabled("cpu"));
        assert_eq!(config.plugins.refresh_for("cloud"), Duration::from_secs(30));
        assert_eq!(config.plugins.refresh_for("cpu"), Duration::ZERO);
    }

    #[test]
    fn empty_file_uses_all_defaults() {
        let config: AgentConfig = toml::from_str("").unwrap();
        assert_eq!(config.refresh_interval_secs, 2);
        assert_eq!(config.cloud.mode, CloudMode::Background);
        assert_eq!(config.cloud.settings().harvest_timeout, Duration::from_secs(3));
        assert!(config.export.api_key.is_none());
        assert!(config.export.dump_path.is_none());
    }

    #[test]
    fn environment_overrides_export_settings() {
        let mut config: AgentConfig = toml::from_str(SAMPLE).unwrap();
        let env: HashMap<&str, &str> = [
            ("STRATUS_API_KEY", "env-key"),
            ("STRATUS_EXPORT_DUMP", "/tmp/stratus-out.json"),
        ]
        .into_iter()
        .collect();

        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.export.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.export.host.as_deref(), Some("web-01"));
        assert_eq!(
            config.export.dump_path,
            Some(PathBuf::from("/tmp/stratus-out.json"))
        );
    }

    #[test]
    fn zero_refresh_interval_is_clamped() {
        let config: AgentConfig = toml::from_str("refresh_interval_secs = 0").unwrap();
        assert_eq!(config.refresh_interval(), Duration::from_secs(1));
    }

    #[test]
    fn zero_cloud_timings_are_clamped() {
        let config: AgentConfig = toml::from_str(
            "[cloud]\nrefresh_interval_secs = 0\nprobe_timeout_ms = 0\nharvest_timeout_ms = 0",
        )
        .unwrap();

        let settings = config.cloud.settings();

        assert_eq!(settings.refresh_interval, Duration::from_secs(1));
        assert_eq!(settings.probe_timeout, Duration::from_millis(10));
        assert_eq!(settings.harvest_timeout, Duration::from_millis(10));
    }
}
