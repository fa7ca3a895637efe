//! Cloud provider detection and instance-metadata harvesting.
//!
//! The [`probe::Prober`] scans the link-local metadata services of the
//! supported providers, the [`harvest::Harvester`] fetches the detected
//! provider's instance metadata, and the [`collector::BackgroundCollector`]
//! repeats both on its own task so the [`plugin::CloudPlugin`] can serve the
//! latest snapshot without blocking the refresh loop.

pub mod collector;
pub mod endpoint;
pub mod error;
pub mod harvest;
pub mod http;
pub mod plugin;
pub mod probe;
pub mod scanner;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use stratus_common::types::Stats;

/// Key carrying the provider tag in every non-empty snapshot.
pub const TYPE_KEY: &str = "type";

/// Cloud platform a host runs on.
///
/// # Examples
///
/// ```
/// use stratus_cloud::ProviderKind;
///
/// let kind: ProviderKind = "gcp".parse().unwrap();
/// assert_eq!(kind, ProviderKind::Gcp);
/// assert_eq!(ProviderKind::Oci.to_string(), "opc");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "aws")]
    Aws,
    #[serde(rename = "azure")]
    Azure,
    #[serde(rename = "gcp")]
    Gcp,
    /// Oracle Cloud Infrastructure, tagged `opc` on the wire.
    #[serde(rename = "opc")]
    Oci,
    #[serde(rename = "alibaba")]
    Alibaba,
    #[serde(rename = "none")]
    None,
}

impl ProviderKind {
    /// Providers in detection priority order. The first one whose metadata
    /// service answers wins.
    pub const DETECTION_ORDER: [ProviderKind; 5] = [
        ProviderKind::Aws,
        ProviderKind::Azure,
        ProviderKind::Gcp,
        ProviderKind::Oci,
        ProviderKind::Alibaba,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Aws => "aws",
            ProviderKind::Azure => "azure",
            ProviderKind::Gcp => "gcp",
            ProviderKind::Oci => "opc",
            ProviderKind::Alibaba => "alibaba",
            ProviderKind::None => "none",
        }
    }

    /// Human-readable platform name, used in the plugin summary line.
    pub fn title(self) -> &'static str {
        match self {
            ProviderKind::Aws => "AWS EC2",
            ProviderKind::Azure => "Azure VM",
            ProviderKind::Gcp => "GCP Compute Engine",
            ProviderKind::Oci => "Oracle Cloud",
            ProviderKind::Alibaba => "Alibaba ECS",
            ProviderKind::None => "",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aws" => Ok(ProviderKind::Aws),
            "azure" => Ok(ProviderKind::Azure),
            "gcp" => Ok(ProviderKind::Gcp),
            "opc" | "oci" => Ok(ProviderKind::Oci),
            "alibaba" => Ok(ProviderKind::Alibaba),
            "none" => Ok(ProviderKind::None),
            _ => Err(format!("unknown cloud provider: {s}")),
        }
    }
}

/// Instance metadata gathered in one collection cycle.
///
/// An empty snapshot means no provider was detected. Any other snapshot
/// carries [`TYPE_KEY`] with the provider tag, whatever else failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataSnapshot(Stats);

impl MetadataSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Starts a snapshot for `kind` with only the provider tag set.
    pub fn for_provider(kind: ProviderKind) -> Self {
        let mut fields = Stats::new();
        fields.insert(TYPE_KEY.to_string(), Value::String(kind.as_str().to_string()));
        Self(fields)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Provider recorded in the snapshot, `None` for an empty snapshot.
    pub fn provider(&self) -> ProviderKind {
        self.0
            .get(TYPE_KEY)
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or(ProviderKind::None)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_stats(&self) -> &Stats {
        &self.0
    }
}

/// Timing knobs for detection, harvesting and the background loop.
#[derive(Debug, Clone)]
pub struct CloudSettings {
    /// Per-probe timeout. Metadata services are link-local, so a miss after
    /// this long means "not this provider".
    pub probe_timeout: Duration,
    /// Per-request timeout while harvesting.
    pub harvest_timeout: Duration,
    /// Pause between two background collection cycles.
    pub refresh_interval: Duration,
}

impl Default for CloudSettings {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_millis(100),
            harvest_timeout: Duration::from_secs(3),
            refresh_interval: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing;
