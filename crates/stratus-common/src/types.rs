use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw stats produced by a plugin on one refresh cycle.
///
/// Plugins report flat or nested JSON documents keyed by stat name; the
/// export layer forwards them untouched.
pub type Stats = Map<String, Value>;

/// Where a plugin's stats come from.
///
/// Local-only probes (cloud metadata, library versions) are skipped when the
/// agent is fed by a remote server instead of the host it runs on.
///
/// # Examples
///
/// ```
/// use stratus_common::types::InputMethod;
///
/// let method: InputMethod = "local".parse().unwrap();
/// assert_eq!(method, InputMethod::Local);
/// assert_eq!(InputMethod::Remote.to_string(), "remote");
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMethod {
    #[default]
    Local,
    Remote,
}

impl std::fmt::Display for InputMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputMethod::Local => write!(f, "local"),
            InputMethod::Remote => write!(f, "remote"),
        }
    }
}

impl std::str::FromStr for InputMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(InputMethod::Local),
            "remote" => Ok(InputMethod::Remote),
            _ => Err(format!("unknown input method: {s}")),
        }
    }
}

/// Format a stats map as `key=value` pairs, sorted by key.
///
/// String values are printed without quotes; everything else uses its JSON
/// representation.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use stratus_common::types::{format_stats, Stats};
///
/// let mut stats = Stats::new();
/// stats.insert("region".to_string(), json!("eu-west-1"));
/// stats.insert("cores".to_string(), json!(4));
/// assert_eq!(format_stats(&stats), "cores=4, region=eu-west-1");
/// ```
pub fn format_stats(stats: &Stats) -> String {
    if stats.is_empty() {
        return String::new();
    }
    let mut pairs: Vec<String> = stats
        .iter()
        .map(|(k, v)| match v {
            Value::String(s) => format!("{k}={s}"),
            other => format!("{k}={other}"),
        })
        .collect();
    pairs.sort();
    pairs.join(", ")
}
