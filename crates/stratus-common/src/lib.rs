pub mod types;

/// Version string reported in export metadata and by the `version` plugin.
pub const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");
