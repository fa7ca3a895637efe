//! Stats plugin framework for the stratus agent.
//!
//! Each [`StatsPlugin`] produces one named stats document per refresh cycle.
//! Plugins are wrapped in a [`gate::Gated`] combinator that applies the
//! enable switch and refresh interval, then registered in a
//! [`registry::PluginRegistry`] that the agent's refresh loop drives.

pub mod cpu;
pub mod gate;
pub mod load;
pub mod memory;
pub mod registry;
pub mod version;

use anyhow::Result;
use stratus_common::types::Stats;

/// A stats source polled synchronously on every refresh tick.
///
/// `update` runs on the agent's foreground refresh path. Implementations that
/// depend on slow I/O should gather data elsewhere and only copy the latest
/// result here.
pub trait StatsPlugin: Send {
    /// Plugin name, used as the key in the export payload (e.g. `"cpu"`).
    fn name(&self) -> &str;

    /// Clears the current stats.
    fn reset(&mut self);

    /// Refreshes and returns the current stats.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying system API call fails.
    fn update(&mut self) -> Result<Stats>;

    /// Returns the stats produced by the last `update`.
    fn stats(&self) -> &Stats;

    fn is_disabled(&self) -> bool {
        false
    }

    /// Called once when the agent shuts down.
    fn exit(&mut self) {}
}

impl<P: StatsPlugin + ?Sized> StatsPlugin for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn reset(&mut self) {
        (**self).reset();
    }

    fn update(&mut self) -> Result<Stats> {
        (**self).update()
    }

    fn stats(&self) -> &Stats {
        (**self).stats()
    }

    fn is_disabled(&self) -> bool {
        (**self).is_disabled()
    }

    fn exit(&mut self) {
        (**self).exit();
    }
}
