//! Module capability contract.
//!
//! A module is a registrable unit of agent behavior with an optional YAML
//! configuration and async lifecycle hooks. The registry drives the hooks;
//! modules subscribe their event handlers on enable and must remove them
//! again on disable so no subscription leaks across an enable/disable cycle.

use async_trait::async_trait;

use crate::config::schema::{ConfigValue, Schema};

/// Contract every registrable module implements.
///
/// Dependencies are declared explicitly by name via [`Module::depends_on`];
/// the registry builds its dependency graph from these declarations alone.
#[async_trait]
pub trait Module: Send + Sync {
    /// Unique module name, used as the registry key.
    fn name(&self) -> &str;

    /// Logical configuration name, or `None` for config-less modules.
    ///
    /// When set, [`Module::config_schema`] must return the matching schema.
    fn config_key(&self) -> Option<&str> {
        None
    }

    /// Schema bundle for decoding and validating this module's configuration.
    fn config_schema(&self) -> Option<Schema> {
        None
    }

    /// Names of modules this module requires to be enabled before it can run.
    fn depends_on(&self) -> Vec<String> {
        Vec::new()
    }

    /// Called when the module transitions to enabled.
    ///
    /// `cfg` is the last validated configuration, or `None` for modules
    /// without a configuration key.
    async fn on_enable(&self, cfg: Option<ConfigValue>);

    /// Called when the module transitions out of enabled.
    async fn on_disable(&self);

    /// Called with a freshly validated configuration while the module stays
    /// enabled (live update, no disable/enable bounce).
    async fn on_config_update(&self, cfg: ConfigValue);
}
