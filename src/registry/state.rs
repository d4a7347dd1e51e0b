//! Per-module state machine data.
//!
//! # States
//! - Disabled: initial state, or config invalid / manually disabled
//! - Enabled: config valid (when required) and every dependency enabled
//! - Error: non-retryable failure (missing dependency, failed registration)
//! - DependencyDisabled: blocked on a dependency that is not enabled
//!
//! Each state has its own lock so a long-running hook on one module never
//! blocks status reads of another.

use std::fmt;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::ConfigValue;
use crate::module::Module;

/// Lifecycle status of a registered module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleStatus {
    Disabled,
    Enabled,
    Error,
    DependencyDisabled,
}

impl fmt::Display for ModuleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModuleStatus::Disabled => "disabled",
            ModuleStatus::Enabled => "enabled",
            ModuleStatus::Error => "error",
            ModuleStatus::DependencyDisabled => "dependency_disabled",
        };
        f.write_str(s)
    }
}

/// Immutable snapshot of one module, safe to serialize for inspection.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleInfo {
    pub name: String,
    pub status: ModuleStatus,
    pub config_key: Option<String>,
    pub config_valid: bool,
    pub dependencies: Vec<String>,
    pub dependents: Vec<String>,
    pub error: String,
    pub last_updated: DateTime<Utc>,
}

struct Inner {
    status: ModuleStatus,
    config_valid: bool,
    current_cfg: Option<ConfigValue>,
    reason: String,
    last_updated: DateTime<Utc>,
}

/// Mutable state of one registered module, guarded by its own lock.
pub(crate) struct ModuleState {
    module: Arc<dyn Module>,
    dependencies: Vec<String>,
    inner: RwLock<Inner>,
}

impl ModuleState {
    pub fn new(module: Arc<dyn Module>, dependencies: Vec<String>) -> Self {
        Self {
            module,
            dependencies,
            inner: RwLock::new(Inner {
                status: ModuleStatus::Disabled,
                config_valid: false,
                current_cfg: None,
                reason: String::new(),
                last_updated: Utc::now(),
            }),
        }
    }

    pub fn module(&self) -> Arc<dyn Module> {
        Arc::clone(&self.module)
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn set_enabled(&self, cfg: Option<ConfigValue>) {
        let mut inner = self.inner.write().unwrap();
        inner.status = ModuleStatus::Enabled;
        inner.config_valid = true;
        inner.current_cfg = cfg;
        inner.reason.clear();
        inner.last_updated = Utc::now();
    }

    pub fn set_disabled(&self, reason: &str) {
        let mut inner = self.inner.write().unwrap();
        inner.status = ModuleStatus::Disabled;
        inner.reason = reason.to_string();
        inner.last_updated = Utc::now();
    }

    pub fn set_dep_disabled(&self, dependency: &str) {
        let mut inner = self.inner.write().unwrap();
        inner.status = ModuleStatus::DependencyDisabled;
        inner.reason = format!("dependency disabled: {dependency}");
        inner.last_updated = Utc::now();
    }

    pub fn set_error(&self, message: &str) {
        let mut inner = self.inner.write().unwrap();
        inner.status = ModuleStatus::Error;
        inner.config_valid = false;
        inner.reason = message.to_string();
        inner.last_updated = Utc::now();
    }

    pub fn update_config(&self, cfg: ConfigValue) {
        let mut inner = self.inner.write().unwrap();
        inner.current_cfg = Some(cfg);
        inner.config_valid = true;
        inner.last_updated = Utc::now();
    }

    pub fn status(&self) -> ModuleStatus {
        self.inner.read().unwrap().status
    }

    pub fn is_enabled(&self) -> bool {
        self.status() == ModuleStatus::Enabled
    }

    /// Last stored configuration and whether it passed validation.
    pub fn config(&self) -> (Option<ConfigValue>, bool) {
        let inner = self.inner.read().unwrap();
        (inner.current_cfg.clone(), inner.config_valid)
    }

    pub fn info(&self, dependents: Vec<String>) -> ModuleInfo {
        let inner = self.inner.read().unwrap();
        ModuleInfo {
            name: self.module.name().to_string(),
            status: inner.status,
            config_key: self.module.config_key().map(str::to_string),
            config_valid: inner.config_valid,
            dependencies: self.dependencies.clone(),
            dependents,
            error: inner.reason.clone(),
            last_updated: inner.last_updated,
        }
    }
}
