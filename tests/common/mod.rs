//! Shared fixtures for integration tests.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use modkit::config::validation::{require_range, Validate, ValidationError};
use modkit::config::{ConfigValue, Schema};
use modkit::module::Module;

/// Schema used by configurable test modules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestConfig {
    pub greeting: String,
    pub level: u32,
}

impl Validate for TestConfig {
    fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        require_range(&mut errors, "level", self.level, 0, 10);
        errors
    }
}

/// A module that records every lifecycle hook invocation.
pub struct TestModule {
    name: String,
    config_key: Option<String>,
    deps: Vec<String>,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub last_config: Arc<Mutex<Option<ConfigValue>>>,
}

impl TestModule {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            config_key: None,
            deps: Vec::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
            last_config: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_deps(mut self, deps: &[&str]) -> Self {
        self.deps = deps.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_config(mut self, key: &str) -> Self {
        self.config_key = Some(key.to_string());
        self
    }

    /// Number of times a given hook ran.
    pub fn hook_count(&self, hook: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == hook).count()
    }
}

#[async_trait]
impl Module for TestModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn config_key(&self) -> Option<&str> {
        self.config_key.as_deref()
    }

    fn config_schema(&self) -> Option<Schema> {
        self.config_key.as_ref().map(|_| Schema::of::<TestConfig>())
    }

    fn depends_on(&self) -> Vec<String> {
        self.deps.clone()
    }

    async fn on_enable(&self, cfg: Option<ConfigValue>) {
        self.calls.lock().unwrap().push("enable".to_string());
        *self.last_config.lock().unwrap() = cfg;
    }

    async fn on_disable(&self) {
        self.calls.lock().unwrap().push("disable".to_string());
    }

    async fn on_config_update(&self, cfg: ConfigValue) {
        self.calls.lock().unwrap().push("update".to_string());
        *self.last_config.lock().unwrap() = Some(cfg);
    }
}

/// Write one base configuration file into the defaults directory.
#[allow(dead_code)]
pub fn write_config(dir: &std::path::Path, name: &str, yaml: &str) -> PathBuf {
    let path = dir.join(format!("{name}.yaml"));
    fs::write(&path, yaml).unwrap();
    path
}
