//! Configuration store and reload orchestration.
//!
//! One entry per registered logical name: schema, last validated value, and
//! an optional update callback. Filesystem events funnel into
//! [`ConfigStore::on_fs_event`], which debounces reload storms per name; at
//! most one reload is ever pending for a given name. File I/O and YAML work
//! happen outside the store lock.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::loader::{load_merged, logical_name, ConfigError, DEBOUNCE, EXTENSION};
use crate::config::schema::{ConfigValue, Schema};

/// Callback invoked after every load of a registered configuration.
///
/// `Some(value)` carries a freshly validated instance; `None` signals that a
/// reload failed and the previous value remains in effect.
pub type UpdateCallback = Arc<dyn Fn(Option<ConfigValue>) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Clone)]
struct Entry {
    schema: Schema,
    current: Option<ConfigValue>,
    on_update: Option<UpdateCallback>,
}

struct Inner {
    entries: HashMap<String, Entry>,
    timers: HashMap<String, JoinHandle<()>>,
}

/// Usage status of one file in the defaults directory.
#[derive(Debug, Clone)]
pub struct FileStatus {
    pub path: PathBuf,
    pub registered: bool,
}

/// Result of a defaults-directory audit.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub files: Vec<FileStatus>,
}

/// Store of layered YAML configurations with debounced hot reload.
pub struct ConfigStore {
    defaults_dir: PathBuf,
    overrides_dir: PathBuf,
    inner: Mutex<Inner>,
}

impl ConfigStore {
    /// Create a store rooted at the two configuration directories.
    ///
    /// Both directories are created when missing so a fresh deployment can
    /// start from placeholders.
    pub fn new(defaults_dir: &Path, overrides_dir: &Path) -> Result<Arc<Self>, ConfigError> {
        for dir in [defaults_dir, overrides_dir] {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        Ok(Arc::new(Self {
            defaults_dir: defaults_dir.to_path_buf(),
            overrides_dir: overrides_dir.to_path_buf(),
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                timers: HashMap::new(),
            }),
        }))
    }

    pub fn defaults_dir(&self) -> &Path {
        &self.defaults_dir
    }

    pub fn overrides_dir(&self) -> &Path {
        &self.overrides_dir
    }

    /// Register a logical configuration and perform the initial load.
    ///
    /// Blocking by design: the caller must not consider the name registered
    /// until its configuration is known good. On success the entry is stored
    /// and the callback fires once with the initial value. A missing base
    /// file produces a placeholder and [`ConfigError::PlaceholderCreated`];
    /// the name stays unregistered in that case.
    pub async fn register(
        &self,
        name: &str,
        schema: Schema,
        on_update: Option<UpdateCallback>,
    ) -> Result<(), ConfigError> {
        tracing::info!(config = %name, "registering configuration");

        let (value, callback) = {
            let mut inner = self.inner.lock().unwrap();
            if inner.entries.contains_key(name) {
                return Err(ConfigError::AlreadyRegistered(name.to_string()));
            }

            let value = load_merged(&self.defaults_dir, &self.overrides_dir, name, &schema, true)?;

            inner.entries.insert(
                name.to_string(),
                Entry {
                    schema,
                    current: Some(value.clone()),
                    on_update: on_update.clone(),
                },
            );
            (value, on_update)
        };

        if let Some(cb) = callback {
            tracing::debug!(config = %name, "executing initial configuration callback");
            cb(Some(value)).await;
        }

        tracing::info!(config = %name, "configuration registered and active");
        Ok(())
    }

    /// Last validated value for a registered name.
    pub fn get(&self, name: &str) -> Option<ConfigValue> {
        let inner = self.inner.lock().unwrap();
        match inner.entries.get(name) {
            Some(entry) => entry.current.clone(),
            None => {
                tracing::warn!(config = %name, "attempted to get unregistered configuration");
                None
            }
        }
    }

    /// Handle one filesystem event from the watch loop.
    ///
    /// Derives the logical name, and when that name is registered, (re)starts
    /// its debounce timer. Replacing a pending timer aborts it, so rapid event
    /// storms coalesce into a single reload.
    pub fn on_fs_event(self: &Arc<Self>, path: &Path) {
        let Some(name) = logical_name(path) else {
            return;
        };

        let mut inner = self.inner.lock().unwrap();
        if !inner.entries.contains_key(&name) {
            return;
        }

        let correlation = Uuid::new_v4().simple().to_string();
        tracing::info!(
            config = %name,
            correlation = %correlation,
            file = %path.display(),
            "file system event detected, reload scheduled after debounce"
        );

        if let Some(previous) = inner.timers.remove(&name) {
            previous.abort();
        }

        let store = Arc::clone(self);
        let key = name.clone();
        let span = tracing::info_span!("config_reload", config = %name, correlation = %correlation);
        inner.timers.insert(
            name,
            tokio::spawn(
                async move {
                    tokio::time::sleep(DEBOUNCE).await;
                    store.reload(&key).await;
                }
                .instrument(span),
            ),
        );
    }

    /// Reload one configuration after its debounce timer fired.
    async fn reload(self: &Arc<Self>, name: &str) {
        let entry = {
            let mut inner = self.inner.lock().unwrap();
            inner.timers.remove(name);
            match inner.entries.get(name) {
                Some(entry) => entry.clone(),
                None => return,
            }
        };

        tracing::info!(config = %name, "hot-reloading configuration");

        let loaded = load_merged(
            &self.defaults_dir,
            &self.overrides_dir,
            name,
            &entry.schema,
            false,
        );

        match loaded {
            Ok(value) => {
                {
                    let mut inner = self.inner.lock().unwrap();
                    if let Some(entry) = inner.entries.get_mut(name) {
                        entry.current = Some(value.clone());
                    }
                }
                if let Some(cb) = entry.on_update {
                    tokio::spawn(cb(Some(value)));
                }
                tracing::info!(config = %name, "configuration successfully reloaded");
            }
            Err(e) => {
                tracing::error!(
                    config = %name,
                    error = %e,
                    "hot-reload failed, previous value stays in effect"
                );
                if let Some(cb) = entry.on_update {
                    tokio::spawn(cb(None));
                }
            }
        }
    }

    /// Audit the defaults directory against the registered names.
    pub fn scan_usage(&self) -> ScanReport {
        let inner = self.inner.lock().unwrap();
        let mut report = ScanReport::default();

        let dir = match fs::read_dir(&self.defaults_dir) {
            Ok(dir) => dir,
            Err(e) => {
                tracing::error!(error = %e, "failed to scan defaults directory");
                return report;
            }
        };

        for file in dir.flatten() {
            let path = file.path();
            if !path.is_file() || !path.to_string_lossy().ends_with(EXTENSION) {
                continue;
            }
            let registered = logical_name(&path)
                .map(|name| inner.entries.contains_key(&name))
                .unwrap_or(false);
            report.files.push(FileStatus { path, registered });
        }

        report
    }

    /// Log the usage audit, flagging files no registered module consumes.
    pub fn log_report(&self) {
        tracing::info!("starting configuration usage audit");
        let report = self.scan_usage();

        let mut unused = 0;
        for file in &report.files {
            if file.registered {
                tracing::debug!(path = %file.path.display(), "active configuration file");
            } else {
                tracing::warn!(path = %file.path.display(), "unused configuration file detected");
                unused += 1;
            }
        }

        tracing::info!(
            total_files = report.files.len(),
            unused_files = unused,
            "configuration audit finished"
        );
    }
}
