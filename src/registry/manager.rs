//! Module registry: registration, enable/disable orchestration, cascades.

use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock, Weak};

use futures::FutureExt;
use thiserror::Error;

use crate::config::{downcast_config, ConfigError, ConfigStore, ConfigValue, UpdateCallback};
use crate::module::Module;
use crate::registry::graph::DependencyGraph;
use crate::registry::state::{ModuleInfo, ModuleState, ModuleStatus};

/// Error type for module registration and manual state changes.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("module {0:?} already registered")]
    AlreadyRegistered(String),

    #[error("module {0:?} not found")]
    NotFound(String),

    #[error("module {module:?} would close a dependency cycle through {through:?}")]
    DependencyCycle { module: String, through: String },

    #[error("module {0:?} declares a config key but returns no schema")]
    MissingSchema(String),

    #[error("module {0:?} has no valid configuration")]
    InvalidConfig(String),

    #[error("module {module:?} config registration: {source}")]
    Config {
        module: String,
        #[source]
        source: ConfigError,
    },
}

/// Registry of modules and their lifecycle state machines.
///
/// The registry is the store's reload-callback target: a config change flows
/// through [`ModuleRegistry::on_config_update`] into a state transition and,
/// when the transition affects dependents, a synchronous depth-first cascade
/// that completes before the triggering call returns.
pub struct ModuleRegistry {
    store: Arc<ConfigStore>,
    modules: RwLock<HashMap<String, Arc<ModuleState>>>,
    graph: RwLock<DependencyGraph>,
}

impl ModuleRegistry {
    pub fn new(store: Arc<ConfigStore>) -> Arc<Self> {
        Arc::new(Self {
            store,
            modules: RwLock::new(HashMap::new()),
            graph: RwLock::new(DependencyGraph::default()),
        })
    }

    /// Register a module and attempt to bring it up.
    ///
    /// Duplicate names and dependency cycles are rejected before any state is
    /// created. Modules without a config key are enabled immediately when
    /// their dependencies allow; modules with one delegate to the config
    /// store, whose initial callback drives the first enable attempt. A
    /// missing base file (placeholder created) is an expected disable reason,
    /// not a registration failure.
    pub async fn register(self: &Arc<Self>, module: Arc<dyn Module>) -> Result<(), RegistryError> {
        let name = module.name().to_string();

        let mut seen = std::collections::HashSet::new();
        let dependencies: Vec<String> = module
            .depends_on()
            .into_iter()
            .filter(|dep| dep != &name && seen.insert(dep.clone()))
            .collect();

        let state = Arc::new(ModuleState::new(Arc::clone(&module), dependencies.clone()));

        {
            let mut modules = self.modules.write().unwrap();
            if modules.contains_key(&name) {
                return Err(RegistryError::AlreadyRegistered(name));
            }

            let mut graph = self.graph.write().unwrap();
            if let Some(through) = graph.would_close_cycle(&name, &dependencies) {
                return Err(RegistryError::DependencyCycle {
                    module: name,
                    through,
                });
            }

            modules.insert(name.clone(), Arc::clone(&state));
            graph.insert(&name, &dependencies);
        }

        let Some(config_key) = module.config_key().map(str::to_string) else {
            self.try_enable(&name, None).await;
            return Ok(());
        };

        let Some(schema) = module.config_schema() else {
            state.set_error("config key declared without a schema");
            return Err(RegistryError::MissingSchema(name));
        };

        let registry = Arc::downgrade(self);
        let module_name = name.clone();
        let callback: UpdateCallback = Arc::new(move |cfg| {
            let registry = Weak::clone(&registry);
            let module_name = module_name.clone();
            Box::pin(async move {
                if let Some(registry) = registry.upgrade() {
                    registry.on_config_update(&module_name, cfg).await;
                }
            })
        });

        match self.store.register(&config_key, schema, Some(callback)).await {
            Ok(()) => Ok(()),
            Err(ConfigError::PlaceholderCreated { path }) => {
                tracing::warn!(
                    module = %name,
                    config_file = %path.display(),
                    "module disabled: configuration file was missing, fill the generated placeholder"
                );
                state.set_disabled("missing configuration (placeholder created)");
                Ok(())
            }
            Err(e) => {
                state.set_error(&format!("config registration failed: {e}"));
                Err(RegistryError::Config {
                    module: name,
                    source: e,
                })
            }
        }
    }

    /// Reload-callback target, bound per module at registration.
    ///
    /// `None` means the latest reload failed: the module degrades to
    /// `Disabled` and its dependents cascade off. A valid value either
    /// live-updates an enabled module or triggers an enable attempt.
    pub async fn on_config_update(&self, name: &str, cfg: Option<ConfigValue>) {
        let Some(state) = self.state(name) else {
            return;
        };
        let was_enabled = state.is_enabled();

        let Some(cfg) = cfg else {
            state.set_disabled("invalid configuration");
            if was_enabled {
                self.run_disable_hook(name, &state).await;
                tracing::warn!(module = %name, "module disabled due to invalid config");
                self.disable_dependents(name).await;
            }
            return;
        };

        state.update_config(cfg.clone());

        if was_enabled {
            let module = state.module();
            if self
                .catch_hook(name, "on_config_update", module.on_config_update(cfg))
                .await
            {
                tracing::info!(module = %name, "module config updated");
            }
        } else {
            self.try_enable(name, Some(cfg)).await;
        }
    }

    /// Attempt to enable a module, then every dependent the enable unblocks.
    ///
    /// A missing dependency is non-retryable (`Error`); a registered but not
    /// enabled dependency parks the module in `DependencyDisabled` until the
    /// dependency comes up. Propagation is iterative to keep the recursion
    /// out of the async call graph.
    async fn try_enable(&self, name: &str, cfg: Option<ConfigValue>) {
        let mut queue: VecDeque<(String, Option<ConfigValue>)> = VecDeque::new();
        queue.push_back((name.to_string(), cfg));

        while let Some((name, cfg)) = queue.pop_front() {
            let Some(state) = self.state(&name) else {
                continue;
            };
            if state.is_enabled() {
                continue;
            }

            let mut blocked = false;
            for dep in state.dependencies() {
                match self.state(dep) {
                    None => {
                        state.set_error(&format!("dependency {dep} not registered"));
                        tracing::error!(
                            module = %name,
                            dependency = %dep,
                            "module dependency not found"
                        );
                        blocked = true;
                        break;
                    }
                    Some(dep_state) if !dep_state.is_enabled() => {
                        state.set_dep_disabled(dep);
                        tracing::warn!(
                            module = %name,
                            dependency = %dep,
                            "module waiting for dependency"
                        );
                        blocked = true;
                        break;
                    }
                    Some(_) => {}
                }
            }
            if blocked {
                continue;
            }

            let cfg = match cfg {
                Some(cfg) => Some(cfg),
                None => state.config().0,
            };

            state.set_enabled(cfg.clone());
            let module = state.module();
            if !self.catch_hook(&name, "on_enable", module.on_enable(cfg)).await {
                state.set_error("enable hook panicked");
                continue;
            }
            tracing::info!(module = %name, "module enabled");

            // Enabling this module may unblock modules parked on it.
            for dependent in self.dependents(&name) {
                if let Some(dep_state) = self.state(&dependent) {
                    if dep_state.status() == ModuleStatus::DependencyDisabled {
                        let stored = dep_state.config().0;
                        queue.push_back((dependent, stored));
                    }
                }
            }
        }
    }

    /// Cascade-disable every transitive dependent of `root`.
    ///
    /// Each enabled dependent gets its disable hook exactly once and moves to
    /// `DependencyDisabled`; already-stopped dependents are left alone. The
    /// cascade reaches its fixed point before this call returns.
    async fn disable_dependents(&self, root: &str) {
        let mut stack = vec![root.to_string()];

        while let Some(name) = stack.pop() {
            for dependent in self.dependents(&name) {
                let Some(state) = self.state(&dependent) else {
                    continue;
                };
                if !state.is_enabled() {
                    continue;
                }
                state.set_dep_disabled(&name);
                self.run_disable_hook(&dependent, &state).await;
                tracing::warn!(
                    module = %dependent,
                    dependency = %name,
                    "module disabled due to dependency"
                );
                stack.push(dependent);
            }
        }
    }

    /// Manually disable a module and cascade to its dependents.
    pub async fn disable(&self, name: &str) -> Result<(), RegistryError> {
        let state = self
            .state(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        if !state.is_enabled() {
            return Ok(());
        }

        state.set_disabled("manually disabled");
        self.run_disable_hook(name, &state).await;
        tracing::info!(module = %name, "module manually disabled");

        self.disable_dependents(name).await;
        Ok(())
    }

    /// Manually enable a module.
    ///
    /// Modules with a config key need a previously validated configuration;
    /// config-less modules only need their dependencies up.
    pub async fn enable(&self, name: &str) -> Result<(), RegistryError> {
        let state = self
            .state(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        if state.is_enabled() {
            return Ok(());
        }

        let (cfg, valid) = state.config();
        if !valid && state.module().config_key().is_some() {
            return Err(RegistryError::InvalidConfig(name.to_string()));
        }

        self.try_enable(name, cfg).await;
        Ok(())
    }

    /// Snapshot of one module, or `None` when the name is not registered.
    pub fn module_info(&self, name: &str) -> Option<ModuleInfo> {
        let state = self.state(name)?;
        Some(state.info(self.dependents(name)))
    }

    /// Snapshots of every registered module.
    pub fn all_modules(&self) -> Vec<ModuleInfo> {
        let modules = self.modules.read().unwrap();
        let graph = self.graph.read().unwrap();
        modules
            .iter()
            .map(|(name, state)| state.info(graph.dependents(name)))
            .collect()
    }

    /// Fast-path predicate the dispatch layer consults before routing work.
    pub fn is_module_enabled(&self, name: &str) -> bool {
        self.state(name).map(|s| s.is_enabled()).unwrap_or(false)
    }

    /// Current configuration of a module, downcast to its schema type.
    pub fn typed_config<T: Send + Sync + 'static>(&self, name: &str) -> Option<Arc<T>> {
        let state = self.state(name)?;
        let (cfg, valid) = state.config();
        if !valid {
            return None;
        }
        cfg.as_ref().and_then(downcast_config)
    }

    /// Log one status line per registered module.
    pub fn log_report(&self) {
        for info in self.all_modules() {
            tracing::info!(
                module = %info.name,
                status = %info.status,
                depends_on = ?info.dependencies,
                required_by = ?info.dependents,
                error = %info.error,
                "module status"
            );
        }
    }

    fn state(&self, name: &str) -> Option<Arc<ModuleState>> {
        self.modules.read().unwrap().get(name).cloned()
    }

    fn dependents(&self, name: &str) -> Vec<String> {
        self.graph.read().unwrap().dependents(name)
    }

    async fn run_disable_hook(&self, name: &str, state: &Arc<ModuleState>) {
        let module = state.module();
        self.catch_hook(name, "on_disable", module.on_disable()).await;
    }

    /// Await a lifecycle hook, absorbing panics at the invocation boundary.
    ///
    /// Returns false when the hook panicked; the process keeps running.
    async fn catch_hook<F>(&self, name: &str, hook: &str, fut: F) -> bool
    where
        F: std::future::Future<Output = ()>,
    {
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(()) => true,
            Err(panic) => {
                tracing::error!(
                    module = %name,
                    hook = %hook,
                    panic = %panic_message(&panic),
                    "module hook panicked"
                );
                false
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
