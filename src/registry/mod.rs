//! Module registry subsystem.
//!
//! # Data Flow
//! ```text
//! register(module)
//!     → dependency graph update (cycle check)
//!     → ConfigStore::register (when the module has a config key)
//!     → initial callback → try_enable
//!
//! Config reload callback:
//!     valid   → enabled: live on_config_update / otherwise: try_enable
//!     invalid → on_disable, Disabled("invalid configuration"),
//!               depth-first cascade over dependents
//!
//! try_enable success → retry every dependent parked in DependencyDisabled
//! ```
//!
//! # Design Decisions
//! - Dependencies are declared explicitly, never discovered by introspection
//! - Cascades run synchronously inside the triggering call
//! - Hook panics are absorbed at the invocation boundary, not propagated

pub mod graph;
pub mod manager;
pub mod state;

pub use manager::{ModuleRegistry, RegistryError};
pub use state::{ModuleInfo, ModuleStatus};
