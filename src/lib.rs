//! # modkit
//!
//! Pluggable module runtime for a long-lived network agent. Independent
//! feature units ("modules") are registered, configured from layered YAML,
//! wired to an internal event stream, and can be enabled, disabled, or
//! hot-reloaded at runtime without restarting the process.
//!
//! # Architecture Overview
//!
//! ```text
//!  defaults/*.yaml  overrides/MERGE.*.yaml
//!        │                │
//!        ▼                ▼
//!  ┌──────────────────────────────┐      ┌──────────────────────────────┐
//!  │  config                      │      │  registry                    │
//!  │  load → deep merge →         │ cb   │  per-module state machine    │
//!  │  strict decode → validate    │─────▶│  Disabled / Enabled / Error  │
//!  │  notify watch + debounce     │      │  / DependencyDisabled        │
//!  └──────────────────────────────┘      │  dependency graph + cascades │
//!                                        └──────────────┬───────────────┘
//!                                                       │ lifecycle hooks
//!                                                       ▼
//!  ┌──────────────────────────────┐      ┌──────────────────────────────┐
//!  │  bus                         │◀─────│  modules (external)          │
//!  │  publish/subscribe by type   │ sub/ │  subscribe on enable,        │
//!  │  task per handler, 15 s      │unsub │  unsubscribe on disable      │
//!  │  deadline, panic isolation   │      └──────────────────────────────┘
//!  └──────────────────────────────┘
//! ```
//!
//! The gateway connection, HTTP control plane, and concrete modules live
//! outside this crate and talk to the core through the [`module::Module`]
//! contract, the bus constants, and the registry's inspection queries.

// Core subsystems
pub mod bus;
pub mod config;
pub mod module;
pub mod registry;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use bus::{EventBus, EventContext, EventType, Payload, SubscriptionId};
pub use config::{ConfigError, ConfigStore, ConfigValue, ConfigWatcher, Schema, Validate};
pub use module::Module;
pub use registry::{ModuleInfo, ModuleRegistry, ModuleStatus, RegistryError};
