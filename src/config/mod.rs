//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults/<name>.yaml + overrides/MERGE.<name>.yaml
//!     → loader.rs (deep merge, strict decode)
//!     → validation.rs (semantic checks, all violations reported)
//!     → ConfigStore entry (last validated value)
//!     → update callback → module registry
//!
//! On file change:
//!     watcher.rs (notify event)
//!     → ConfigStore::on_fs_event (per-name debounce, 200 ms)
//!     → reload-merge-validate
//!     → success: swap value, callback(Some)
//!     → failure: keep value, callback(None)
//! ```
//!
//! # Design Decisions
//! - A registered value is immutable; changes arrive as whole new instances
//! - Override files never take a module down: unreadable overrides are
//!   skipped, invalid merged results leave the previous value in effect
//! - Decoding is strict; schema types reject unknown fields

pub mod loader;
pub mod schema;
pub mod store;
pub mod validation;
pub mod watcher;

pub use loader::{ConfigError, DEBOUNCE, EXTENSION, OVERRIDE_PREFIX};
pub use schema::{downcast_config, ConfigValue, Schema};
pub use store::{ConfigStore, FileStatus, ScanReport, UpdateCallback};
pub use validation::{Validate, ValidationError};
pub use watcher::ConfigWatcher;
