//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Init logging → ConfigStore → watcher → ModuleRegistry → register modules
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → watch loop exits → process exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Registration-time errors are the only ones allowed to abort startup
//! - Post-startup failures degrade individual modules, never the process

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
