//! Observability subsystem.
//!
//! Structured logging via `tracing`: every subsystem logs with field syntax,
//! and asynchronous work (reloads, event deliveries) carries a correlation
//! identifier so related entries can be joined.

pub mod logging;
