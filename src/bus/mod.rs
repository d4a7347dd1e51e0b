//! Asynchronous event bus subsystem.
//!
//! # Data Flow
//! ```text
//! gateway adapter ──► EventBus::publish(event, payload)
//!                        │ snapshot subscribers (read lock)
//!                        ├──► task: handler A  (fresh correlation ID, 15 s deadline)
//!                        ├──► task: handler B
//!                        └──► task: handler C
//!
//! modules subscribe on enable, unsubscribe on disable
//! ```
//!
//! # Design Decisions
//! - Publish never holds the lock during handler execution
//! - Handler panics are caught and logged, never propagated
//! - Timeout is a cooperative guard via CancellationToken, not preemption

pub mod dispatch;
pub mod events;

pub use dispatch::{handler, EventBus, Handler, SubscriptionId, HANDLER_TIMEOUT};
pub use events::{
    EventContext, EventType, Payload, GATEWAY_READY, MESSAGE_CREATED, MESSAGE_DELETED,
    MESSAGE_UPDATED,
};
