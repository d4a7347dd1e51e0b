//! Event types and per-delivery context.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Opaque event type key.
///
/// Gateway adapters and modules agree on these constants; the bus itself
/// attaches no meaning to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventType(pub &'static str);

impl EventType {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A chat message was created on the gateway.
pub const MESSAGE_CREATED: EventType = EventType("message.created");
/// A chat message was edited.
pub const MESSAGE_UPDATED: EventType = EventType("message.updated");
/// A chat message was removed.
pub const MESSAGE_DELETED: EventType = EventType("message.deleted");
/// The gateway connection finished its handshake.
pub const GATEWAY_READY: EventType = EventType("gateway.ready");

/// Untyped event payload.
///
/// Subscribers downcast to the concrete type they expect and silently ignore
/// payloads of any other type.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// Per-delivery context handed to every handler invocation.
///
/// Carries a fresh correlation ID for log joining and a cancellation token
/// that is cancelled when the delivery deadline passes. Cancellation is
/// cooperative: the bus never forcibly terminates a handler's side effects,
/// so long-running handlers must observe the token.
#[derive(Debug, Clone)]
pub struct EventContext {
    pub event: EventType,
    pub correlation_id: String,
    cancel: CancellationToken,
}

impl EventContext {
    pub(crate) fn new(event: EventType, correlation_id: String, cancel: CancellationToken) -> Self {
        Self {
            event,
            correlation_id,
            cancel,
        }
    }

    /// True once the delivery deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when the delivery deadline passes.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}
