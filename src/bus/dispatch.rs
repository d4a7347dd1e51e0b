//! Event dispatch: subscriber registry and fire-and-forget delivery.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::bus::events::{EventContext, EventType, Payload};

/// Upper bound on one handler invocation before its context is cancelled.
pub const HANDLER_TIMEOUT: Duration = Duration::from_secs(15);

/// An async event handler.
pub type Handler = Arc<dyn Fn(EventContext, Payload) -> BoxFuture<'static, ()> + Send + Sync>;

/// Wrap an async closure into a [`Handler`].
pub fn handler<F, Fut>(f: F) -> Handler
where
    F: Fn(EventContext, Payload) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    Arc::new(move |ctx, payload| f(ctx, payload).boxed())
}

/// Identifier of one subscription, unique for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    handler: Handler,
}

/// In-process publish/subscribe router keyed by event type.
///
/// Delivery is concurrent and isolated: each publish snapshots the current
/// subscriber list under a read lock, then spawns one task per subscriber.
/// A panicking handler is caught at the dispatch boundary and never affects
/// sibling handlers or the publisher. No ordering is guaranteed across
/// handlers of one event or across successive publishes.
pub struct EventBus {
    subscribers: RwLock<HashMap<EventType, Vec<Subscriber>>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        })
    }

    /// Register a handler for an event type.
    pub fn subscribe(&self, event: EventType, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let mut subscribers = self.subscribers.write().unwrap();
        subscribers
            .entry(event)
            .or_default()
            .push(Subscriber { id, handler });

        tracing::debug!(event = %event, id = id.0, "handler subscribed");
        id
    }

    /// Remove the subscriber with the given identifier; no-op when absent.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut subscribers = self.subscribers.write().unwrap();
        for (event, subs) in subscribers.iter_mut() {
            if let Some(pos) = subs.iter().position(|s| s.id == id) {
                subs.remove(pos);
                tracing::debug!(event = %event, id = id.0, "handler unsubscribed");
                return;
            }
        }
    }

    /// Deliver `payload` to every current subscriber of `event`.
    ///
    /// Fire-and-forget: never blocks on handler completion and never surfaces
    /// handler errors to the caller. With zero subscribers this is a cheap
    /// no-op.
    pub fn publish(&self, event: EventType, payload: Payload) {
        let correlation_id = Uuid::new_v4().simple().to_string();

        let snapshot: Vec<Handler> = {
            let subscribers = self.subscribers.read().unwrap();
            subscribers
                .get(&event)
                .map(|subs| subs.iter().map(|s| Arc::clone(&s.handler)).collect())
                .unwrap_or_default()
        };

        if snapshot.is_empty() {
            tracing::debug!(
                event = %event,
                correlation = %correlation_id,
                "event published but no subscribers found"
            );
            return;
        }

        tracing::info!(
            event = %event,
            correlation = %correlation_id,
            handlers = snapshot.len(),
            "publishing event"
        );

        for handler in snapshot {
            let payload = Arc::clone(&payload);
            let cancel = CancellationToken::new();
            let ctx = EventContext::new(event, correlation_id.clone(), cancel.clone());
            let correlation_id = correlation_id.clone();

            tokio::spawn(async move {
                let invocation = AssertUnwindSafe(handler(ctx, payload)).catch_unwind();
                match tokio::time::timeout(HANDLER_TIMEOUT, invocation).await {
                    Ok(Ok(())) => {}
                    Ok(Err(panic)) => {
                        tracing::error!(
                            event = %event,
                            correlation = %correlation_id,
                            panic = %panic_message(&panic),
                            "event handler panicked"
                        );
                    }
                    Err(_) => {
                        // Cooperative guard, not preemption: anything the
                        // handler spawned can still observe the token.
                        cancel.cancel();
                        tracing::warn!(
                            event = %event,
                            correlation = %correlation_id,
                            timeout_secs = HANDLER_TIMEOUT.as_secs(),
                            "event handler exceeded deadline"
                        );
                    }
                }
            });
        }
    }

    /// Current subscriber count for an event type.
    pub fn subscriber_count(&self, event: EventType) -> usize {
        let subscribers = self.subscribers.read().unwrap();
        subscribers.get(&event).map(Vec::len).unwrap_or(0)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::events::MESSAGE_CREATED;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn counting_handler(counter: Arc<AtomicUsize>) -> Handler {
        handler(move |_ctx, _payload| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let bus = EventBus::new();
        bus.publish(MESSAGE_CREATED, Arc::new("hello".to_string()));
        assert_eq!(bus.subscriber_count(MESSAGE_CREATED), 0);
    }

    #[tokio::test]
    async fn test_delivery_reaches_every_subscriber() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        bus.subscribe(MESSAGE_CREATED, counting_handler(Arc::clone(&counter)));
        bus.subscribe(MESSAGE_CREATED, counting_handler(Arc::clone(&counter)));

        bus.publish(MESSAGE_CREATED, Arc::new(1u32));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_panicking_handler_does_not_affect_siblings() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));

        bus.subscribe(
            MESSAGE_CREATED,
            handler(|_ctx, _payload| async move {
                panic!("boom");
            }),
        );
        bus.subscribe(MESSAGE_CREATED, counting_handler(Arc::clone(&counter)));

        // Publisher must not observe the panic.
        bus.publish(MESSAGE_CREATED, Arc::new(()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let id = bus.subscribe(MESSAGE_CREATED, counting_handler(Arc::clone(&counter)));

        bus.unsubscribe(id);
        bus.unsubscribe(id); // second removal is a no-op

        bus.publish(MESSAGE_CREATED, Arc::new(()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_subscription_ids_are_unique() {
        let bus = EventBus::new();
        let a = bus.subscribe(MESSAGE_CREATED, counting_handler(Arc::new(AtomicUsize::new(0))));
        let b = bus.subscribe(MESSAGE_CREATED, counting_handler(Arc::new(AtomicUsize::new(0))));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_payload_type_mismatch_is_ignored_by_subscriber() {
        let bus = EventBus::new();
        let matched = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&matched);

        bus.subscribe(
            MESSAGE_CREATED,
            handler(move |_ctx, payload| {
                let counter = Arc::clone(&counter);
                async move {
                    if payload.downcast_ref::<String>().is_some() {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }
                }
            }),
        );

        bus.publish(MESSAGE_CREATED, Arc::new(42u64));
        bus.publish(MESSAGE_CREATED, Arc::new("text".to_string()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(matched.load(Ordering::SeqCst), 1);
    }
}
