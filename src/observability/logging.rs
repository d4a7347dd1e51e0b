//! Structured logging setup.
//!
//! One-time tracing initialization: env-filter layered over a fmt
//! subscriber. The filter comes from `RUST_LOG` when set, otherwise from
//! the supplied default directive.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global tracing subscriber.
pub fn init(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
