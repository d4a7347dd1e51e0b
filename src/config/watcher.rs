//! Configuration directory watcher for hot reload.
//!
//! Bridges `notify` filesystem events into the tokio runtime over an
//! unbounded channel and forwards relevant paths to the store, which owns
//! the per-name debounce timers.

use std::sync::Arc;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};

use crate::config::loader::ConfigError;
use crate::config::store::ConfigStore;

/// Watches the defaults and overrides directories for the store.
pub struct ConfigWatcher {
    store: Arc<ConfigStore>,
}

impl ConfigWatcher {
    pub fn new(store: Arc<ConfigStore>) -> Self {
        Self { store }
    }

    /// Start watching both config directories.
    ///
    /// Spawns the forwarding loop and returns the underlying watcher, which
    /// the caller must keep alive for the watch to stay active. The loop
    /// exits on the shutdown signal; watch errors are logged and skipped.
    pub fn run(
        self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<RecommendedWatcher, ConfigError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = tx.send(res);
            },
            notify::Config::default(),
        )?;

        watcher.watch(self.store.defaults_dir(), RecursiveMode::NonRecursive)?;
        watcher.watch(self.store.overrides_dir(), RecursiveMode::NonRecursive)?;

        tracing::info!(
            defaults = %self.store.defaults_dir().display(),
            overrides = %self.store.overrides_dir().display(),
            "config watcher started"
        );

        let store = self.store;
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.recv() => {
                        tracing::info!("config watcher received shutdown signal, exiting loop");
                        break;
                    }
                    event = rx.recv() => match event {
                        Some(Ok(event)) => handle_event(&store, &event),
                        Some(Err(e)) => tracing::error!(error = %e, "config watch error"),
                        None => break,
                    }
                }
            }
        });

        Ok(watcher)
    }
}

fn handle_event(store: &Arc<ConfigStore>, event: &Event) {
    if !is_relevant(&event.kind) {
        return;
    }
    for path in &event.paths {
        store.on_fs_event(path);
    }
}

fn is_relevant(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}
