//! End-to-end hot reload: file change → watcher → debounce → registry.

mod common;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use common::{write_config, TestConfig, TestModule};
use modkit::config::{ConfigStore, ConfigWatcher};
use modkit::lifecycle::Shutdown;
use modkit::Module;
use modkit::registry::{ModuleRegistry, ModuleStatus};

/// Generous settle time for notify delivery plus the 200 ms debounce.
const SETTLE: Duration = Duration::from_millis(1500);

#[tokio::test]
async fn test_file_edit_live_updates_enabled_module() {
    let defaults = TempDir::new().unwrap();
    let overrides = TempDir::new().unwrap();
    let path = write_config(defaults.path(), "system.a", "greeting: hi\nlevel: 1\n");

    let store = ConfigStore::new(defaults.path(), overrides.path()).unwrap();
    let shutdown = Shutdown::new();
    let _watcher = ConfigWatcher::new(Arc::clone(&store))
        .run(shutdown.subscribe())
        .unwrap();
    let registry = ModuleRegistry::new(store);

    let module = Arc::new(TestModule::new("a").with_config("system.a"));
    registry.register(Arc::clone(&module) as Arc<dyn Module>).await.unwrap();
    assert!(registry.is_module_enabled("a"));

    fs::write(&path, "greeting: updated\nlevel: 2\n").unwrap();
    tokio::time::sleep(SETTLE).await;

    assert!(registry.is_module_enabled("a"));
    assert_eq!(module.hook_count("update"), 1);
    assert_eq!(module.hook_count("disable"), 0);
    let typed = registry.typed_config::<TestConfig>("a").unwrap();
    assert_eq!(typed.greeting, "updated");

    shutdown.trigger();
}

#[tokio::test]
async fn test_invalid_file_edit_degrades_module_and_keeps_value() {
    let defaults = TempDir::new().unwrap();
    let overrides = TempDir::new().unwrap();
    let path = write_config(defaults.path(), "system.a", "greeting: hi\nlevel: 1\n");

    let store = ConfigStore::new(defaults.path(), overrides.path()).unwrap();
    let shutdown = Shutdown::new();
    let _watcher = ConfigWatcher::new(Arc::clone(&store))
        .run(shutdown.subscribe())
        .unwrap();
    let registry = ModuleRegistry::new(Arc::clone(&store));

    let module = Arc::new(TestModule::new("a").with_config("system.a"));
    registry.register(Arc::clone(&module) as Arc<dyn Module>).await.unwrap();

    // Unknown field: strict decoding must reject the reload.
    fs::write(&path, "greeting: hi\nbogus_field: 1\n").unwrap();
    tokio::time::sleep(SETTLE).await;

    let info = registry.module_info("a").unwrap();
    assert_eq!(info.status, ModuleStatus::Disabled);
    assert_eq!(info.error, "invalid configuration");
    assert_eq!(module.hook_count("disable"), 1);

    // The store keeps the last good value.
    let value = store.get("system.a").unwrap();
    let typed = modkit::config::downcast_config::<TestConfig>(&value).unwrap();
    assert_eq!(typed.greeting, "hi");

    shutdown.trigger();
}

#[tokio::test]
async fn test_override_file_creation_triggers_merge() {
    let defaults = TempDir::new().unwrap();
    let overrides = TempDir::new().unwrap();
    write_config(defaults.path(), "system.a", "greeting: hi\nlevel: 1\n");

    let store = ConfigStore::new(defaults.path(), overrides.path()).unwrap();
    let shutdown = Shutdown::new();
    let _watcher = ConfigWatcher::new(Arc::clone(&store))
        .run(shutdown.subscribe())
        .unwrap();
    let registry = ModuleRegistry::new(store);

    let module = Arc::new(TestModule::new("a").with_config("system.a"));
    registry.register(Arc::clone(&module) as Arc<dyn Module>).await.unwrap();

    fs::write(
        overrides.path().join("MERGE.system.a.yaml"),
        "level: 7\n",
    )
    .unwrap();
    tokio::time::sleep(SETTLE).await;

    let typed = registry.typed_config::<TestConfig>("a").unwrap();
    assert_eq!(typed.greeting, "hi"); // base survives
    assert_eq!(typed.level, 7); // override wins

    shutdown.trigger();
}
