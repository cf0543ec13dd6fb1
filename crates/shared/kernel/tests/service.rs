pub mod fixtures;

use confhub_kernel::domain::{OperationTimeouts, PathSettings};
use confhub_kernel::{ConfigsError, ConfigsService};
use fixtures::*;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test]
async fn test_counter_survives_a_restart() {
    let fs = MemoryFileSystem::default();
    let id = ConfigsService::id_of::<Counter>();

    let first = service(&fs);
    let counter = first.register::<Counter>().unwrap();
    first.initialize_config(id, false).await.unwrap();

    assert_eq!(fs.get_json(app_path("Counter.cfg")), Some(json!({ "count": 0 })));
    assert_eq!(counter.read().await.count, 0);

    counter.write().await.count = 5;
    first.save_config_to_file(id, false).await.unwrap();

    let second = service(&fs);
    let restored = second.register::<Counter>().unwrap();
    second.initialize_config(id, false).await.unwrap();
    assert_eq!(restored.read().await.count, 5);
}

#[tokio::test]
async fn test_create_does_not_overwrite() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);
    let counter = service.register::<Counter>().unwrap();
    let id = ConfigsService::id_of::<Counter>();

    service.create_config_file(id).await.unwrap();
    counter.write().await.count = 42;
    service.create_config_file(id).await.unwrap();

    assert_eq!(fs.get_json(app_path("Counter.cfg")), Some(json!({ "count": 0 })));
    assert_eq!(fs.commits(), 1);
}

#[tokio::test]
async fn test_missing_file_leaves_instance_untouched() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);
    let counter = service.register::<Counter>().unwrap();
    counter.write().await.count = 7;

    let err = service.load_config_from_file(ConfigsService::id_of::<Counter>(), false).await;

    assert!(matches!(err, Err(ConfigsError::FileNotFound { .. })));
    assert_eq!(counter.read().await.count, 7);
}

#[tokio::test]
async fn test_load_replaces_collections_and_keeps_absent_fields() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);
    let catalog = service.register::<Catalog>().unwrap();

    fs.put(app_path("data/catalog.json"), br#"{ "items": [9] }"#.to_vec());
    service.load_config_from_file(ConfigsService::id_of::<Catalog>(), false).await.unwrap();

    let loaded = catalog.read().await;
    assert_eq!(loaded.items, vec![9], "collections must be replaced, not appended");
    assert_eq!(loaded.name, "default", "absent fields keep their in-memory value");
}

#[tokio::test]
async fn test_broken_file_leaves_instance_untouched() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);
    let catalog = service.register::<Catalog>().unwrap();
    let id = ConfigsService::id_of::<Catalog>();

    fs.put(app_path("data/catalog.json"), b"{ not json".to_vec());
    let err = service.load_config_from_file(id, false).await.unwrap_err();
    assert_eq!(err.kind(), "Serialization");

    fs.put(app_path("data/catalog.json"), br#"{ "items": "nine" }"#.to_vec());
    let err = service.load_config_from_file(id, false).await.unwrap_err();
    assert_eq!(err.kind(), "Document");

    assert_eq!(*catalog.read().await, Catalog::default());
}

#[tokio::test]
async fn test_handles_observe_loaded_values() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);
    let id = ConfigsService::id_of::<Counter>();
    let early = service.register::<Counter>().unwrap();

    fs.put(app_path("Counter.cfg"), br#"{ "count": 3 }"#.to_vec());
    service.load_config_from_file(id, false).await.unwrap();

    let late = service.get_config::<Counter>(id).unwrap();
    assert!(early.ptr_eq(&late));
    assert_eq!(early.read().await.count, 3);
}

#[tokio::test]
async fn test_correctness_check_blocks_save() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);
    let guarded = service.register::<Guarded>().unwrap();
    let id = ConfigsService::id_of::<Guarded>();
    guarded.write().await.limit = 0;

    let err = service.save_config_to_file(id, true).await.unwrap_err();
    assert!(matches!(&err, ConfigsError::ConfigDataInvalid { message, .. } if message == "limit must be positive"));
    assert!(fs.paths().is_empty(), "nothing may be written for invalid data");

    service.save_config_to_file(id, false).await.unwrap();
    assert_eq!(fs.paths(), vec![app_path("Guarded.cfg")]);
    assert!(service.check_data_correctness(id).await.is_err());
}

#[tokio::test]
async fn test_correctness_check_after_load() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);
    service.register::<Guarded>().unwrap();
    let id = ConfigsService::id_of::<Guarded>();

    fs.put(app_path("Guarded.cfg"), br#"{ "limit": 0, "saves": 0 }"#.to_vec());

    service.load_config_from_file(id, false).await.unwrap();
    let err = service.load_config_from_file(id, true).await.unwrap_err();
    assert_eq!(err.kind(), "ConfigDataInvalid");
}

#[tokio::test]
async fn test_declared_hooks_run() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);
    let guarded = service.register::<Guarded>().unwrap();
    let id = ConfigsService::id_of::<Guarded>();

    service.save_config_to_file(id, true).await.unwrap();
    assert_eq!(fs.get_json(app_path("Guarded.cfg")), Some(json!({ "limit": 10, "saves": 1 })));
    assert!(!guarded.read().await.loaded);

    service.load_config_from_file(id, true).await.unwrap();
    let loaded = guarded.read().await;
    assert!(loaded.loaded);
    assert_eq!(loaded.saves, 1);
}

#[tokio::test]
async fn test_undeclared_hooks_are_skipped() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);
    service.register::<Undeclared>().unwrap();
    let id = ConfigsService::id_of::<Undeclared>();

    service.save_config_to_file(id, true).await.unwrap();
    service.check_data_correctness(id).await.unwrap();
    assert_eq!(fs.get_json(app_path("Undeclared.cfg")), Some(json!({ "limit": 0, "saves": 0 })));
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);
    service.register::<Counter>().unwrap();
    let id = ConfigsService::id_of::<Counter>();

    service.create_config_file(id).await.unwrap();
    service.delete_config_file(id).await.unwrap();
    assert!(fs.paths().is_empty());
    service.delete_config_file(id).await.unwrap();
}

#[test]
fn test_duplicate_registration_keeps_first_instance() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);
    let calls = AtomicUsize::new(0);
    let factory = || {
        calls.fetch_add(1, Ordering::SeqCst);
        Counter { count: 1 }
    };

    let first = service.register_type("counter", factory, None).unwrap();
    let err = service.register_type("counter", factory, None).unwrap_err();

    assert!(matches!(err, ConfigsError::DuplicateRegistration { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1, "factory must not run for a rejected id");
    assert!(service.get_config::<Counter>("counter").unwrap().ptr_eq(&first));
}

#[test]
fn test_blank_identifier_is_rejected() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);

    for id in ["", "   "] {
        let err = service.register_type(id, Counter::default, None).unwrap_err();
        assert!(matches!(err, ConfigsError::InvalidIdentifier { .. }), "{id:?}: {err}");
    }
    assert!(service.is_empty());
}

#[test]
fn test_lookup_failures() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);
    service.register_type("shared", Counter::default, None).unwrap();

    let missing = service.get_config::<Counter>("absent").unwrap_err();
    assert!(matches!(missing, ConfigsError::UnknownType { .. }));

    let mismatch = service.get_config::<Catalog>("shared").unwrap_err();
    assert!(matches!(mismatch, ConfigsError::TypeMismatch { .. }));
}

#[tokio::test]
async fn test_unknown_ids_fail_every_operation() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);

    assert_eq!(service.create_config_file("nope").await.unwrap_err().kind(), "UnknownType");
    assert_eq!(service.save_config_to_file("nope", false).await.unwrap_err().kind(), "UnknownType");
    assert_eq!(service.load_config_from_file("nope", false).await.unwrap_err().kind(), "UnknownType");
    assert_eq!(service.delete_config_file("nope").await.unwrap_err().kind(), "UnknownType");
    assert_eq!(service.unregister_type("nope").unwrap_err().kind(), "UnknownType");
}

#[test]
fn test_registration_order_and_unregister() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);
    service.register_type("b", Counter::default, None).unwrap();
    service.register_type("a", Counter::default, None).unwrap();
    service.register_type("c", Counter::default, None).unwrap();

    service.unregister_type("a").unwrap();

    let ids: Vec<_> = service.registered_ids().iter().map(ToString::to_string).collect();
    assert_eq!(ids, ["b", "c"]);
    assert_eq!(service.len(), 2);
    assert!(!service.contains_config("a"));
}

#[test]
fn test_path_resolution() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);
    service.register::<Catalog>().unwrap();
    let overrides = PathSettings::new(Some("PathOverride 1"), Some("c.json")).unwrap();
    service.register_type("counter", Counter::default, Some(overrides)).unwrap();

    let catalog = ConfigsService::id_of::<Catalog>();
    assert_eq!(service.resolve_file_path(catalog).unwrap(), app_path("data/catalog.json"));
    assert_eq!(service.resolve_file_path("counter").unwrap(), app_path("PathOverride 1/c.json"));

    service.set_common_directory(Some("configs")).unwrap();
    assert_eq!(service.resolve_file_path(catalog).unwrap(), app_path("configs/data/catalog.json"));

    assert!(service.set_common_directory(Some("bad|dir")).is_err());
    assert_eq!(service.common_directory(), Some(PathBuf::from("configs")));
}

#[test]
fn test_path_override_lifecycle() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);
    service.register::<Catalog>().unwrap();
    let id = ConfigsService::id_of::<Catalog>();

    assert!(!service.has_path_override(id).unwrap());

    let name_only = PathSettings::with_file_name("custom.cfg").unwrap();
    service.set_path_override(id, name_only.clone()).unwrap();
    assert_eq!(service.path_override(id).unwrap(), Some(name_only));
    assert_eq!(service.resolve_file_path(id).unwrap(), app_path("data/custom.cfg"));

    service.clear_path_override(id).unwrap();
    assert_eq!(service.resolve_file_path(id).unwrap(), app_path("data/catalog.json"));

    service.set_path_override(id, PathSettings::default()).unwrap();
    assert!(!service.has_path_override(id).unwrap(), "empty overrides are dropped");
}

#[tokio::test]
async fn test_bulk_operations_cover_every_registration() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);
    service.register::<Counter>().unwrap();
    service.register::<Catalog>().unwrap();

    service.initialize_all_configs(false).await.unwrap();
    assert_eq!(fs.paths(), vec![app_path("Counter.cfg"), app_path("data/catalog.json")]);

    service.save_all_configs_to_files(true).await.unwrap();
    service.load_all_configs_from_files(true).await.unwrap();
    service.check_all_configs_data_correctness().await.unwrap();

    service.delete_all_config_files().await.unwrap();
    assert!(fs.paths().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_writes_time_out() {
    let fs = MemoryFileSystem::with_latency(Duration::from_millis(100));
    let service = service(&fs);
    service.set_timeouts(OperationTimeouts::uniform(Duration::from_millis(10)));
    service.register::<Counter>().unwrap();
    let id = ConfigsService::id_of::<Counter>();

    let err = service.save_config_to_file(id, false).await.unwrap_err();

    assert!(err.is_timeout());
    assert!(matches!(err, ConfigsError::OperationTimeout { operation: "save", .. }));
    assert_eq!(fs.commits(), 0, "a timed-out write must not be committed");
}

#[tokio::test(start_paused = true)]
async fn test_slow_reads_time_out() {
    let fs = MemoryFileSystem::with_latency(Duration::from_millis(100));
    let service = service(&fs);
    service.set_timeouts(OperationTimeouts::uniform(Duration::from_millis(10)));
    let counter = service.register::<Counter>().unwrap();

    fs.put(app_path("Counter.cfg"), br#"{ "count": 9 }"#.to_vec());
    let err = service.load_config_from_file(ConfigsService::id_of::<Counter>(), false).await;

    assert!(err.unwrap_err().is_timeout());
    assert_eq!(counter.read().await.count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_generous_budget_absorbs_latency() {
    let fs = MemoryFileSystem::with_latency(Duration::from_millis(100));
    let service = service(&fs);
    service.register::<Counter>().unwrap();

    service.initialize_config(ConfigsService::id_of::<Counter>(), false).await.unwrap();
    assert_eq!(fs.commits(), 1);
}

#[tokio::test]
async fn test_unbounded_timeouts_do_not_overflow() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);
    service.set_timeouts(OperationTimeouts::uniform(Duration::MAX));
    let guarded = service.register::<Guarded>().unwrap();
    let id = ConfigsService::id_of::<Guarded>();

    service.create_config_file(id).await.unwrap();
    service.save_config_to_file(id, true).await.unwrap();
    service.load_config_from_file(id, true).await.unwrap();
    service.initialize_config(id, true).await.unwrap();

    assert!(guarded.read().await.loaded);
}

#[tokio::test]
async fn test_load_keeps_state_that_is_not_persisted() {
    let fs = MemoryFileSystem::default();
    let service = service(&fs);
    let cached = service.register::<Cached>().unwrap();
    let id = ConfigsService::id_of::<Cached>();

    cached.write().await.cache = 7;
    fs.put(app_path("Cached.cfg"), br#"{ "count": 3 }"#.to_vec());
    service.load_config_from_file(id, false).await.unwrap();

    let loaded = cached.read().await;
    assert_eq!(loaded.count, 3);
    assert_eq!(loaded.cache, 7);
}
