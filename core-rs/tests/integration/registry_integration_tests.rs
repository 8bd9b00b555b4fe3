//! Integration tests for the module registry
//!
//! Exercises the registry through its public API:
//! - Registration, lookup and re-registration
//! - Dependency preparation and status transitions
//! - Action dispatch and view output along parent chains
//! - Configuration-driven behavior (strict requirements, duplicate rejection, depth limit)

use modchain_core::{
    ActionOutcome, DelegationChain, DependencyResolver, MemoryViewStore, ModError, ModuleRecord, ModuleRegistry,
    ModuleStatus, RegistryConfig,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread;

// ==================== Test Helper Functions ====================

fn module(name: &str, version: &str) -> ModuleRecord {
    ModuleRecord::builder(name).version(version).build().unwrap()
}

/// Registry with `core` -> `layout` -> `blog` (child last)
fn three_level_registry() -> ModuleRegistry {
    let registry = ModuleRegistry::new();
    registry
        .register(
            ModuleRecord::builder("core")
                .version("1.4.0")
                .path("/modules/core")
                .respond("about", json!("core"))
                .respond("help", json!("core help"))
                .build()
                .unwrap(),
        )
        .unwrap();
    registry
        .register(
            ModuleRecord::builder("layout")
                .version("0.9.0")
                .parent("core")
                .path("/modules/layout")
                .respond("about", json!("layout"))
                .requires("core", ">=1.0")
                .build()
                .unwrap(),
        )
        .unwrap();
    registry
        .register(
            ModuleRecord::builder("blog")
                .version("2.0.0")
                .parent("layout")
                .path("/modules/blog")
                .requires("layout", "<1.0.0")
                .requires_any("core")
                .build()
                .unwrap(),
        )
        .unwrap();
    registry
}

// ==================== Registration ====================

#[test]
fn test_reregistration_replaces_previous_module() {
    let registry = ModuleRegistry::new();
    assert!(registry.register(module("core", "1.0.0")).unwrap().is_none());

    let previous = registry.register(module("core", "2.0.0")).unwrap();
    assert_eq!(previous.unwrap().version, "1.0.0");
    assert_eq!(registry.get("core").unwrap().version, "2.0.0");
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_reject_duplicates_keeps_first_module() {
    let registry = ModuleRegistry::with_config(RegistryConfig {
        reject_duplicates: true,
        ..RegistryConfig::default()
    });
    registry.register(module("core", "1.0.0")).unwrap();

    let err = registry.register(module("CORE", "2.0.0")).unwrap_err();
    assert!(matches!(err, ModError::DuplicateModule(id) if id == "core"));
    assert_eq!(registry.get("core").unwrap().version, "1.0.0");
}

#[test]
fn test_get_unknown_module() {
    let registry = ModuleRegistry::new();
    assert!(matches!(registry.get("ghost"), Err(ModError::UnknownModule(id)) if id == "ghost"));
    assert!(matches!(registry.dispatch("ghost", "index"), Err(ModError::UnknownModule(_))));
}

#[test]
fn test_list_is_sorted_by_id() {
    let registry = three_level_registry();
    let ids: Vec<_> = registry.list().iter().map(|m| m.id.clone()).collect();
    assert_eq!(ids, vec!["blog", "core", "layout"]);
}

// ==================== Preparation ====================

#[test]
fn test_prepare_all_modules_in_chain() {
    let registry = three_level_registry();
    for id in ["core", "layout", "blog"] {
        registry.prepare(id).unwrap();
        assert_eq!(registry.get(id).unwrap().status, ModuleStatus::Prepared);
    }
}

#[test]
fn test_prepare_marks_failed_on_version_mismatch() {
    let registry = three_level_registry();
    registry.register(module("layout", "1.0.0")).unwrap();

    let err = registry.prepare("blog").unwrap_err();
    match err {
        ModError::VersionMismatch { requiring, required, operator, required_version, found_version } => {
            assert_eq!(requiring, "blog");
            assert_eq!(required, "layout");
            assert_eq!(operator, "<");
            assert_eq!(required_version, "1.0.0");
            assert_eq!(found_version, "1.0.0");
        }
        other => panic!("Expected VersionMismatch, got {:?}", other),
    }
    assert_eq!(registry.get("blog").unwrap().status, ModuleStatus::Failed);
}

/// Test: resolution checks direct requirements only
///
/// `blog` requires `layout`, which requires a module that is not registered.
/// Preparing `blog` still succeeds; only `layout` itself fails.
#[test]
fn test_requirements_are_not_transitive() {
    let registry = ModuleRegistry::new();
    registry
        .register(ModuleRecord::builder("layout").version("1.0").requires_any("missing").build().unwrap())
        .unwrap();
    registry
        .register(ModuleRecord::builder("blog").requires("layout", "1.0").build().unwrap())
        .unwrap();

    registry.prepare("blog").unwrap();
    assert!(matches!(registry.prepare("layout"), Err(ModError::ModuleNotFound { .. })));
}

#[test]
fn test_strict_mode_from_config() {
    let strict = ModuleRegistry::with_config(RegistryConfig {
        strict_requirements: true,
        ..RegistryConfig::default()
    });
    strict.register(module("core", "1.0.0")).unwrap();
    strict
        .register(ModuleRecord::builder("x").requires("core", ">=one.two").build().unwrap())
        .unwrap();

    let err = strict.prepare("x").unwrap_err();
    assert!(matches!(err, ModError::MalformedRequirement { ref requirement, .. } if requirement == ">=one.two"));

    // Same module passes when resolved permissively
    let record = strict.get("x").unwrap();
    DependencyResolver::new(&strict).strict(false).resolve(&record).unwrap();
}

// ==================== Lifecycle ====================

#[test]
fn test_init_sets_fields_and_configuration() {
    let registry = ModuleRegistry::new();
    registry.register(module("gallery", "1.0.0")).unwrap();

    let mut options = BTreeMap::new();
    options.insert("version".to_string(), json!("1.1.0"));
    options.insert("author".to_string(), json!("Jane Roe"));
    options.insert("parent".to_string(), json!("core"));
    options.insert("thumbnails".to_string(), json!(12));

    let record = registry.init("gallery", &options).unwrap();
    assert_eq!(record.version, "1.1.0");
    assert_eq!(record.author, "Jane Roe");
    assert_eq!(record.parent.as_deref(), Some("core"));
    assert_eq!(record.option("thumbnails"), Some(&json!(12)));
    assert_eq!(record.status, ModuleStatus::Initialized);
}

#[test]
fn test_duplicate_registers_sibling() {
    let registry = three_level_registry();
    registry.write_view("layout", "buffered").unwrap();

    let copy = registry.duplicate("layout", "layout2").unwrap();
    assert_eq!(copy.id, "layout2");
    assert_eq!(copy.parent.as_deref(), Some("core"));
    assert!(copy.view_buffer.is_empty());
    assert_eq!(registry.len(), 4);

    // The copy answers like its source
    assert_eq!(registry.dispatch("layout2", "about").unwrap(), ActionOutcome::Handled(json!("layout")));
    assert_eq!(registry.dispatch("layout2", "help").unwrap(), ActionOutcome::Handled(json!("core help")));
}

// ==================== Delegation ====================

#[test]
fn test_dispatch_walks_multiple_levels() {
    let registry = three_level_registry();

    assert_eq!(registry.dispatch("blog", "about").unwrap(), ActionOutcome::Handled(json!("layout")));
    assert_eq!(registry.dispatch("blog", "help").unwrap(), ActionOutcome::Handled(json!("core help")));
    assert_eq!(registry.dispatch("blog", "missing").unwrap(), ActionOutcome::NotHandled);
}

#[test]
fn test_dispatch_handler_sees_module_and_action() {
    let registry = ModuleRegistry::new();
    registry
        .register(
            ModuleRecord::builder("core")
                .fallback_action(|module, action| ActionOutcome::Handled(json!(format!("{}:{}", module.id, action))))
                .build()
                .unwrap(),
        )
        .unwrap();
    registry
        .register(ModuleRecord::builder("child").parent("core").build().unwrap())
        .unwrap();

    // The parent's handler receives the parent record and the action as requested
    assert_eq!(registry.dispatch("child", "Edit").unwrap(), ActionOutcome::Handled(json!("core:Edit")));
}

#[test]
fn test_output_concatenates_buffers_across_levels() {
    let registry = three_level_registry();
    let mut store = MemoryViewStore::new();
    store.insert("/modules/core/page.php", "<core-page/>");

    registry.write_view("blog", "[blog]").unwrap();
    registry.write_view("layout", "[layout]").unwrap();

    let rendered = registry.output("blog", "page.php", &store).unwrap();
    assert_eq!(rendered, "[blog][layout]<core-page/>");
}

/// Test: a view no module has yields the collected partial output
#[test]
fn test_output_missing_everywhere() {
    let registry = three_level_registry();
    let store = MemoryViewStore::new();
    registry.write_view("blog", "[blog]").unwrap();
    registry.write_view("core", "[core]").unwrap();

    let rendered = registry.output("blog", "nowhere.php", &store).unwrap();
    assert_eq!(rendered, "[blog][core]");
}

#[test]
fn test_clear_view_resets_partial_output() {
    let registry = three_level_registry();
    let mut store = MemoryViewStore::new();
    store.insert("/modules/core/page.php", "P");

    registry.write_view("blog", "stale").unwrap();
    registry.clear_view("blog").unwrap();
    assert_eq!(registry.output("blog", "page.php", &store).unwrap(), "P");
}

#[test]
fn test_cycle_is_reported() {
    let registry = ModuleRegistry::new();
    registry.register(ModuleRecord::builder("a").parent("b").build().unwrap()).unwrap();
    registry.register(ModuleRecord::builder("b").parent("a").build().unwrap()).unwrap();

    let err = registry.dispatch("a", "index").unwrap_err();
    assert!(matches!(err, ModError::DelegationCycle { ref start, ref revisited } if start == "a" && revisited == "a"));

    // Lineage stops before repeating
    let lineage = DelegationChain::new(&registry).lineage("a").unwrap();
    assert_eq!(lineage, vec!["a", "b"]);
}

#[test]
fn test_depth_limit_from_config() {
    let registry = ModuleRegistry::with_config(RegistryConfig {
        max_delegation_depth: 2,
        ..RegistryConfig::default()
    });
    registry
        .register(ModuleRecord::builder("m0").respond("ping", json!("pong")).build().unwrap())
        .unwrap();
    for i in 1..=3 {
        registry
            .register(ModuleRecord::builder(format!("m{}", i)).parent(format!("m{}", i - 1)).build().unwrap())
            .unwrap();
    }

    assert_eq!(registry.dispatch("m2", "ping").unwrap(), ActionOutcome::Handled(json!("pong")));
    assert!(matches!(
        registry.dispatch("m3", "ping"),
        Err(ModError::DelegationDepthExceeded { limit: 2, .. })
    ));
}

// ==================== Concurrency ====================

#[test]
fn test_concurrent_dispatch_and_register() {
    let registry = Arc::new(three_level_registry());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                registry.register(module(&format!("extra{}", i), "1.0.0")).unwrap();
                registry.write_view("blog", "x").unwrap();
                registry.dispatch("blog", "help").unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().into_value(), Some(Value::from("core help")));
    }
    assert_eq!(registry.len(), 11);
    assert_eq!(registry.get("blog").unwrap().view_buffer, "x".repeat(8));
}
