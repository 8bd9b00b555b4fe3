//! Integration tests for loading module trees from disk
//!
//! Tests the loader end to end:
//! - Descriptor discovery and registration order
//! - Requirement forms (named, positional, unparseable)
//! - Views rendered from module directories through `FsViewStore`
//! - Configuration files and manifest emission

use modchain_core::module::MANIFEST_FILE;
use modchain_core::{
    ActionOutcome, FsViewStore, ModError, ModuleLoader, ModuleStatus, PackageManifest, RegistryConfig, ViewStore,
    DESCRIPTOR_FILE,
};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ==================== Test Helper Functions ====================

/// Create a module directory with a descriptor and optional view files
fn create_module(root: &Path, dir: &str, descriptor: &str, views: &[(&str, &str)]) -> PathBuf {
    let module_dir = root.join(dir);
    fs::create_dir_all(&module_dir).unwrap();
    fs::write(module_dir.join(DESCRIPTOR_FILE), descriptor).unwrap();
    for (name, content) in views {
        let path = module_dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
    module_dir
}

/// A small site: `core` <- `theme` <- `shop`
fn create_site(root: &Path) {
    create_module(
        root,
        "core",
        r#"
name: Core
version: 1.2.0
author: Core Team
actions:
  about: "core about"
  help: "core help"
"#,
        &[("views/layout.php", "<core-layout/>"), ("views/footer.php", "<core-footer/>")],
    );
    create_module(
        root,
        "theme",
        r#"
name: Theme
version: "0.3"
parent: core
requires:
  - core: ">=1.0"
actions:
  about: "theme about"
"#,
        &[("views/layout.php", "<theme-layout/>")],
    );
    create_module(
        root,
        "shop",
        r#"
name: Acme\Shop
id: shop
version: 2.0.0
parent: theme
requires:
  - core
  - theme: "<1.0"
options:
  currency: EUR
  author: Shop Team
"#,
        &[],
    );
}

// ==================== Loading ====================

#[test]
fn test_load_site() {
    let temp = TempDir::new().unwrap();
    create_site(temp.path());

    let (registry, reports) = ModuleLoader::new(temp.path()).load(RegistryConfig::default()).unwrap();

    assert_eq!(reports.len(), 3);
    assert!(reports.iter().all(|r| r.is_ok()), "reports: {:?}", reports);
    for module in registry.list() {
        assert_eq!(module.status, ModuleStatus::Initialized);
    }

    let shop = registry.get("shop").unwrap();
    assert_eq!(shop.name, "Acme\\Shop");
    assert_eq!(shop.author, "Shop Team");
    assert_eq!(shop.option("currency"), Some(&json!("EUR")));
    assert_eq!(shop.path.as_deref(), Some(temp.path().join("shop").as_path()));
}

#[test]
fn test_failed_module_does_not_abort_load() {
    let temp = TempDir::new().unwrap();
    create_site(temp.path());
    create_module(temp.path(), "reports", "name: reports\nrequires:\n  - analytics\n", &[]);

    let (registry, reports) = ModuleLoader::new(temp.path()).load(RegistryConfig::default()).unwrap();

    let failed: Vec<_> = reports.iter().filter(|r| !r.is_ok()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].id, "reports");
    assert!(matches!(
        &failed[0].error,
        Some(ModError::ModuleNotFound { requiring, required }) if requiring == "reports" && required == "analytics"
    ));
    assert_eq!(registry.get("reports").unwrap().status, ModuleStatus::Failed);
    assert_eq!(registry.get("shop").unwrap().status, ModuleStatus::Initialized);
}

#[test]
fn test_unparseable_requirement_permissive_and_strict() {
    let temp = TempDir::new().unwrap();
    create_site(temp.path());
    create_module(temp.path(), "legacy", "name: legacy\nrequires:\n  - core: \">=latest-and-greatest!\"\n", &[]);

    let (_, reports) = ModuleLoader::new(temp.path()).load(RegistryConfig::default()).unwrap();
    assert!(reports.iter().all(|r| r.is_ok()));

    let strict = RegistryConfig { strict_requirements: true, ..RegistryConfig::default() };
    let (_, reports) = ModuleLoader::new(temp.path()).load(strict).unwrap();
    let legacy = reports.iter().find(|r| r.id == "legacy").unwrap();
    assert!(matches!(legacy.error, Some(ModError::MalformedRequirement { .. })));
}

#[test]
fn test_config_file_drives_load() {
    let temp = TempDir::new().unwrap();
    create_site(temp.path().join("modules").as_path());

    let config_path = temp.path().join("modchain.yaml");
    fs::write(&config_path, "rejectDuplicates: true\nmaxDelegationDepth: 1\n").unwrap();
    let config = RegistryConfig::load(&config_path).unwrap();

    let (registry, _) = ModuleLoader::new(temp.path().join("modules")).load(config).unwrap();

    // shop -> theme is one hop; shop -> theme -> core is two
    assert_eq!(registry.dispatch("shop", "about").unwrap(), ActionOutcome::Handled(json!("theme about")));
    assert!(matches!(
        registry.dispatch("shop", "help"),
        Err(ModError::DelegationDepthExceeded { limit: 1, .. })
    ));
}

#[test]
fn test_duplicate_ids_rejected_when_configured() {
    let temp = TempDir::new().unwrap();
    create_module(temp.path(), "a", "name: core\n", &[]);
    create_module(temp.path(), "b", "name: CORE\n", &[]);

    let config = RegistryConfig { reject_duplicates: true, ..RegistryConfig::default() };
    let result = ModuleLoader::new(temp.path()).load(config);
    assert!(matches!(result, Err(ModError::DuplicateModule(_))));

    // Default: the later descriptor replaces the earlier one
    let (registry, _) = ModuleLoader::new(temp.path()).load(RegistryConfig::default()).unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("core").unwrap().name, "CORE");
}

// ==================== Dispatch and Views ====================

#[test]
fn test_dispatch_through_loaded_chain() {
    let temp = TempDir::new().unwrap();
    create_site(temp.path());
    let (registry, _) = ModuleLoader::new(temp.path()).load(RegistryConfig::default()).unwrap();

    assert_eq!(registry.dispatch("shop", "about").unwrap(), ActionOutcome::Handled(json!("theme about")));
    assert_eq!(registry.dispatch("shop", "HELP").unwrap(), ActionOutcome::Handled(json!("core help")));
    assert_eq!(registry.dispatch("shop", "checkout").unwrap(), ActionOutcome::NotHandled);
}

#[test]
fn test_render_views_from_disk() {
    let temp = TempDir::new().unwrap();
    create_site(temp.path());
    let (registry, _) = ModuleLoader::new(temp.path()).load(RegistryConfig::default()).unwrap();
    let store = FsViewStore::new();

    // theme overrides layout; shop has no views of its own
    assert_eq!(registry.output("shop", "views/layout.php", &store).unwrap(), "<theme-layout/>");
    // footer only exists in core
    registry.write_view("shop", "<cart/>").unwrap();
    assert_eq!(registry.output("shop", "/views/footer.php", &store).unwrap(), "<cart/><core-footer/>");
}

#[test]
fn test_bundled_views_shadow_disk() {
    let temp = TempDir::new().unwrap();
    let theme_dir = temp.path().join("theme");
    create_site(temp.path());
    let (registry, _) = ModuleLoader::new(temp.path()).load(RegistryConfig::default()).unwrap();

    let mut store = FsViewStore::new();
    store.bundle(theme_dir.join("views/footer.php"), "<bundled-footer/>");
    assert!(store.exists(&theme_dir.join("views/footer.php")));

    assert_eq!(registry.output("shop", "views/footer.php", &store).unwrap(), "<bundled-footer/>");
}

// ==================== Manifests ====================

#[test]
fn test_manifest_contents() {
    let temp = TempDir::new().unwrap();
    create_site(temp.path());

    let config = RegistryConfig { emit_manifests: true, ..RegistryConfig::default() };
    ModuleLoader::new(temp.path()).load(config).unwrap();

    let content = fs::read_to_string(temp.path().join("shop").join(MANIFEST_FILE)).unwrap();
    let manifest: PackageManifest = serde_json::from_str(&content).unwrap();
    assert_eq!(manifest.name, "Acme/Shop");
    assert_eq!(manifest.version, "2.0.0");
    assert_eq!(manifest.require.get("core"), Some("*.*.*"));
    assert_eq!(manifest.require.get("theme"), Some("<1.0"));
    // Declaration order survives the round trip through disk
    assert_eq!(manifest.require.modules().collect::<Vec<_>>(), vec!["core", "theme"]);
    assert!(content.contains(r#""require":{"core":"*.*.*","theme":"<1.0"}"#));

    // Manifests are emitted from the descriptor, before init options apply
    assert_eq!(manifest.author, "");
}

#[test]
fn test_manifest_rewritten_after_change() {
    let temp = TempDir::new().unwrap();
    let dir = create_module(temp.path(), "core", "name: core\nversion: 1.0.0\n", &[]);
    let config = RegistryConfig { emit_manifests: true, ..RegistryConfig::default() };

    ModuleLoader::new(temp.path()).load(config.clone()).unwrap();
    fs::write(dir.join(DESCRIPTOR_FILE), "name: core\nversion: 1.0.1\n").unwrap();
    let (_, reports) = ModuleLoader::new(temp.path()).load(config).unwrap();

    assert_eq!(reports[0].manifest, Some(modchain_core::ManifestStatus::Written));
    let content = fs::read_to_string(dir.join(MANIFEST_FILE)).unwrap();
    assert!(content.contains("\"version\":\"1.0.1\""));
}
