//! Catalog loading from disk
//!
//! - Fallback paths: the first candidate that exists and parses wins
//! - Missing or malformed documents degrade to empty sections
//! - Config files and the catalog's own `Config` section

use randomancer_core::catalog::{load_catalog, CatalogCache, CatalogPaths, FsSource};
use randomancer_core::config::{CohesionMode, RandomizerConfig};
use randomancer_core::session::Session;
use randomancer_core::RandomancerError;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;

fn write(dir: &Path, rel: &str, body: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, body).unwrap();
}

fn core_doc() -> String {
    json!({
        "Version": "0.8.0",
        "Classes": {"Ranger": {"attributes": {"dexterity": 1}, "ascendancies": ["Deadeye"]}},
        "Weapons": {"Two-Handed": [{"name": "Bow", "attributes": {"dexterity": 1}}], "One-Handed": [], "Off-Hand": []},
        "Defense": [{"name": "Evasion", "attributes": {"dexterity": 1}}],
        "DefensiveStrategies": [{"name": "Deflection", "tags": ["deflection"]}],
        "Tactics": [{"name": "Projectiles", "tags": ["projectile"]}],
        "Ailments": [{"name": "Poison", "tags": ["poison"]}]
    })
    .to_string()
}

#[test]
fn gem_document_falls_back_to_secondary_path() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "data_0.8.0.json", &core_doc());
    write(
        dir.path(),
        "gems.json",
        &json!({"SkillGems": {
            "arrow": {"base_item": {"display_name": "Toxic Arrow"}, "tags": ["Projectile"], "crafting_types": ["Bow"]}
        }})
        .to_string(),
    );

    let source = FsSource::new(dir.path());
    let mut cache = CatalogCache::new();
    let catalog = load_catalog(&source, &mut cache, &CatalogPaths::default());
    assert_eq!(catalog.gems.len(), 1);
    assert_eq!(catalog.gems.entries()[0].name, "Toxic Arrow");
    assert!(catalog.uniques.is_empty());

    let mut session = Session::new(Arc::new(catalog), 4);
    let result = session.roll().unwrap();
    assert!(result.success);
    assert_eq!(result.recommendations.gems[0].name, "Toxic Arrow");
}

#[test]
fn malformed_documents_degrade_to_empty() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "data_0.8.0.json", &core_doc());
    write(dir.path(), "data/skill_gems.json", "{ not json");
    write(dir.path(), "uniques_enriched_0.8.0.json", "[1, 2, {\"slot\": \"ring\"}]");

    let source = FsSource::new(dir.path());
    let mut cache = CatalogCache::new();
    let catalog = load_catalog(&source, &mut cache, &CatalogPaths::default());
    assert!(catalog.gems.is_empty());
    assert!(catalog.uniques.is_empty());
    assert_eq!(catalog.core.classes.len(), 1);

    let checks = catalog.self_test();
    let gems_check = checks.iter().find(|c| c.name == "gems loaded").unwrap();
    assert!(!gems_check.pass);

    // rolling still works, just without gem picks
    let mut session = Session::new(Arc::new(catalog), 8);
    let result = session.roll().unwrap();
    assert!(result.recommendations.gems.is_empty());
}

#[test]
fn empty_directory_cannot_roll() {
    let dir = tempfile::tempdir().unwrap();
    let source = FsSource::new(dir.path());
    let mut cache = CatalogCache::new();
    let catalog = load_catalog(&source, &mut cache, &CatalogPaths::default());
    assert!(catalog.self_test().iter().all(|c| !c.pass));

    let mut session = Session::new(Arc::new(catalog), 1);
    let err = session.roll().unwrap_err();
    assert!(matches!(err, RandomancerError::EmptyPool { slot: "class" }));
}

#[test]
fn try_load_reports_every_candidate() {
    let dir = tempfile::tempdir().unwrap();
    let source = FsSource::new(dir.path());
    let mut cache = CatalogCache::new();
    let paths = vec!["a.json".to_string(), "b.json".to_string()];
    match cache.try_load(&source, &paths) {
        Err(RandomancerError::Fetch { paths: tried }) => assert_eq!(tried, paths),
        other => panic!("expected fetch error, got {other:?}"),
    }
    assert_eq!(cache.load_or_empty(&source, &paths), json!({}));
}

#[test]
fn catalog_config_section_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    let mut doc: serde_json::Value = serde_json::from_str(&core_doc()).unwrap();
    // Deflection with Energy Shield only: legal once the rule is off
    doc["Defense"] = json!([{"name": "Energy Shield"}]);
    doc["Config"] = json!({"rules": {"enableDeflectionDefenseRule": false}});
    write(dir.path(), "data_0.8.0.json", &doc.to_string());

    let source = FsSource::new(dir.path());
    let mut cache = CatalogCache::new();
    let catalog = load_catalog(&source, &mut cache, &CatalogPaths::default());
    let mut session = Session::new(Arc::new(catalog), 2);
    assert!(!session.config().rules.enable_deflection_defense_rule);
    let result = session.roll().unwrap();
    assert!(result.success);
    assert_eq!(result.context.defense_strategy.name, "Deflection");
}

#[test]
fn config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "randomancer.json",
        &json!({
            "synergy": {"useNewScorer": false, "tunables": {"strict": {"alpha": 5.0, "beta": -1.0, "noise": 0.0}}},
            "rules": {"maxAttempts": 3}
        })
        .to_string(),
    );
    let config = RandomizerConfig::from_file(dir.path().join("randomancer.json")).unwrap();
    assert!(!config.synergy.use_new_scorer);
    assert_eq!(config.rules.max_attempts, 3);
    // out-of-range tunables are clamped
    let strict = config.synergy.tunables_for(CohesionMode::Strict);
    assert_eq!(strict.alpha, 2.0);
    assert_eq!(strict.beta, 0.0);
    // untouched sections keep their defaults
    assert_eq!(config.rules.minions_requires_weapon, vec!["Sceptre".to_string()]);

    let missing = RandomizerConfig::from_file(dir.path().join("absent.json"));
    assert!(matches!(missing, Err(RandomancerError::NotFound(_))));
}
