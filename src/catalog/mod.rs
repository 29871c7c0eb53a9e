//! Static catalog data.
//!
//! The core document holds classes, weapon pools, defenses, defensive
//! strategies, tactics and ailments. Gems and uniques come from separate
//! documents. All of it is loaded once and treated as immutable; rolls clone
//! the entities they pick.
//!
//! Loading is lenient: a missing or malformed section is logged as a data
//! integrity problem and read as empty, so the rest of the pipeline keeps
//! working with partial data.

pub mod gems;
pub mod loader;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use crate::attributes::Attributes;
use crate::error::RandomancerError;

pub use gems::{Gem, GemCatalog, GemKind, GrantedSkill};
pub use loader::{load_catalog, CatalogCache, CatalogPaths, CatalogSource, FsSource, MemorySource};

/// Top-level keys every core document must carry
pub const REQUIRED_CORE_KEYS: [&str; 7] = [
    "Version",
    "Classes",
    "Weapons",
    "Defense",
    "Ailments",
    "Tactics",
    "DefensiveStrategies",
];

/// Weapon, offhand, defense, strategy, tactic or ailment entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlottedItem {
    pub name: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SlottedItem {
    pub fn new(name: &str, attributes: Attributes, tags: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            attributes,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Case-insensitive name comparison
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// A playable class with its base attributes and ascendancies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub ascendancies: Vec<String>,
}

/// Weapon pools as laid out in the core document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeaponPools {
    #[serde(rename = "Two-Handed", default)]
    pub two_handed: Vec<SlottedItem>,
    #[serde(rename = "One-Handed", default)]
    pub one_handed: Vec<SlottedItem>,
    #[serde(rename = "Off-Hand", default)]
    pub off_hand: Vec<SlottedItem>,
}

impl WeaponPools {
    /// Main-hand candidates: two-handed first, then one-handed
    pub fn main_hand(&self) -> impl Iterator<Item = &SlottedItem> {
        self.two_handed.iter().chain(self.one_handed.iter())
    }
}

/// The core catalog document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoreCatalog {
    #[serde(rename = "Version", default)]
    pub version: Value,
    #[serde(rename = "Classes", default)]
    pub classes: BTreeMap<String, ClassDef>,
    #[serde(rename = "Weapons", default)]
    pub weapons: WeaponPools,
    #[serde(rename = "Defense", default)]
    pub defense: Vec<SlottedItem>,
    #[serde(rename = "DefensiveStrategies", default)]
    pub defensive_strategies: Vec<SlottedItem>,
    #[serde(rename = "Tactics", default)]
    pub tactics: Vec<SlottedItem>,
    #[serde(rename = "Ailments", default)]
    pub ailments: Vec<SlottedItem>,
    /// Optional `Config` section merged over the default rule/synergy config
    #[serde(rename = "Config", default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    /// Required top-level keys the source document lacked
    #[serde(skip)]
    pub missing_keys: Vec<String>,
}

/// Which required top-level keys are absent from a core document
pub fn missing_core_keys(doc: &Value) -> Vec<&'static str> {
    REQUIRED_CORE_KEYS
        .iter()
        .copied()
        .filter(|key| doc.get(key).is_none())
        .collect()
}

fn section<T: DeserializeOwned + Default>(doc: &Value, key: &str) -> T {
    let Some(raw) = doc.get(key) else {
        return T::default();
    };
    match serde_json::from_value(raw.clone()) {
        Ok(v) => v,
        Err(e) => {
            let err = RandomancerError::DataIntegrity {
                section: key.to_string(),
            };
            warn!(section = key, error = %e, "{err}; treating section as empty");
            T::default()
        }
    }
}

impl CoreCatalog {
    /// Build from a parsed document, degrading missing or malformed sections to empty
    pub fn from_document(doc: &Value) -> Self {
        let missing = missing_core_keys(doc);
        if !missing.is_empty() {
            warn!(missing = ?missing, "core catalog is missing required keys");
        }
        Self {
            version: doc.get("Version").cloned().unwrap_or(Value::Null),
            classes: section(doc, "Classes"),
            weapons: section(doc, "Weapons"),
            defense: section(doc, "Defense"),
            defensive_strategies: section(doc, "DefensiveStrategies"),
            tactics: section(doc, "Tactics"),
            ailments: section(doc, "Ailments"),
            config: doc.get("Config").cloned(),
            missing_keys: missing.into_iter().map(str::to_string).collect(),
        }
    }

    /// Every named entity in the tactic, ailment and strategy pools
    pub fn find_named(&self, name: &str) -> Option<&SlottedItem> {
        self.tactics
            .iter()
            .chain(self.ailments.iter())
            .chain(self.defensive_strategies.iter())
            .find(|item| item.is_named(name))
    }
}

/// Tags attached to a unique item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniqueTags {
    #[serde(default)]
    pub raw: Vec<String>,
    #[serde(default)]
    pub canonical: Vec<String>,
}

/// Unique item from the enriched uniques document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniqueItem {
    pub name: String,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub slot: String,
    /// Display lines; the first two are the name and base type
    #[serde(default)]
    pub lines: Vec<String>,
    #[serde(default)]
    pub tags: UniqueTags,
}

/// Parse a uniques document: either a bare array or `{ "items": [...] }`.
/// Malformed entries are skipped.
pub fn parse_uniques(doc: &Value) -> Vec<UniqueItem> {
    let entries = match doc {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => match map.get("items") {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        },
        _ => &[],
    };
    entries
        .iter()
        .filter_map(|entry| match serde_json::from_value(entry.clone()) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(error = %e, "skipping malformed unique item");
                None
            }
        })
        .collect()
}

/// Everything a session needs, loaded once
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub core: CoreCatalog,
    pub gems: GemCatalog,
    pub uniques: Vec<UniqueItem>,
}

/// One named self-test check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelfCheck {
    pub name: &'static str,
    pub pass: bool,
}

impl Catalog {
    /// Quick health report of the loaded data
    pub fn self_test(&self) -> Vec<SelfCheck> {
        let core = &self.core;
        vec![
            SelfCheck {
                name: "core schema",
                pass: core.missing_keys.is_empty(),
            },
            SelfCheck {
                name: "classes populated",
                pass: !core.classes.is_empty(),
            },
            SelfCheck {
                name: "weapons present",
                pass: core.weapons.main_hand().next().is_some(),
            },
            SelfCheck {
                name: "defenses present",
                pass: !core.defense.is_empty() && !core.defensive_strategies.is_empty(),
            },
            SelfCheck {
                name: "tactics and ailments present",
                pass: !core.tactics.is_empty() && !core.ailments.is_empty(),
            },
            SelfCheck {
                name: "gems loaded",
                pass: !self.gems.is_empty(),
            },
        ]
    }
}
