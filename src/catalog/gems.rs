//! Skill gem enrichment, dictionary lookup and weapon compatibility.
//!
//! Raw gem documents come in three shapes (a bare array, `{SkillGems: {..}}`
//! or an id-keyed object) with inconsistent field names, so entries are read
//! field by field from `serde_json::Value` rather than through a strict
//! derive. Granted skills are resolved against a separate skills document.

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

use crate::attributes::Attributes;
use crate::tags::{extract_bracket_tags, normalize, normalize_ordered};

static DEV_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\bDNT\b|\bUNUSED\b|Coming\s*Soon)").expect("static placeholder pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GemKind {
    Active,
    Support,
}

/// Skill granted by a gem, resolved from the skills document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrantedSkill {
    pub id: String,
    pub display_name: String,
    pub description: String,
}

/// An enriched gem
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gem {
    pub id: String,
    pub name: String,
    pub base_item_id: Option<String>,
    pub skill_name: Option<String>,
    pub support_name: Option<String>,
    pub kind: GemKind,
    /// Normalized tags: base tags, first granted skill's types, bracket tags
    pub tags: Vec<String>,
    /// Bracket tags found in granted skill descriptions
    pub bracket_tags: Vec<String>,
    pub requirement_weights: Attributes,
    /// Lowercased crafting types
    pub required_weapon_types: Vec<String>,
    pub description: String,
    pub support_text: String,
    /// "Requires Bow or Crossbow", empty when there is no requirement
    pub requirement_text: String,
    pub granted_skills: Vec<GrantedSkill>,
    pub recommended_supports: Vec<String>,
}

impl Gem {
    /// Active, weapon-typed and not a placeholder
    pub fn is_recommendable(&self) -> bool {
        self.kind == GemKind::Active
            && !self.required_weapon_types.is_empty()
            && !is_dev_placeholder(&self.name)
    }

    /// Whether the gem can be used with the rolled weapon and offhand names
    /// (lowercased).
    pub fn is_weapon_compatible(&self, rolled_types: &[String]) -> bool {
        let req = &self.required_weapon_types;
        if req.is_empty() {
            return true;
        }
        let has = |needle: &str| rolled_types.iter().any(|t| t == needle);
        let requires = |needle: &str| req.iter().any(|r| r == needle);

        if (requires("occult") || requires("elemental")) && has("sceptre") {
            return true;
        }
        if requires("elemental") && (has("wand") || has("staff")) {
            return true;
        }
        if requires("mace") && rolled_types.iter().any(|t| t.contains("mace")) {
            return true;
        }
        req.iter().any(|r| has(r))
    }

    /// First granted skill, if any
    pub fn primary_grant(&self) -> Option<&GrantedSkill> {
        self.granted_skills.first()
    }
}

pub fn is_dev_placeholder(name: &str) -> bool {
    DEV_PLACEHOLDER.is_match(name)
}

/// Flatten any of the accepted gem document shapes into entry objects
pub fn flatten_gems(doc: &Value) -> Vec<Map<String, Value>> {
    match doc {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_object().cloned())
            .collect(),
        Value::Object(map) => {
            if let Some(Value::Object(inner)) = map.get("SkillGems") {
                return inner.values().filter_map(|v| v.as_object().cloned()).collect();
            }
            map.iter()
                .filter_map(|(key, val)| {
                    let mut entry = val.as_object()?.clone();
                    entry
                        .entry("id".to_string())
                        .or_insert_with(|| Value::String(key.clone()));
                    Some(entry)
                })
                .collect()
        }
        _ => Vec::new(),
    }
}

fn text(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_list(map: &Map<String, Value>, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// "Requires Bow or Crossbow"
pub fn requirement_text(types: &[String]) -> String {
    if types.is_empty() {
        return String::new();
    }
    let names: Vec<String> = types.iter().map(|t| capitalize(t)).collect();
    format!("Requires {}", names.join(" or "))
}

fn granted_skills(entry: &Map<String, Value>, skills: &Value) -> (Vec<GrantedSkill>, Vec<String>) {
    let mut granted = Vec::new();
    let mut first_types = None;
    for gid in text_list(entry, "grants_skills") {
        let Some(active) = skills.get(&gid).and_then(|s| s.get("active_skill")) else {
            continue;
        };
        let Some(active) = active.as_object() else {
            continue;
        };
        if first_types.is_none() {
            first_types = Some(text_list(active, "types"));
        }
        granted.push(GrantedSkill {
            id: gid,
            display_name: text(active, "display_name").unwrap_or_default(),
            description: text(active, "description").unwrap_or_default(),
        });
    }
    (granted, first_types.unwrap_or_default())
}

/// Normalize one raw entry. Returns `None` only when no display name can be
/// resolved at all.
fn normalize_entry(entry: &Map<String, Value>, skills: &Value) -> Option<Gem> {
    let base_item = entry.get("base_item").and_then(Value::as_object);
    let base_item_id = base_item.and_then(|b| text(b, "id"));
    let base_display = base_item.and_then(|b| text(b, "display_name"));
    let skill_name = text(entry, "skill_name");
    let support_name = text(entry, "support_name");

    let name = text(entry, "name")
        .or_else(|| base_display.clone())
        .or_else(|| skill_name.clone())
        .or_else(|| support_name.clone())?;
    let id = text(entry, "id")
        .or_else(|| base_item_id.clone())
        .or_else(|| base_display.clone())
        .unwrap_or_else(|| name.clone());

    let support_text = text(entry, "support_text").unwrap_or_default();
    let kind_text = text(entry, "type")
        .or_else(|| text(entry, "gem_type"))
        .unwrap_or_else(|| {
            if support_text.is_empty() {
                "active".to_string()
            } else {
                "support".to_string()
            }
        })
        .to_lowercase();
    let kind = if kind_text == "support" {
        GemKind::Support
    } else {
        GemKind::Active
    };

    let required_weapon_types: Vec<String> = text_list(entry, "crafting_types")
        .iter()
        .map(|t| t.to_lowercase())
        .collect();

    let (granted, skill_types) = granted_skills(entry, skills);
    let mut bracket_tags: Vec<String> = Vec::new();
    for skill in &granted {
        for tag in extract_bracket_tags(&skill.description) {
            if !bracket_tags.contains(&tag) {
                bracket_tags.push(tag);
            }
        }
    }

    let gem_description = text(entry, "description").unwrap_or_else(|| support_text.clone());
    let grant_description = granted
        .iter()
        .map(|g| g.description.as_str())
        .find(|d| !d.is_empty())
        .unwrap_or("");
    let description = [gem_description.as_str(), grant_description]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ");

    let tags = normalize_ordered(
        text_list(entry, "tags")
            .iter()
            .chain(skill_types.iter())
            .chain(extract_bracket_tags(&description).iter())
            .chain(bracket_tags.iter()),
    );

    let requirement_weights = entry
        .get("requirement_weights")
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default();

    Some(Gem {
        id,
        name,
        base_item_id,
        skill_name,
        support_name,
        kind,
        tags,
        bracket_tags,
        requirement_weights,
        requirement_text: requirement_text(&required_weapon_types),
        required_weapon_types,
        description,
        support_text,
        granted_skills: granted,
        recommended_supports: text_list(entry, "recommended_supports"),
    })
}

/// Enriched gems plus a name/id dictionary over every entry
#[derive(Debug, Clone, Default)]
pub struct GemCatalog {
    entries: Vec<Gem>,
    dictionary: HashMap<String, usize>,
}

impl GemCatalog {
    /// Enrich a raw gem document against a skills document.
    ///
    /// Every entry with a resolvable name goes into the lookup dictionary so
    /// support gems resolve. The name comes from `name`, then the base item
    /// display name, then the skill or support name. Only active entries with
    /// at least one crafting type are candidates for recommendation.
    /// Placeholder entries are dropped.
    pub fn enrich(gems_doc: &Value, skills_doc: &Value) -> Self {
        let raw = flatten_gems(gems_doc);
        let mut entries = Vec::with_capacity(raw.len());
        let mut skipped = 0usize;
        for entry in &raw {
            match normalize_entry(entry, skills_doc) {
                Some(gem) if !is_dev_placeholder(&gem.name) => entries.push(gem),
                _ => skipped += 1,
            }
        }
        let catalog = Self::from_gems(entries);
        debug!(
            entries = catalog.entries.len(),
            recommendable = catalog.recommendable().count(),
            skipped,
            "gem enrichment complete"
        );
        catalog
    }

    pub fn from_gems(entries: Vec<Gem>) -> Self {
        let mut dictionary = HashMap::new();
        for (idx, gem) in entries.iter().enumerate() {
            let mut put = |key: String| {
                if !key.is_empty() {
                    dictionary.entry(key).or_insert(idx);
                }
            };
            put(gem.id.clone());
            if let Some(base) = &gem.base_item_id {
                put(base.clone());
            }
            put(gem.name.clone());
            put(gem.name.to_lowercase());
            put(normalize(&gem.name));
            if let Some(skill) = &gem.skill_name {
                put(skill.to_lowercase());
            }
            if let Some(support) = &gem.support_name {
                put(support.to_lowercase());
            }
        }
        Self {
            entries,
            dictionary,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Gem] {
        &self.entries
    }

    /// Active, typed, non-placeholder gems
    pub fn recommendable(&self) -> impl Iterator<Item = &Gem> {
        self.entries.iter().filter(|g| g.is_recommendable())
    }

    /// Resolve a support or gem reference: id, name, path or slug
    pub fn lookup(&self, reference: &str) -> Option<&Gem> {
        let key = reference.trim();
        if key.is_empty() {
            return None;
        }
        let lower = key.to_lowercase();
        let normalized = normalize(key);
        let last = lower.rsplit('/').next().unwrap_or(&lower).to_string();
        let last_sanitized: String = last
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            .collect();

        let tries = [key.to_string(), lower, normalized.clone(), last, last_sanitized.clone()];
        if let Some(idx) = tries.iter().find_map(|k| self.dictionary.get(k)) {
            return self.entries.get(*idx);
        }
        self.entries.iter().find(|g| {
            let n = normalize(&g.name);
            n == normalized || n == last_sanitized
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn skills_doc() -> Value {
        json!({
            "SkillFireball": {
                "active_skill": {
                    "display_name": "Fireball",
                    "description": "Launches a [Fire|Projectile] orb that can [Ignite].",
                    "types": ["Spell", "Projectile", "Area"]
                }
            }
        })
    }

    fn gems_doc() -> Value {
        json!({
            "Metadata/Items/Gems/SkillGemFireball": {
                "base_item": {"id": "Metadata/Items/Gems/SkillGemFireball", "display_name": "Fireball"},
                "tags": ["Fire", "Spell"],
                "crafting_types": ["Wand", "Staff"],
                "grants_skills": ["SkillFireball"],
                "requirement_weights": {"intelligence": 100},
                "recommended_supports": ["Metadata/Items/Gems/SupportGemFirePenetration"]
            },
            "Metadata/Items/Gems/SupportGemFirePenetration": {
                "base_item": {"id": "Metadata/Items/Gems/SupportGemFirePenetration", "display_name": "Fire Penetration"},
                "support_text": "Supported skills penetrate fire resistance.",
                "requirement_weights": {"intelligence": 100}
            },
            "Metadata/Items/Gems/DNTThing": {
                "base_item": {"display_name": "[DNT] Thing"},
                "crafting_types": ["Bow"]
            }
        })
    }

    #[test]
    fn test_flatten_shapes() {
        assert_eq!(flatten_gems(&json!([{"name": "a"}, 3])).len(), 1);
        assert_eq!(flatten_gems(&json!({"SkillGems": {"x": {"name": "a"}}})).len(), 1);
        let keyed = flatten_gems(&json!({"gem_a": {"name": "a"}}));
        assert_eq!(keyed[0]["id"], "gem_a");
    }

    #[test]
    fn test_enrichment_merges_tags_and_grants() {
        let catalog = GemCatalog::enrich(&gems_doc(), &skills_doc());
        let fireball = catalog.lookup("Fireball").unwrap();
        assert_eq!(fireball.kind, GemKind::Active);
        assert_eq!(fireball.required_weapon_types, vec!["wand", "staff"]);
        assert_eq!(fireball.requirement_text, "Requires Wand or Staff");
        assert_eq!(fireball.granted_skills[0].display_name, "Fireball");
        assert_eq!(fireball.bracket_tags, vec!["fire", "projectile", "ignite"]);
        for t in ["fire", "spell", "projectile", "area", "ignite"] {
            assert!(fireball.tags.contains(&t.to_string()), "missing {t}");
        }
        assert!(fireball.description.contains("Launches"));
    }

    #[test]
    fn test_placeholders_and_supports() {
        let catalog = GemCatalog::enrich(&gems_doc(), &skills_doc());
        assert_eq!(catalog.len(), 2);
        assert!(catalog.lookup("[DNT] Thing").is_none());

        let recommendable: Vec<_> = catalog.recommendable().map(|g| g.name.as_str()).collect();
        assert_eq!(recommendable, vec!["Fireball"]);

        let support = catalog
            .lookup("Metadata/Items/Gems/SupportGemFirePenetration")
            .unwrap();
        assert_eq!(support.kind, GemKind::Support);
        assert_eq!(support.name, "Fire Penetration");
    }

    #[test]
    fn test_name_resolves_without_base_item() {
        let doc = json!([{"skill_name": "Rain of Arrows", "crafting_types": ["Bow"]}]);
        let catalog = GemCatalog::enrich(&doc, &json!({}));
        let recommendable: Vec<_> = catalog.recommendable().map(|g| g.name.as_str()).collect();
        assert_eq!(recommendable, vec!["Rain of Arrows"]);
        assert!(catalog.entries()[0].base_item_id.is_none());
    }

    #[test]
    fn test_lookup_variants() {
        let catalog = GemCatalog::enrich(&gems_doc(), &skills_doc());
        assert!(catalog.lookup("fire penetration").is_some());
        assert!(catalog.lookup("FirePenetration").is_some());
        assert!(catalog.lookup("  ").is_none());
        assert!(catalog.lookup("Unknown Gem").is_none());
    }

    #[test]
    fn test_weapon_compatibility() {
        let catalog = GemCatalog::enrich(&gems_doc(), &skills_doc());
        let mut gem = catalog.lookup("Fireball").unwrap().clone();
        assert!(gem.is_weapon_compatible(&["staff".to_string()]));
        assert!(!gem.is_weapon_compatible(&["bow".to_string()]));

        gem.required_weapon_types = vec!["elemental".into()];
        assert!(gem.is_weapon_compatible(&["wand".to_string()]));
        assert!(gem.is_weapon_compatible(&["sceptre".to_string()]));

        gem.required_weapon_types = vec!["occult".into()];
        assert!(gem.is_weapon_compatible(&["bow".to_string(), "sceptre".to_string()]));
        assert!(!gem.is_weapon_compatible(&["wand".to_string()]));

        gem.required_weapon_types = vec!["mace".into()];
        assert!(gem.is_weapon_compatible(&["one-handed mace".to_string()]));

        gem.required_weapon_types.clear();
        assert!(gem.is_weapon_compatible(&[]));
    }

    #[test]
    fn test_placeholder_pattern() {
        assert!(is_dev_placeholder("[DNT] Something"));
        assert!(is_dev_placeholder("unused gem"));
        assert!(is_dev_placeholder("Coming  Soon"));
        assert!(!is_dev_placeholder("Undying Rage"));
    }
}
