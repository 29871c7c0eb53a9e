//! Tag normalization.
//!
//! Free-text tags and names from the catalogs ("Damage over Time",
//! "Armor Break", "slow/maim/hinder") are canonicalized into comparable
//! tokens: lowercase, alphanumeric only, with a small alias table folding
//! synonyms and US spellings together. `normalize` is idempotent.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Alias table applied after stripping. Targets must not themselves be keys.
const TAG_ALIASES: &[(&str, &str)] = &[
    ("critical", "crit"),
    ("damageovertime", "dot"),
    ("marks", "mark"),
    ("armorbreak", "armourbreak"),
];

/// Fused composite tags that expand to several atomic tags
const FUSED_COMPOSITES: &[(&str, &[&str])] = &[("slowmaimhinder", &["slow", "maim", "hinder"])];

/// Weapon and offhand words that double as pseudo-tags
const WEAPON_HINT_WORDS: &[&str] = &[
    "sceptre", "wand", "staff", "bow", "spear", "axe", "sword", "mace", "dagger", "hammer",
    "shield", "buckler", "focus", "quiver",
];

static NAME_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(?:,|•|&|\band\b|/|\+|;)\s*").expect("static separator pattern")
});

static COMPOSITE_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(?:/|&|\band\b|\+)\s*").expect("static composite pattern")
});

static BRACKETS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").expect("static bracket pattern"));

/// Strict token: lowercase, drop everything outside `[a-z0-9]`, resolve aliases.
pub fn normalize(raw: &str) -> String {
    let stripped: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();
    resolve_alias(stripped)
}

fn resolve_alias(token: String) -> String {
    TAG_ALIASES
        .iter()
        .find(|(from, _)| *from == token)
        .map(|(_, to)| (*to).to_string())
        .unwrap_or(token)
}

/// Phrase form for substring matching: trimmed, lowercase, single spaces
pub fn normalize_phrase(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize many tags into a set, dropping empties
pub fn normalize_set<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| normalize(t.as_ref()))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Normalize preserving first-seen order, dropping empties and duplicates
pub fn normalize_ordered<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for tag in tags {
        let t = normalize(tag.as_ref());
        if !t.is_empty() && seen.insert(t.clone()) {
            out.push(t);
        }
    }
    out
}

/// Split composite tags ("slow/maim/hinder", "bleed & poison") into atomic tokens
pub fn expand_composite<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = BTreeSet::new();
    for tag in tags {
        let raw = tag.as_ref();
        if raw.is_empty() {
            continue;
        }
        let parts: Vec<String> = COMPOSITE_SEPARATORS
            .split(raw)
            .map(normalize)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() > 1 {
            out.extend(parts);
            continue;
        }
        let token = normalize(raw);
        if let Some((_, atoms)) = FUSED_COMPOSITES.iter().find(|(fused, _)| *fused == token) {
            out.extend(atoms.iter().map(|a| a.to_string()));
        } else if !token.is_empty() {
            out.insert(token);
        }
    }
    out
}

/// Split a display line ("Bleed & Poison", "Block, Deflection") into names
pub fn split_names(line: &str) -> Vec<String> {
    let line = line.replace('\u{00B7}', "•");
    NAME_SEPARATORS
        .split(&line)
        .map(|part| part.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tags written inline as `[Fire|Spell]` in skill descriptions
pub fn extract_bracket_tags(description: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for caps in BRACKETS.captures_iter(description) {
        for piece in caps[1].split('|') {
            let tag = normalize(piece.trim());
            if !tag.is_empty() && !found.contains(&tag) {
                found.push(tag);
            }
        }
    }
    found
}

/// Armour / evasion / energy shield pseudo-tags implied by a defense name
pub fn defense_pseudo_tags(defense_name: &str) -> Vec<String> {
    let d = defense_name.to_lowercase();
    let mut out = Vec::new();
    if d.contains("armour") {
        out.push("armour".to_string());
    }
    if d.contains("evasion") {
        out.push("evasion".to_string());
    }
    if d.contains("energy") {
        out.push("energyshield".to_string());
    }
    out
}

/// Weapon-type words found in the weapon and offhand names
pub fn weapon_hints(weapon: &str, offhand: Option<&str>) -> BTreeSet<String> {
    let names = [weapon.to_lowercase(), offhand.unwrap_or("").to_lowercase()];
    let mut set = BTreeSet::new();
    for name in &names {
        for word in WEAPON_HINT_WORDS {
            if name.contains(word) {
                set.insert(word.to_string());
            }
        }
    }
    set
}
