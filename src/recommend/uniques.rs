//! Unique item recommendations.
//!
//! An item's tag set is its raw tags, the canonical labels its text actually
//! backs up, and a few tags derived from the text itself. Items are scored
//! by how many of the roll's tactic, ailment and defense-strategy tags they
//! share, weighted in that order, with a small bonus when the item's slot
//! fits the rolled weapons.

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;
use tracing::debug;

use crate::catalog::{SlottedItem, UniqueItem};
use crate::constants::{
    UNIQUE_HEADER_LINES, UNIQUE_LIMIT, UNIQUE_MIN_SCORE, UNIQUE_PER_SLOT_CAP,
    UNIQUE_WEIGHT_AILMENT, UNIQUE_WEIGHT_DEFENSE, UNIQUE_WEIGHT_SLOT, UNIQUE_WEIGHT_TACTIC,
};
use crate::roller::RollContext;
use crate::tags::{expand_composite, normalize};

use super::TagMarker;

/// Slots any build can use
const BASE_SLOTS: &[&str] = &[
    "amulet", "belt", "ring", "jewel", "body", "boots", "gloves", "helmet", "flask", "tincture",
];

/// Weapon-line substring → slots it opens up
const WEAPON_SLOTS: &[(&str, &[&str])] = &[
    ("bow", &["bow", "quiver"]),
    ("crossbow", &["crossbow"]),
    ("staff", &["staff"]),
    ("spear", &["spear"]),
    ("sword", &["sword"]),
    ("mace", &["mace"]),
    ("axe", &["axe"]),
    ("claw", &["claw"]),
    ("wand", &["wand"]),
    ("sceptre", &["sceptre"]),
    ("shield", &["shield"]),
    ("buckler", &["buckler"]),
    ("focus", &["focus"]),
    ("soulcore", &["soulcore"]),
    ("trap tool", &["traptool"]),
    ("traptool", &["traptool"]),
];

fn pattern(source: &str) -> Regex {
    RegexBuilder::new(source)
        .case_insensitive(true)
        .build()
        .expect("static unique pattern")
}

/// Canonical label → text that must be present for the label to count
static EVIDENCE: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("Ignite", r"\bignite(d|s|ing)?\b"),
        ("Freeze", r"\bfreez(e|es|ed|ing)\b|\bchill(ed|ing|s)?\b"),
        ("Shock", r"\bshock(ed|ing|s)?\b"),
        ("Bleed", r"\bbleed(ing|s|ed)?\b"),
        ("Poison", r"\bpoison(ed|ing|s)?\b"),
        ("Life Regeneration", r"\blife\s+regen(eration)?\b|\bregenerat(e|es|ed|ing|ion)\b"),
        ("Leech", r"\bleech(ed|ing|es)?\b"),
        ("Culling Strike", r"\bculling\s+strike\b"),
        ("Heavy Stun", r"\bstun(ned|ning|s)?\b|\bheavy\s+stun\b|\bstun\s+threshold\b"),
        ("Block", r"\bchance\s+to\s+block\b|\bblock(ed|ing|s)?\b"),
    ]
    .into_iter()
    .map(|(label, source)| (label, pattern(source)))
    .collect()
});

/// Text pattern → derived tag
static DERIVED: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?:break|broken|breaks)\s+armou?r", "armourbreak"),
        (r"armou?r\s*(?:break|broken)", "armourbreak"),
        (r"armou?r.*shatter|shatter.*armou?r", "armourbreak"),
        (r"\bhinder(?:ed|ing|s)?\b|\bhindrance\b", "hinder"),
        (r"\bslow(?:ed|ing|s)?\b", "slow"),
        (r"\bmaim(?:ed|ing|s)?\b", "maim"),
        (r"\blife\s+regen(eration)?\b|\bregenerat(e|es|ed|ing|ion)\b", "liferegeneration"),
        (r"\bleech(ed|ing|es)?\b", "leech"),
        (r"\bcrit(ical|s|ically| chance)?\b|\bcritical\s+strike\b", "crit"),
    ]
    .into_iter()
    .map(|(source, tag)| (pattern(source), tag))
    .collect()
});

/// Item text below the name and base type lines
fn body_text(item: &UniqueItem) -> String {
    item.lines
        .iter()
        .skip(UNIQUE_HEADER_LINES)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Canonical labels whose evidence pattern matches the item text.
/// Labels without a known pattern are kept.
pub fn evidenced_canonicals(item: &UniqueItem) -> Vec<String> {
    let text = body_text(item);
    item.tags
        .canonical
        .iter()
        .filter(|label| {
            match EVIDENCE.iter().find(|(known, _)| known.eq_ignore_ascii_case(label)) {
                Some((_, rx)) => rx.is_match(&text),
                None => true,
            }
        })
        .cloned()
        .collect()
}

/// Tags implied by the item text alone
pub fn derive_tags(lines: &[String]) -> BTreeSet<String> {
    let text = lines
        .iter()
        .skip(UNIQUE_HEADER_LINES)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");
    DERIVED
        .iter()
        .filter(|(rx, _)| rx.is_match(&text))
        .map(|(_, tag)| tag.to_string())
        .collect()
}

/// Normalized raw tags ∪ evidenced canonicals ∪ derived tags
pub fn item_tag_set(item: &UniqueItem) -> BTreeSet<String> {
    let mut set: BTreeSet<String> = item
        .tags
        .raw
        .iter()
        .chain(evidenced_canonicals(item).iter())
        .map(|t| normalize(t))
        .filter(|t| !t.is_empty())
        .collect();
    set.extend(derive_tags(&item.lines));
    set
}

/// Rolled tags per category, composite-expanded
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RolledTags {
    pub tactics: BTreeSet<String>,
    pub ailments: BTreeSet<String>,
    pub defense: BTreeSet<String>,
}

impl RolledTags {
    pub fn from_roll(ctx: &RollContext) -> Self {
        fn expand(items: &[SlottedItem]) -> BTreeSet<String> {
            expand_composite(items.iter().flat_map(|i| i.tags.iter()))
        }
        Self {
            tactics: expand(&ctx.tactics),
            ailments: expand(&ctx.ailments),
            defense: expand(std::slice::from_ref(&ctx.defense_strategy)),
        }
    }

    pub fn union(&self) -> BTreeSet<String> {
        self.tactics
            .iter()
            .chain(&self.ailments)
            .chain(&self.defense)
            .cloned()
            .collect()
    }
}

/// Slots usable with the rolled weapon line
pub fn allowed_slots(weapon_line: &str) -> BTreeSet<String> {
    let line = weapon_line.to_lowercase();
    let mut slots: BTreeSet<String> = BASE_SLOTS.iter().map(|s| s.to_string()).collect();
    for (needle, opened) in WEAPON_SLOTS {
        if line.contains(needle) {
            slots.extend(opened.iter().map(|s| s.to_string()));
        }
    }
    slots
}

pub fn score_item(tags: &BTreeSet<String>, rolled: &RolledTags, slot: &str, allowed: &BTreeSet<String>) -> f64 {
    let hits = |category: &BTreeSet<String>| category.iter().filter(|t| tags.contains(*t)).count() as f64;
    let mut score = UNIQUE_WEIGHT_TACTIC * hits(&rolled.tactics)
        + UNIQUE_WEIGHT_AILMENT * hits(&rolled.ailments)
        + UNIQUE_WEIGHT_DEFENSE * hits(&rolled.defense);
    if allowed.contains(&slot.to_lowercase()) {
        score += UNIQUE_WEIGHT_SLOT;
    }
    score
}

/// Piece of a description line; `hit` marks a rolled tag occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineSegment {
    pub text: String,
    pub hit: bool,
}

/// Split each body line into plain and hit segments. Tags match as
/// case-insensitive literals anywhere in the line, longest first.
pub fn highlight(lines: &[String], rolled: &BTreeSet<String>) -> Vec<Vec<LineSegment>> {
    let body = lines.iter().skip(UNIQUE_HEADER_LINES);
    let mut needles: Vec<&String> = rolled.iter().filter(|t| !t.is_empty()).collect();
    needles.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let matcher = if needles.is_empty() {
        None
    } else {
        let source = needles
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        RegexBuilder::new(&source).case_insensitive(true).build().ok()
    };

    body.map(|line| {
        let Some(rx) = &matcher else {
            return vec![LineSegment {
                text: line.clone(),
                hit: false,
            }];
        };
        let mut segments = Vec::new();
        let mut cursor = 0;
        for m in rx.find_iter(line) {
            if m.start() > cursor {
                segments.push(LineSegment {
                    text: line[cursor..m.start()].to_string(),
                    hit: false,
                });
            }
            segments.push(LineSegment {
                text: m.as_str().to_string(),
                hit: true,
            });
            cursor = m.end();
        }
        if cursor < line.len() || segments.is_empty() {
            segments.push(LineSegment {
                text: line[cursor..].to_string(),
                hit: false,
            });
        }
        segments
    })
    .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UniqueRecommendation {
    pub name: String,
    pub base: String,
    pub slot: String,
    pub score: f64,
    /// Sorted item tags, flagged when rolled
    pub tags: Vec<TagMarker>,
    pub lines: Vec<Vec<LineSegment>>,
}

/// Best uniques for a roll: score at least the minimum, sorted by score,
/// at most two per slot and five overall.
pub fn recommend_uniques(items: &[UniqueItem], ctx: &RollContext) -> Vec<UniqueRecommendation> {
    let rolled = RolledTags::from_roll(ctx);
    let rolled_set = rolled.union();
    let allowed = allowed_slots(&ctx.weapon_line());

    let mut scored: Vec<(&UniqueItem, BTreeSet<String>, f64)> = items
        .iter()
        .map(|item| {
            let tags = item_tag_set(item);
            let score = score_item(&tags, &rolled, &item.slot, &allowed);
            (item, tags, score)
        })
        .filter(|(_, _, score)| *score >= UNIQUE_MIN_SCORE)
        .collect();
    scored.sort_by(|a, b| b.2.total_cmp(&a.2));

    let mut per_slot: BTreeMap<String, usize> = BTreeMap::new();
    let mut picks = Vec::new();
    for (item, tags, score) in scored {
        let count = per_slot.entry(item.slot.trim().to_lowercase()).or_insert(0);
        if *count >= UNIQUE_PER_SLOT_CAP {
            continue;
        }
        *count += 1;
        picks.push(UniqueRecommendation {
            name: item.name.clone(),
            base: item.base.clone(),
            slot: item.slot.clone(),
            score,
            tags: tags
                .iter()
                .map(|t| TagMarker {
                    tag: t.clone(),
                    matched: rolled_set.contains(t),
                })
                .collect(),
            lines: highlight(&item.lines, &rolled_set),
        });
        if picks.len() >= UNIQUE_LIMIT {
            break;
        }
    }
    debug!(candidates = items.len(), picked = picks.len(), "unique recommendations");
    picks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attributes;
    use crate::catalog::UniqueTags;

    fn item(name: &str, slot: &str, body: &[&str], raw: &[&str], canonical: &[&str]) -> UniqueItem {
        let mut lines = vec![name.to_string(), "Base".to_string()];
        lines.extend(body.iter().map(|l| l.to_string()));
        UniqueItem {
            name: name.to_string(),
            base: "Base".to_string(),
            slot: slot.to_string(),
            lines,
            tags: UniqueTags {
                raw: raw.iter().map(|t| t.to_string()).collect(),
                canonical: canonical.iter().map(|t| t.to_string()).collect(),
            },
        }
    }

    fn roll() -> RollContext {
        RollContext {
            class: "Huntress".into(),
            ascendancy: "Amazon".into(),
            class_attributes: Attributes::balanced(),
            weapon: SlottedItem::new("Spear", Attributes::ZERO, &[]),
            offhand: Some(SlottedItem::new("Buckler", Attributes::ZERO, &[])),
            defense: SlottedItem::new("Evasion", Attributes::ZERO, &[]),
            defense_strategy: SlottedItem::new("Block", Attributes::ZERO, &["block"]),
            tactics: vec![SlottedItem::new("Crowd Control", Attributes::ZERO, &["slow/maim/hinder"])],
            ailments: vec![SlottedItem::new("Bleed", Attributes::ZERO, &["bleed"])],
            attributes: Attributes::balanced(),
            build_name: String::new(),
            flavor: String::new(),
        }
    }

    #[test]
    fn test_canonical_needs_evidence() {
        let backed = item("A", "ring", &["Attacks cause Bleeding"], &[], &["Bleed", "Mystery"]);
        assert_eq!(evidenced_canonicals(&backed), vec!["Bleed", "Mystery"]);
        let unbacked = item("B", "ring", &["+10 to Strength"], &[], &["Bleed"]);
        assert!(evidenced_canonicals(&unbacked).is_empty());
        // header lines do not count as evidence
        let header_only = item("Bleed Ring", "ring", &[], &[], &["Bleed"]);
        assert!(evidenced_canonicals(&header_only).is_empty());
    }

    #[test]
    fn test_derived_tags() {
        let lines: Vec<String> = ["X", "Y", "Hits Break Armour", "Enemies are Hindered and Maimed"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let tags = derive_tags(&lines);
        assert!(tags.contains("armourbreak"));
        assert!(tags.contains("hinder"));
        assert!(tags.contains("maim"));
        assert!(!tags.contains("slow"));
    }

    #[test]
    fn test_allowed_slots() {
        let slots = allowed_slots("Spear & Buckler");
        assert!(slots.contains("spear"));
        assert!(slots.contains("buckler"));
        assert!(slots.contains("amulet"));
        assert!(!slots.contains("quiver"));
        let bow = allowed_slots("Bow");
        assert!(bow.contains("quiver"));
        assert!(allowed_slots("Trap Tool").contains("traptool"));
    }

    #[test]
    fn test_ranking_caps_and_threshold() {
        let items = vec![
            item("Slowing Ring", "ring", &["Your hits Slow enemies"], &[], &[]),
            item("Maim Ring", "ring", &["Maim on hit"], &["bleed"], &[]),
            item("Hinder Ring", "ring", &["Hinder on hit"], &[], &[]),
            item("Weak Belt", "belt", &["Bleeding"], &["bleed"], &[]),
            item("Unrelated Helm", "helmet", &["+30 to maximum Life"], &[], &[]),
        ];
        let picks = recommend_uniques(&items, &roll());
        let names: Vec<&str> = picks.iter().map(|p| p.name.as_str()).collect();
        // 3.0 + 1.7 + 0.6 leads; rings capped at two; belt at 2.3 dropped
        assert_eq!(names[0], "Maim Ring");
        assert_eq!(picks.iter().filter(|p| p.slot == "ring").count(), 2);
        assert!(!names.contains(&"Weak Belt"));
        assert!(!names.contains(&"Unrelated Helm"));
    }

    #[test]
    fn test_slot_cap_ignores_case() {
        let items = vec![
            item("Slowing Ring", "ring", &["Your hits Slow enemies"], &[], &[]),
            item("Maim Ring", "Ring", &["Maim on hit"], &[], &[]),
            item("Hinder Ring", "RING ", &["Hinder on hit"], &[], &[]),
        ];
        let picks = recommend_uniques(&items, &roll());
        assert_eq!(picks.len(), 2);
    }

    #[test]
    fn test_highlight_segments() {
        let rolled: BTreeSet<String> = ["bleed".to_string()].into_iter().collect();
        let lines: Vec<String> = ["N", "B", "Attacks cause Bleeding", "Nothing here"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let out = highlight(&lines, &rolled);
        assert_eq!(out.len(), 2);
        assert_eq!(
            out[0],
            vec![
                LineSegment { text: "Attacks cause ".into(), hit: false },
                LineSegment { text: "Bleed".into(), hit: true },
                LineSegment { text: "ing".into(), hit: false },
            ]
        );
        assert_eq!(out[1], vec![LineSegment { text: "Nothing here".into(), hit: false }]);
    }

    #[test]
    fn test_markers_flag_rolled_tags() {
        let items = vec![item("Maim Ring", "ring", &["Maim on hit"], &["Bleed", "Fire"], &[])];
        let picks = recommend_uniques(&items, &roll());
        let markers = &picks[0].tags;
        assert!(markers.iter().any(|m| m.tag == "bleed" && m.matched));
        assert!(markers.iter().any(|m| m.tag == "fire" && !m.matched));
        assert!(markers.iter().any(|m| m.tag == "maim" && m.matched));
    }
}
