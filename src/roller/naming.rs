//! Build names and flavor lines.

use rand::seq::SliceRandom;
use rand::Rng;

const FALLBACK_TITLE: &str = "Nameless";
const FALLBACK_SUFFIX: &str = "Wanderer";
const FALLBACK_FLAVOR: &str = "Conjure the impossible. Defy the meta.";

const TITLES: &[(&str, &[&str])] = &[
    ("Warrior", &["Ember-Forged", "Ironclad", "Warborn", "Stonebound"]),
    ("Ranger", &["Shadowstalker", "Silent Arrow", "Thorned", "Windswift"]),
    ("Witch", &["Veil-Touched", "Hexbound", "Soulweaver", "Ashen"]),
    ("Sorceress", &["Storm-Wreathed", "Starbound", "Auric", "Umbral"]),
    ("Monk", &["Storm-Wreathed", "Inner Flame", "Tranquil", "Sage of Steel"]),
    ("Huntress", &["Moonstalker", "Wildbloom", "Nightsong", "Fangstep"]),
    ("Mercenary", &["Oathbreaker", "Gallowglass", "Bloodhired", "Black Banner"]),
];

const SUFFIXES: &[(&str, &[&str])] = &[
    ("Titan", &["Vanguard", "Colossus", "Juggernaut"]),
    ("Warbringer", &["Harbinger", "Bloodcaller", "War Herald"]),
    ("Smith of Kitava", &["Forgehand", "Anvil-Keeper", "Brandwright"]),
    ("Blood Mage", &["Hemomancer", "Crimson Saint", "Veincaller"]),
    ("Spellblade", &["Aetherduelist", "Edge of Thought", "Mindcarver"]),
    ("Stormweaver", &["Tempest", "Skybrand", "Thunder-Palm"]),
];

const FLAVOR: &[(&str, &[&str])] = &[
    ("Warrior", &["Born of war, bound by honor.", "Strength tempered by flame."]),
    ("Ranger", &["Swift as shadow, silent as dusk.", "The hunt never ends."]),
    ("Witch", &["Wisdom is a double-edged curse.", "Power whispers, and she listens."]),
    ("Sorceress", &["Lightning is a prayer with teeth.", "Stars remember those who dare."]),
    ("Monk", &["Every strike, a meditation.", "Balance through battle."]),
    ("Huntress", &["The wild answers in kind.", "Footfalls like falling leaves."]),
    ("Mercenary", &["Gold buys blades, not mercy.", "No banner, only resolve."]),
];

fn sample<R: Rng + ?Sized>(
    table: &[(&str, &'static [&'static str])],
    key: &str,
    fallback: &'static str,
    rng: &mut R,
) -> &'static str {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .and_then(|(_, options)| options.choose(rng).copied())
        .unwrap_or(fallback)
}

/// "The {title} {suffix}"
pub fn build_name<R: Rng + ?Sized>(class: &str, ascendancy: &str, rng: &mut R) -> String {
    let title = sample(TITLES, class, FALLBACK_TITLE, rng);
    let suffix = sample(SUFFIXES, ascendancy, FALLBACK_SUFFIX, rng);
    format!("The {title} {suffix}")
}

pub fn flavor_line<R: Rng + ?Sized>(class: &str, rng: &mut R) -> String {
    sample(FLAVOR, class, FALLBACK_FLAVOR, rng).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_known_class_and_ascendancy() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        let name = build_name("Warrior", "Titan", &mut rng);
        assert!(name.starts_with("The "));
        let (_, titles) = TITLES[0];
        assert!(titles.iter().any(|t| name.contains(t)));
        assert!(["Vanguard", "Colossus", "Juggernaut"]
            .iter()
            .any(|s| name.ends_with(s)));
    }

    #[test]
    fn test_fallbacks() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(5);
        assert_eq!(build_name("Druid", "Shaman", &mut rng), "The Nameless Wanderer");
        assert_eq!(flavor_line("Druid", &mut rng), FALLBACK_FLAVOR);
    }
}
