//! Maximal marginal relevance selection.
//!
//! The first pick is the top-ranked candidate. The second maximizes
//! `λ·score − (1−λ)·jaccard(tags, first.tags)`, trading a little relevance
//! for a recommendation that does not repeat the first one.

use std::collections::BTreeSet;

use crate::catalog::Gem;
use crate::tags::normalize;

/// Anything with a tag list
pub trait Tagged {
    fn tag_list(&self) -> &[String];
}

impl Tagged for Gem {
    fn tag_list(&self) -> &[String] {
        &self.tags
    }
}

/// A candidate with its ranking score
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    pub item: T,
    pub score: f64,
}

fn tag_set<T: Tagged>(item: &T) -> BTreeSet<String> {
    item.tag_list()
        .iter()
        .map(|t| normalize(t))
        .filter(|t| !t.is_empty())
        .collect()
}

/// |A ∩ B| / |A ∪ B|; two empty sets have similarity 0
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.union(b).count().max(1);
    intersection as f64 / union as f64
}

/// Pick up to two items from candidates sorted by descending score.
/// Ties on the MMR value go to the earlier candidate.
pub fn select_two<T: Tagged>(ranked: &[Ranked<T>], lambda: f64) -> Vec<&T> {
    let Some(first) = ranked.first() else {
        return Vec::new();
    };
    if ranked.len() == 1 {
        return vec![&first.item];
    }
    let first_tags = tag_set(&first.item);
    let mut best: Option<(f64, &T)> = None;
    for candidate in &ranked[1..] {
        let overlap = jaccard(&first_tags, &tag_set(&candidate.item));
        let mmr = lambda * candidate.score - (1.0 - lambda) * overlap;
        if best.map_or(true, |(b, _)| mmr > b) {
            best = Some((mmr, &candidate.item));
        }
    }
    match best {
        Some((_, second)) => vec![&first.item, second],
        None => vec![&first.item],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Card {
        name: &'static str,
        tags: Vec<String>,
    }

    impl Tagged for Card {
        fn tag_list(&self) -> &[String] {
            &self.tags
        }
    }

    fn card(name: &'static str, tags: &[&str], score: f64) -> Ranked<Card> {
        Ranked {
            item: Card {
                name,
                tags: tags.iter().map(|t| t.to_string()).collect(),
            },
            score,
        }
    }

    #[test]
    fn test_empty_and_single() {
        let none: Vec<Ranked<Card>> = Vec::new();
        assert!(select_two(&none, 0.7).is_empty());
        let one = vec![card("a", &["fire"], 1.0)];
        assert_eq!(select_two(&one, 0.7).len(), 1);
    }

    #[test]
    fn test_prefers_disjoint_over_duplicate() {
        let ranked = vec![
            card("first", &["fire", "spell"], 1.0),
            card("duplicate", &["fire", "spell"], 1.0),
            card("alternative", &["cold", "attack"], 0.9),
        ];
        let picks = select_two(&ranked, 0.7);
        assert_eq!(picks[0].name, "first");
        // duplicate: 0.7 - 0.3 = 0.4; alternative: 0.63
        assert_eq!(picks[1].name, "alternative");
    }

    #[test]
    fn test_first_maximum_wins_ties() {
        let ranked = vec![
            card("first", &["fire"], 1.0),
            card("b", &["cold"], 0.5),
            card("c", &["lightning"], 0.5),
        ];
        assert_eq!(select_two(&ranked, 0.7)[1].name, "b");
    }

    #[test]
    fn test_jaccard() {
        let a: BTreeSet<String> = ["x", "y"].iter().map(|s| s.to_string()).collect();
        let b: BTreeSet<String> = ["y", "z"].iter().map(|s| s.to_string()).collect();
        assert!((jaccard(&a, &b) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(jaccard(&BTreeSet::new(), &BTreeSet::new()), 0.0);
    }
}
