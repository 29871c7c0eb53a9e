//! Attribute-cohesion weighted picking.
//!
//! A candidate passes the cohesion filter when the cosine similarity of its
//! attributes to the class base attributes reaches the mode threshold. The
//! pick is uniform over the passing candidates, or over the whole pool when
//! none pass. A zero threshold skips the filter entirely.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::attributes::Attributes;
use crate::catalog::SlottedItem;
use crate::constants::COHESION_TOLERANCE;

/// Anything carrying an attribute triple
pub trait Attributed {
    fn attributes(&self) -> &Attributes;
}

impl Attributed for SlottedItem {
    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

impl Attributed for Attributes {
    fn attributes(&self) -> &Attributes {
        self
    }
}

/// Candidates whose similarity to `base` reaches `threshold`
pub fn cohesive_subset<'a, T: Attributed>(
    candidates: &[&'a T],
    base: &Attributes,
    threshold: f64,
) -> Vec<&'a T> {
    candidates
        .iter()
        .copied()
        .filter(|c| c.attributes().cosine(base) + COHESION_TOLERANCE >= threshold)
        .collect()
}

/// Pick one candidate; `None` only when the pool is empty
pub fn pick<'a, T: Attributed, R: Rng + ?Sized>(
    candidates: &[&'a T],
    base: &Attributes,
    threshold: f64,
    rng: &mut R,
) -> Option<&'a T> {
    if candidates.is_empty() {
        return None;
    }
    if threshold <= 0.0 {
        return candidates.choose(rng).copied();
    }
    let passing = cohesive_subset(candidates, base, threshold);
    if passing.is_empty() {
        candidates.choose(rng).copied()
    } else {
        passing.choose(rng).copied()
    }
}
