//! Strength / dexterity / intelligence triples.
//!
//! Every catalog entity carries one. They are compared by cosine
//! similarity and aggregated by normalize-then-sum-then-renormalize, so a
//! single high-magnitude entity cannot dominate a roll's balance.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

use crate::constants::ATTRIBUTE_EPSILON;

/// Attribute triple. Missing keys in catalog documents read as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(default)]
    pub strength: f64,
    #[serde(default)]
    pub dexterity: f64,
    #[serde(default)]
    pub intelligence: f64,
}

/// Which of the three attributes dominates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeKind {
    Strength,
    Dexterity,
    Intelligence,
}

impl AttributeKind {
    pub fn short(&self) -> &'static str {
        match self {
            AttributeKind::Strength => "str",
            AttributeKind::Dexterity => "dex",
            AttributeKind::Intelligence => "int",
        }
    }
}

impl Attributes {
    pub const ZERO: Attributes = Attributes::new(0.0, 0.0, 0.0);

    pub const fn new(strength: f64, dexterity: f64, intelligence: f64) -> Self {
        Self {
            strength,
            dexterity,
            intelligence,
        }
    }

    /// Even split, used when a roll has no attribute information yet
    pub fn balanced() -> Self {
        Self::new(1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0)
    }

    pub fn sum(&self) -> f64 {
        self.strength + self.dexterity + self.intelligence
    }

    fn dot(&self, other: &Attributes) -> f64 {
        self.strength * other.strength
            + self.dexterity * other.dexterity
            + self.intelligence * other.intelligence
    }

    pub fn magnitude(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Scale so the components sum to 1. The zero triple stays zero.
    pub fn normalized(&self) -> Self {
        let total = self.sum();
        let total = if total.abs() < ATTRIBUTE_EPSILON {
            ATTRIBUTE_EPSILON
        } else {
            total
        };
        Self::new(
            self.strength / total,
            self.dexterity / total,
            self.intelligence / total,
        )
    }

    /// Cosine similarity; 0.0 when either side has no magnitude
    pub fn cosine(&self, other: &Attributes) -> f64 {
        let magnitude = self.magnitude() * other.magnitude();
        if magnitude < f64::EPSILON {
            return 0.0;
        }
        self.dot(other) / magnitude
    }

    /// Highest component; ties resolve strength → dexterity → intelligence,
    /// and an all-zero triple reads as intelligence.
    pub fn dominant(&self) -> AttributeKind {
        if self.sum() <= 0.0 {
            return AttributeKind::Intelligence;
        }
        let max = self.strength.max(self.dexterity).max(self.intelligence);
        if self.strength == max {
            AttributeKind::Strength
        } else if self.dexterity == max {
            AttributeKind::Dexterity
        } else {
            AttributeKind::Intelligence
        }
    }

    /// Every component that shares the maximum (for tie-colored cards)
    pub fn dominant_all(&self) -> Vec<AttributeKind> {
        let max = self.strength.max(self.dexterity).max(self.intelligence);
        if max <= 0.0 {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(3);
        if self.strength == max {
            out.push(AttributeKind::Strength);
        }
        if self.dexterity == max {
            out.push(AttributeKind::Dexterity);
        }
        if self.intelligence == max {
            out.push(AttributeKind::Intelligence);
        }
        out
    }

    /// Whole-number percentages of the normalized triple
    pub fn percentages(&self) -> (u32, u32, u32) {
        let n = self.normalized();
        (
            (n.strength * 100.0).round() as u32,
            (n.dexterity * 100.0).round() as u32,
            (n.intelligence * 100.0).round() as u32,
        )
    }
}

impl Add for Attributes {
    type Output = Attributes;

    fn add(self, rhs: Attributes) -> Attributes {
        Attributes::new(
            self.strength + rhs.strength,
            self.dexterity + rhs.dexterity,
            self.intelligence + rhs.intelligence,
        )
    }
}

impl AddAssign for Attributes {
    fn add_assign(&mut self, rhs: Attributes) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Attributes {
    fn sum<I: Iterator<Item = Attributes>>(iter: I) -> Self {
        iter.fold(Attributes::ZERO, |acc, a| acc + a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_sums_to_one() {
        let a = Attributes::new(3.0, 1.0, 0.0).normalized();
        assert!((a.sum() - 1.0).abs() < 1e-12);
        assert!((a.strength - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_normalized_zero_stays_zero() {
        let a = Attributes::ZERO.normalized();
        assert_eq!(a, Attributes::ZERO);
        assert!(a.strength.is_finite());
    }

    #[test]
    fn test_cosine_identical_and_orthogonal() {
        let a = Attributes::new(1.0, 0.0, 0.0);
        let b = Attributes::new(5.0, 0.0, 0.0);
        let c = Attributes::new(0.0, 1.0, 0.0);
        assert!((a.cosine(&b) - 1.0).abs() < 1e-12);
        assert!(a.cosine(&c).abs() < 1e-12);
        assert_eq!(a.cosine(&Attributes::ZERO), 0.0);
    }

    #[test]
    fn test_dominant() {
        assert_eq!(
            Attributes::new(0.2, 0.5, 0.3).dominant(),
            AttributeKind::Dexterity
        );
        assert_eq!(
            Attributes::new(0.5, 0.5, 0.0).dominant(),
            AttributeKind::Strength
        );
        assert_eq!(Attributes::ZERO.dominant(), AttributeKind::Intelligence);
        assert_eq!(AttributeKind::Dexterity.short(), "dex");
    }

    #[test]
    fn test_dominant_all_ties() {
        let tied = Attributes::new(0.5, 0.0, 0.5).dominant_all();
        assert_eq!(
            tied,
            vec![AttributeKind::Strength, AttributeKind::Intelligence]
        );
        assert!(Attributes::ZERO.dominant_all().is_empty());
    }

    #[test]
    fn test_percentages() {
        let (s, d, i) = Attributes::new(2.0, 1.0, 1.0).percentages();
        assert_eq!((s, d, i), (50, 25, 25));
    }

    #[test]
    fn test_missing_keys_deserialize_as_zero() {
        let a: Attributes = serde_json::from_str(r#"{"strength": 0.7}"#).unwrap();
        assert_eq!(a, Attributes::new(0.7, 0.0, 0.0));
    }

    #[test]
    fn test_sum_iterator() {
        let total: Attributes = vec![
            Attributes::new(1.0, 0.0, 0.0),
            Attributes::new(0.0, 2.0, 0.0),
        ]
        .into_iter()
        .sum();
        assert_eq!(total, Attributes::new(1.0, 2.0, 0.0));
    }
}
