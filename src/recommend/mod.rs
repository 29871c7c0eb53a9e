//! Recommendations derived from a finished roll: two skill gems and up to
//! five unique items.

pub mod gems;
pub mod uniques;

use serde::Serialize;

pub use gems::{recommend_gems, GemRecommendation, GrantLine, SupportLine};
pub use uniques::{
    allowed_slots, derive_tags, evidenced_canonicals, highlight, item_tag_set, recommend_uniques,
    LineSegment, RolledTags, UniqueRecommendation,
};

/// A tag shown on a card, flagged when the roll carries it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagMarker {
    pub tag: String,
    pub matched: bool,
}

/// Everything recommended for one roll
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recommendations {
    pub gems: Vec<GemRecommendation>,
    pub uniques: Vec<UniqueRecommendation>,
}
