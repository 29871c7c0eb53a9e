//! Centralized tuning constants for the randomancer core.
//!
//! These are the defaults the config layer starts from. Anything a session
//! might want to retune (weights, caps, bonuses) is also exposed through
//! `config::RandomizerConfig`; the values here are the single source of
//! truth for those defaults.

// =====================================================
// Attributes & cohesion
// =====================================================

/// Denominator floor used when normalizing an attribute triple
pub const ATTRIBUTE_EPSILON: f64 = 1e-6;

/// Slack allowed when comparing a cosine similarity against a cohesion threshold
pub const COHESION_TOLERANCE: f64 = 1e-9;

/// Cohesion threshold per mode
pub const THRESHOLD_STRICT: f64 = 0.75;
pub const THRESHOLD_COHESIVE: f64 = 0.5;
pub const THRESHOLD_CHAOTIC: f64 = 0.25;
pub const THRESHOLD_MADNESS: f64 = 0.0;

// =====================================================
// Build roller
// =====================================================

/// Uniform draw below this rolls one ailment + one tactic
pub const BRANCH_SINGLE_PAIR: f64 = 0.6;

/// Uniform draw below this (and above BRANCH_SINGLE_PAIR) rolls two ailments
pub const BRANCH_DOUBLE_AILMENT: f64 = 0.8;

/// Tactic that needs a sceptre in either hand
pub const MINIONS_TACTIC: &str = "minions";

/// Substring a weapon or offhand must contain to unlock the minions tactic
pub const SCEPTRE_MARKER: &str = "sceptre";

/// Substring that marks a weapon as two-handed regardless of the configured list
pub const TWO_HANDED_MARKER: &str = "two-handed";

// =====================================================
// Rejection sampling
// =====================================================

/// Re-roll cap for the enforcer
pub const MAX_ENFORCE_ATTEMPTS: u32 = 25;

/// Smoothing factor of the attempts moving average
pub const ATTEMPTS_EMA_ALPHA: f64 = 0.2;

// =====================================================
// Synergy scoring
// =====================================================

/// Tag-profile weight per rolled category
pub const PROFILE_WEIGHT_TACTICS: f64 = 1.20;
pub const PROFILE_WEIGHT_AILMENTS: f64 = 1.10;
pub const PROFILE_WEIGHT_DEFENSE_STRATEGY: f64 = 0.70;
pub const PROFILE_WEIGHT_DEFENSE: f64 = 0.60;
pub const PROFILE_WEIGHT_WEAPON: f64 = 0.50;

/// Flat bonus when a gem shares a tag with the weapon hint set
pub const WEAPON_HINT_BONUS: f64 = 0.10;

/// Combo bonus scale: delta * min(tactics,2) * min(ailments,2) * avg idf
pub const COMBO_DELTA: f64 = 0.10;

/// Cap on tactic/ailment matches counted by the combo bonus
pub const COMBO_MATCH_CAP: usize = 2;

/// Lower and upper clamp for the alpha/beta tunables
pub const TUNABLE_MIN: f64 = 0.0;
pub const TUNABLE_MAX: f64 = 2.0;

/// Quantile used as the synergy percentage denominator
pub const SYNERGY_QUANTILE: f64 = 0.95;

/// Share of the max raw score that also bounds the denominator from below
pub const SYNERGY_MAX_SHARE: f64 = 0.9;

/// Floor of the synergy percentage denominator
pub const SYNERGY_EPSILON: f64 = 1e-6;

/// MMR relevance/redundancy balance
pub const MMR_LAMBDA: f64 = 0.7;

/// Gems recommended per roll
pub const GEM_PICKS: usize = 2;

/// Tags shown on a gem card
pub const GEM_DISPLAY_TAGS: usize = 10;

// =====================================================
// Unique items
// =====================================================

pub const UNIQUE_WEIGHT_TACTIC: f64 = 3.0;
pub const UNIQUE_WEIGHT_AILMENT: f64 = 1.7;
pub const UNIQUE_WEIGHT_DEFENSE: f64 = 1.2;
pub const UNIQUE_WEIGHT_SLOT: f64 = 0.6;

/// Items scoring below this are never recommended
pub const UNIQUE_MIN_SCORE: f64 = 2.8;

/// Total unique recommendations per roll
pub const UNIQUE_LIMIT: usize = 5;

/// Unique recommendations per equipment slot
pub const UNIQUE_PER_SLOT_CAP: usize = 2;

/// Leading item lines (name, base type) skipped for text evidence
pub const UNIQUE_HEADER_LINES: usize = 2;

// =====================================================
// Watchers
// =====================================================

/// Debounce after a roll-signature change before recommendations refresh
pub const WATCH_DEBOUNCE_MS: u64 = 180;

/// Fallback polling interval of the signature watcher
pub const WATCH_POLL_INTERVAL_MS: u64 = 800;
