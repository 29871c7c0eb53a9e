//! Rejection-sampling enforcer.
//!
//! Checks a finished roll against the hard rules and re-rolls from scratch
//! until it is legal or the attempt cap is hit. There is no repair step:
//! an illegal roll is only ever replaced by a full new draw. Exhausting the
//! cap is not an error; the last roll is kept and the outcome says so.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RuleConfig;
use crate::constants::ATTEMPTS_EMA_ALPHA;
use crate::error::Result;
use crate::roller::{BuildRoller, RollContext};
use crate::rules::Violation;

/// Result of one enforcement pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnforceOutcome {
    /// The accepted roll, or the last one drawn when attempts ran out
    pub context: RollContext,
    pub success: bool,
    /// Re-rolls performed; 0 when the initial roll was already legal
    pub attempts: u32,
    /// Violations of `context`; empty on success
    pub violations: Vec<Violation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enforcer {
    max_attempts: u32,
    strict: bool,
}

impl Enforcer {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            strict: true,
        }
    }

    pub fn from_config(config: &RuleConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            strict: config.strict_enforcement,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Re-roll until legal or `max_attempts` re-rolls have been spent.
    /// With strict enforcement off the initial roll is returned as is.
    pub fn enforce<R: Rng + ?Sized>(
        &self,
        roller: &BuildRoller<'_>,
        initial: RollContext,
        threshold: f64,
        rng: &mut R,
    ) -> Result<EnforceOutcome> {
        let mut context = initial;
        let mut attempts = 0u32;
        loop {
            let violations = roller.rules().evaluate(&context.snapshot());
            if violations.is_empty() {
                return Ok(EnforceOutcome {
                    context,
                    success: true,
                    attempts,
                    violations,
                });
            }
            if !self.strict {
                debug!(violations = ?violations, "strict enforcement off, keeping illegal roll");
                return Ok(EnforceOutcome {
                    context,
                    success: false,
                    attempts,
                    violations,
                });
            }
            if attempts >= self.max_attempts {
                let messages: Vec<&str> = violations.iter().map(Violation::message).collect();
                warn!(attempts, violations = ?messages, "enforcer attempts exhausted");
                return Ok(EnforceOutcome {
                    context,
                    success: false,
                    attempts,
                    violations,
                });
            }
            context = roller.roll(threshold, rng)?;
            attempts += 1;
        }
    }
}

impl Default for Enforcer {
    fn default() -> Self {
        Self::from_config(&RuleConfig::default())
    }
}

/// Attempt counts for observability, never for control flow
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AttemptMetrics {
    pub rolls: u64,
    pub last_attempts: u32,
    /// Exponential moving average, seeded with the first observation
    pub ema_attempts: f64,
}

impl AttemptMetrics {
    pub fn record(&mut self, attempts: u32) {
        let value = attempts as f64;
        self.ema_attempts = if self.rolls == 0 {
            value
        } else {
            ATTEMPTS_EMA_ALPHA * value + (1.0 - ATTEMPTS_EMA_ALPHA) * self.ema_attempts
        };
        self.last_attempts = attempts;
        self.rolls += 1;
    }
}
