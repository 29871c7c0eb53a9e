//! Randomancer - Build Randomizer Core Library
//!
//! This crate provides the engine behind the Randomancer build randomizer:
//! - Tag normalization and attribute triples
//! - Attribute-cohesion weighted picking
//! - Hard equipment rules (validator + inline pre-gates)
//! - Build roller (class → weapon → offhand → defense → strategy → tactics/ailments)
//! - Rejection-sampling enforcer with attempt metrics
//! - Synergy scoring (IDF-weighted tag overlap, attribute similarity, combo bonus)
//! - MMR diversity selection
//! - Gem and unique-item recommendations
//! - Roll-completed events, epoch tokens and signature watchers
//! - Seed sweeps for tuning
//! - C-ABI JSON bridge for host front ends

pub mod attributes;
pub mod bridge;
pub mod catalog;
pub mod cohesion;
pub mod config;
pub mod constants;
pub mod diversity;
pub mod enforcer;
pub mod error;
pub mod events;
pub mod logging;
pub mod recommend;
pub mod roller;
pub mod rules;
pub mod session;
pub mod sweep;
pub mod synergy;
pub mod tags;

pub use error::{RandomancerError, Result};
