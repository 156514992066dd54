//! # Noema Attention
//!
//! Economic attention allocation: per-entity importance values backed by a
//! shared currency pool (the "bank").
//!
//! ## Core Components
//!
//! - [`AttentionEngine`]: owns the store and the bank, runs the economic cycle
//! - [`AttentionStore`]: per-entity [`AttentionValue`]s plus the bank counter
//! - [`EconomyParams`]: validated bounds and rates (fail fast on bad config)
//! - [`ImportanceGraph`]: weighted edges along which importance spreads
//! - [`EntityProfile`] / [`StimulusContext`]: explicit inputs to attention
//!   scoring, replacing any open-ended context bag
//!
//! ## The Cycle
//!
//! [`AttentionEngine::run_cycle`] executes, in fixed order:
//!
//! ```text
//! ensure-initialized -> spread -> rent -> wages -> decay -> forget
//! ```
//!
//! The ordering is load-bearing: rent and wages must follow spread so that
//! redistributed importance is taxed and rewarded, and must precede decay and
//! forgetting so that freshly-taxed values still decay uniformly.
//!
//! ## Conservation
//!
//! `bank + Σ max(0, sti)` is invariant across cycles. Rent and wages move
//! currency between entities and the bank; spread moves it between entities;
//! decay returns the shaved short-term importance to the bank. No operation
//! creates or destroys currency.

pub mod engine;
pub mod graph;
pub mod params;
pub mod profile;
pub mod store;

pub use engine::AttentionEngine;
pub use graph::{ImportanceEdge, ImportanceGraph};
pub use params::EconomyParams;
pub use profile::{EntityCategory, EntityProfile, StimulusContext};
pub use store::AttentionStore;

// Re-export the core value types callers always need alongside the engine
pub use noema_core::{AttentionValue, EntityId};
