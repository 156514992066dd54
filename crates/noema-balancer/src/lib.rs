//! # Noema Balancer
//!
//! Places admitted work onto mesh nodes and keeps node loads level.
//!
//! ## Core Components
//!
//! - [`SelectionStrategy`] / [`Strategy`]: pluggable node selection with four
//!   built-ins (round-robin, least-loaded, weighted-random, priority-score)
//! - [`distribute_load`]: batch task placement over schedulable nodes with a
//!   per-node shadow copy of remaining resources
//! - [`rebalance`]: periodic load equalization between over- and
//!   under-utilized nodes
//!
//! Placement failures are represented by absence: a task with no feasible
//! node is simply missing from the distribution map, mirroring the
//! scheduler's silent-exclusion contract.

pub mod distribute;
pub mod rebalance;
pub mod strategy;

pub use distribute::distribute_load;
pub use rebalance::{rebalance, RebalanceResult, REBALANCE_THRESHOLD};
pub use strategy::{SelectionStrategy, Strategy, StrategyKind};
