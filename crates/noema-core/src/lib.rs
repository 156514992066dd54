//! # Noema Core
//!
//! Core types and errors for the Noema attention-allocation stack.
//!
//! Noema is an economic, bounded-resource attention scheduler coupled to a
//! mesh work coordinator. This crate provides the shared vocabulary the
//! other crates build on:
//!
//! ## Key Types
//!
//! - [`AttentionValue`]: short/long/very-long-term importance for an entity
//! - [`ResourceVector`]: the cpu/memory/bandwidth/storage quadruple used for
//!   both requirements and capacities
//! - [`MeshNode`]: an in-process mesh node record with load, capacity and
//!   heartbeat state
//! - [`ScheduledTask`]: a transient unit of work submitted for admission and
//!   placement
//! - [`ResourceAllocation`]: the record retained for every admitted task
//!
//! Mesh nodes here are registry records, not live endpoints; transport and
//! task execution are supplied by the caller.

pub mod attention;
pub mod error;
pub mod id;
pub mod node;
pub mod resources;
pub mod task;

// Re-export main types
pub use attention::*;
pub use error::*;
pub use id::*;
pub use node::*;
pub use resources::*;
pub use task::*;
