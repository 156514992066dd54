//! Error types for Noema.
//!
//! Each subsystem crate defines its own error enum; this module holds the
//! errors shared across crates and the top-level aggregate.
//!
//! Two failure families are deliberately *not* errors:
//! - a task that does not fit a budget or a node is silently excluded from
//!   the result (`ResourceInfeasible` is a documented contract, not a fault)
//! - an unreachable node pair is simply absent from the routing table

use thiserror::Error;

use crate::id::NodeId;

/// Top-level error type for Noema
#[derive(Debug, Error)]
pub enum NoemaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),
}

/// Errors raised when validating configuration at construction time.
///
/// These fail fast: a component is never built from invalid parameters.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid STI bounds: min {min} exceeds max {max}")]
    InvalidStiBounds { min: i64, max: i64 },

    #[error("Invalid LTI bound: {0} (must be non-negative)")]
    InvalidLtiBound(i64),

    #[error("Invalid rate {name}: {value} (must be within [0, 1])")]
    InvalidRate { name: &'static str, value: f64 },

    #[error("Invalid decay rate: {0} (must be within (0, 1])")]
    InvalidDecayRate(f64),

    #[error("Invalid interval {name}: must be non-zero")]
    ZeroInterval { name: &'static str },
}

/// Errors raised by mesh topology operations.
///
/// Note that removing an unknown node is a no-op, not an error; only
/// operations that signal state for a node the caller believes exists
/// (heartbeats, maintenance) report [`MeshError::NodeNotFound`].
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
}

/// Result type alias for Noema operations
pub type NoemaResult<T> = Result<T, NoemaError>;
