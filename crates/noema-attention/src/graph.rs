//! Importance graph.
//!
//! A lightweight edge list describing which entities pass importance to
//! which. Edges are directional for spreading: add both directions if the
//! relation is mutual.

use std::collections::BTreeSet;

use noema_core::EntityId;
use serde::{Deserialize, Serialize};

/// One weighted spread edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportanceEdge {
    pub from: EntityId,
    pub to: EntityId,
    /// Edge weight in `[0, 1]`.
    pub weight: f64,
}

/// Edge list over which [`crate::AttentionEngine::spread_importance`] runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportanceGraph {
    edges: Vec<ImportanceEdge>,
}

impl ImportanceGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directed spread edge. Weight is clamped to `[0, 1]`.
    /// Self-edges are ignored.
    pub fn add_edge(
        &mut self,
        from: impl Into<EntityId>,
        to: impl Into<EntityId>,
        weight: f64,
    ) -> &mut Self {
        let from = from.into();
        let to = to.into();
        if from != to {
            self.edges.push(ImportanceEdge {
                from,
                to,
                weight: weight.clamp(0.0, 1.0),
            });
        }
        self
    }

    /// Add edges in both directions with the same weight.
    pub fn add_mutual_edge(
        &mut self,
        a: impl Into<EntityId>,
        b: impl Into<EntityId>,
        weight: f64,
    ) -> &mut Self {
        let a = a.into();
        let b = b.into();
        self.add_edge(a.clone(), b.clone(), weight);
        self.add_edge(b, a, weight);
        self
    }

    /// All edges, in insertion order.
    pub fn edges(&self) -> &[ImportanceEdge] {
        &self.edges
    }

    /// Every entity mentioned by any edge.
    pub fn entities(&self) -> BTreeSet<&EntityId> {
        self.edges
            .iter()
            .flat_map(|e| [&e.from, &e.to])
            .collect()
    }

    /// Number of edges.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// True if the graph has no edges.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}
