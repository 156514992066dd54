//! Mesh node records.
//!
//! A [`MeshNode`] is an in-process registry record, not a live endpoint.
//! Lifecycle: created by an explicit add, destroyed by an explicit remove.
//! Status transitions:
//!
//! ```text
//! active <-> busy          (load-derived, informational)
//! active/busy -> offline   (heartbeat timeout)
//! offline -> active        (heartbeat resumes)
//! any -> maintenance       (external signal)
//! maintenance -> active    (external signal)
//! ```

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::NodeId;
use crate::resources::ResourceVector;

/// Load level at which an active node is reported as busy. Informational
/// only; busy nodes still receive work.
pub const BUSY_LOAD_THRESHOLD: f64 = 90.0;

/// Health and availability state of a mesh node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeStatus {
    /// Healthy and accepting work.
    Active,
    /// Healthy but heavily loaded. Still accepts work.
    Busy,
    /// Missed heartbeats. Connections remain but distribution skips it.
    Offline,
    /// Taken out of rotation by an external signal.
    Maintenance,
}

impl NodeStatus {
    /// True for statuses that may receive distributed work.
    pub fn is_schedulable(&self) -> bool {
        matches!(self, NodeStatus::Active | NodeStatus::Busy)
    }
}

/// A node in the mesh registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshNode {
    pub id: NodeId,
    /// Capability tags used for compatibility scoring and task matching.
    pub capabilities: BTreeSet<String>,
    /// Current load percentage in `[0, 100]`.
    pub current_load: f64,
    /// Total capacity of the node.
    pub max_capacity: ResourceVector,
    /// Currently unallocated capacity. Always `<= max_capacity`.
    pub available: ResourceVector,
    pub status: NodeStatus,
    pub last_heartbeat: DateTime<Utc>,
}

impl MeshNode {
    /// Create a fresh node with full availability and a heartbeat of now.
    pub fn new(
        id: impl Into<NodeId>,
        capabilities: impl IntoIterator<Item = impl Into<String>>,
        max_capacity: ResourceVector,
    ) -> Self {
        Self {
            id: id.into(),
            capabilities: capabilities.into_iter().map(Into::into).collect(),
            current_load: 0.0,
            max_capacity,
            available: max_capacity,
            status: NodeStatus::Active,
            last_heartbeat: Utc::now(),
        }
    }

    /// Set the load percentage, clamped to `[0, 100]`.
    ///
    /// The active/busy split is derived from load; offline and maintenance
    /// states are never overridden here.
    pub fn set_load(&mut self, load: f64) {
        self.current_load = load.clamp(0.0, 100.0);
        if self.status.is_schedulable() {
            self.status = if self.current_load >= BUSY_LOAD_THRESHOLD {
                NodeStatus::Busy
            } else {
                NodeStatus::Active
            };
        }
    }

    /// Reserve resources, reducing availability. `false` if they do not fit.
    pub fn reserve(&mut self, amount: &ResourceVector) -> bool {
        match self.available.checked_sub(amount) {
            Some(remaining) => {
                self.available = remaining;
                true
            }
            None => false,
        }
    }

    /// Release previously reserved resources, capped at max capacity.
    pub fn release(&mut self, amount: &ResourceVector) {
        let restored = self.available.saturating_add(amount);
        self.available = ResourceVector {
            cpu: restored.cpu.min(self.max_capacity.cpu),
            memory: restored.memory.min(self.max_capacity.memory),
            bandwidth: restored.bandwidth.min(self.max_capacity.bandwidth),
            storage: restored.storage.min(self.max_capacity.storage),
        };
    }

    /// Fraction of capability tags in `required` that this node offers.
    /// An empty requirement matches fully.
    pub fn capability_match(&self, required: &BTreeSet<String>) -> f64 {
        if required.is_empty() {
            return 1.0;
        }
        let matched = required
            .iter()
            .filter(|c| self.capabilities.contains(*c))
            .count();
        matched as f64 / required.len() as f64
    }
}
