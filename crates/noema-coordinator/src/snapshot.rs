//! Observability records: topology snapshots, performance samples, task
//! flow history.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use noema_core::{MeshNode, NodeId, TaskId};
use noema_mesh::MeshTopology;
use serde::{Deserialize, Serialize};

/// A point-in-time view of the mesh, safe to hold without any lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub taken_at: DateTime<Utc>,
    pub node_count: usize,
    pub schedulable_count: usize,
    /// Number of directed routing entries.
    pub route_count: usize,
    pub mean_load: Option<f64>,
    pub nodes: Vec<MeshNode>,
    pub connections: HashMap<NodeId, BTreeSet<NodeId>>,
}

impl TopologySnapshot {
    /// Capture the current topology.
    pub fn capture(topology: &MeshTopology) -> Self {
        let mut nodes: Vec<MeshNode> = topology.nodes().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            taken_at: Utc::now(),
            node_count: topology.len(),
            schedulable_count: topology.schedulable_nodes().count(),
            route_count: topology.routing().route_count(),
            mean_load: topology.mean_load(),
            nodes,
            connections: topology.connections().clone(),
        }
    }
}

/// One sample from the metrics loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub timestamp: DateTime<Utc>,
    pub node_count: usize,
    pub schedulable_count: usize,
    pub mean_load: Option<f64>,
    pub bank: f64,
    pub entity_count: usize,
}

/// One task placement, recorded per node when distribution runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub timestamp: DateTime<Utc>,
    pub task_id: TaskId,
    pub node_id: NodeId,
    /// Attention cost of the placed task.
    pub cost: f64,
}
