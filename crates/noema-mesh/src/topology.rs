//! Mesh topology: node registry, compatibility graph, heartbeat health.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use noema_core::{MeshError, MeshNode, NodeId, NodeStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::routing::RoutingTable;

/// Compatibility score above which two nodes are connected.
pub const CONNECT_THRESHOLD: f64 = 0.4;

/// A node is marked offline after missing this many heartbeat intervals.
pub const HEARTBEAT_MISS_FACTOR: i32 = 3;

/// Compatibility of two nodes, in `[0.3, 1.0]`:
/// 0.4 x capability overlap (Jaccard) + 0.3 x load balance +
/// 0.3 x resource complementarity, floored at 0.3.
///
/// Complementarity favors *differing* free capacity: two nodes with the same
/// spare resources duplicate each other, while one cpu-rich and one
/// storage-rich node cover for each other.
pub fn compatibility(a: &MeshNode, b: &MeshNode) -> f64 {
    let union = a.capabilities.union(&b.capabilities).count();
    let overlap = if union == 0 {
        0.0
    } else {
        a.capabilities.intersection(&b.capabilities).count() as f64 / union as f64
    };

    let load_balance = 1.0 - (a.current_load - b.current_load).abs() / 100.0;

    let mut complementarity = 0.0;
    for (x, y) in [
        (a.available.cpu, b.available.cpu),
        (a.available.memory, b.available.memory),
        (a.available.bandwidth, b.available.bandwidth),
        (a.available.storage, b.available.storage),
    ] {
        let max = x.max(y);
        if max > 0.0 {
            complementarity += (x - y).abs() / max;
        }
    }
    complementarity /= 4.0;

    (0.4 * overlap + 0.3 * load_balance + 0.3 * complementarity).max(0.3)
}

/// The mesh: nodes, symmetric connections, derived routing table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeshTopology {
    nodes: HashMap<NodeId, MeshNode>,
    connections: HashMap<NodeId, BTreeSet<NodeId>>,
    routing: RoutingTable,
}

impl MeshTopology {
    /// Create an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, connect it to every compatible existing node, and
    /// recompute the routing table.
    ///
    /// Re-adding an existing id replaces the record and re-evaluates its
    /// connections from scratch.
    pub fn add_node(&mut self, node: MeshNode) {
        let id = node.id.clone();
        if self.nodes.contains_key(&id) {
            warn!(node = %id, "Replacing existing node registration");
            self.detach(&id);
        }

        let mut peers = BTreeSet::new();
        for (other_id, other) in &self.nodes {
            let score = compatibility(&node, other);
            if score > CONNECT_THRESHOLD {
                peers.insert(other_id.clone());
            }
            debug!(a = %id, b = %other_id, score, "Compatibility evaluated");
        }

        for peer in &peers {
            self.connections.entry(peer.clone()).or_default().insert(id.clone());
        }
        self.connections.insert(id.clone(), peers);
        self.nodes.insert(id.clone(), node);
        self.routing.rebuild(&self.connections);

        info!(
            node = %id,
            connections = self.connections[&id].len(),
            routes = self.routing.route_count(),
            "Node added"
        );
    }

    /// Remove a node and every reference to it, then recompute routing.
    /// Removing an unknown id is a no-op.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<MeshNode> {
        let node = self.nodes.remove(id);
        if node.is_none() {
            debug!(node = %id, "Remove ignored: node not registered");
            return None;
        }

        self.detach(id);
        self.routing.rebuild(&self.connections);
        info!(node = %id, "Node removed");
        node
    }

    /// Drop the node's connection set and references from other nodes' sets.
    fn detach(&mut self, id: &NodeId) {
        self.connections.remove(id);
        for peers in self.connections.values_mut() {
            peers.remove(id);
        }
    }

    /// Look up a node.
    pub fn node(&self, id: &NodeId) -> Option<&MeshNode> {
        self.nodes.get(id)
    }

    /// Mutable access to a node record.
    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut MeshNode> {
        self.nodes.get_mut(id)
    }

    /// Iterate all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &MeshNode> {
        self.nodes.values()
    }

    /// Mutable iteration over all nodes.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut MeshNode> {
        self.nodes.values_mut()
    }

    /// Nodes currently eligible for work distribution.
    pub fn schedulable_nodes(&self) -> impl Iterator<Item = &MeshNode> {
        self.nodes.values().filter(|n| n.status.is_schedulable())
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no node is registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Direct neighbors of a node.
    pub fn neighbors(&self, id: &NodeId) -> impl Iterator<Item = &NodeId> {
        self.connections.get(id).into_iter().flatten()
    }

    /// True if `a` and `b` are directly connected.
    pub fn are_connected(&self, a: &NodeId, b: &NodeId) -> bool {
        self.connections
            .get(a)
            .map(|peers| peers.contains(b))
            .unwrap_or(false)
    }

    /// The symmetric connection map.
    pub fn connections(&self) -> &HashMap<NodeId, BTreeSet<NodeId>> {
        &self.connections
    }

    /// The derived routing table.
    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    /// Record a heartbeat from a node. An offline node that heartbeats again
    /// returns to active.
    pub fn record_heartbeat(&mut self, id: &NodeId, now: DateTime<Utc>) -> Result<(), MeshError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| MeshError::NodeNotFound(id.clone()))?;
        node.last_heartbeat = now;
        if node.status == NodeStatus::Offline {
            node.status = NodeStatus::Active;
            info!(node = %id, "Node back online");
        }
        Ok(())
    }

    /// Mark nodes offline whose last heartbeat is older than
    /// `HEARTBEAT_MISS_FACTOR x heartbeat_interval`. Connections remain;
    /// distribution skips offline nodes. Returns the newly-offline ids.
    pub fn check_heartbeats(
        &mut self,
        now: DateTime<Utc>,
        heartbeat_interval: std::time::Duration,
    ) -> Vec<NodeId> {
        let timeout = ChronoDuration::from_std(heartbeat_interval)
            .unwrap_or(ChronoDuration::MAX)
            .checked_mul(HEARTBEAT_MISS_FACTOR)
            .unwrap_or(ChronoDuration::MAX);

        let mut timed_out = Vec::new();
        for node in self.nodes.values_mut() {
            if node.status.is_schedulable() && now - node.last_heartbeat > timeout {
                node.status = NodeStatus::Offline;
                timed_out.push(node.id.clone());
            }
        }
        if !timed_out.is_empty() {
            warn!(count = timed_out.len(), "Nodes marked offline after missed heartbeats");
        }
        timed_out
    }

    /// Put a node into (or take it out of) maintenance. Leaving maintenance
    /// refreshes the heartbeat so the node is not immediately timed out.
    pub fn set_maintenance(&mut self, id: &NodeId, enabled: bool) -> Result<(), MeshError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| MeshError::NodeNotFound(id.clone()))?;
        if enabled {
            node.status = NodeStatus::Maintenance;
        } else {
            node.status = NodeStatus::Active;
            node.last_heartbeat = Utc::now();
        }
        info!(node = %id, maintenance = enabled, "Maintenance state changed");
        Ok(())
    }

    /// Mean load over schedulable nodes. `None` when there are none.
    pub fn mean_load(&self) -> Option<f64> {
        let loads: Vec<f64> = self.schedulable_nodes().map(|n| n.current_load).collect();
        if loads.is_empty() {
            None
        } else {
            Some(loads.iter().sum::<f64>() / loads.len() as f64)
        }
    }
}
