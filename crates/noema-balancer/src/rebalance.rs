//! Periodic load equalization.

use noema_core::NodeId;
use noema_mesh::MeshTopology;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Distance from the mean load at which a node counts as over- or
/// under-loaded.
pub const REBALANCE_THRESHOLD: f64 = 20.0;

/// Stop migrating between a pair once their load gap falls below this.
const TARGET_GAP: f64 = 10.0;

/// Upper bound on simulated task-units moved between one pair.
const MAX_MOVES_PER_PAIR: u32 = 100;

/// Outcome of one rebalance pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RebalanceResult {
    /// Simulated task-units migrated in total.
    pub moved_tasks: u32,
    /// Nodes that were at least `REBALANCE_THRESHOLD` above the mean.
    pub overloaded: Vec<NodeId>,
    /// Nodes that were at least `REBALANCE_THRESHOLD` below the mean.
    pub underloaded: Vec<NodeId>,
    /// Reduction in mean absolute deviation from the mean load.
    pub utilization_delta: f64,
}

impl RebalanceResult {
    /// True if the pass changed anything.
    pub fn rebalanced(&self) -> bool {
        self.moved_tasks > 0
    }
}

/// Equalize load between over- and under-utilized schedulable nodes.
///
/// Nodes at least 20 load points above the mean are overloaded, at least 20
/// below are underloaded. The heaviest overloaded node is paired with the
/// lightest underloaded one and simulated task-units (one load point each)
/// migrate until the pair's gap drops below 10, then the next pair goes.
/// Only the nodes' load fields move; queued tasks are never touched, so
/// nothing can be lost or duplicated.
pub fn rebalance(topology: &mut MeshTopology) -> RebalanceResult {
    let mean = match topology.mean_load() {
        Some(mean) => mean,
        None => return RebalanceResult::default(),
    };

    let mut overloaded: Vec<NodeId> = Vec::new();
    let mut underloaded: Vec<NodeId> = Vec::new();
    let mut deviation_before = 0.0;
    let mut observed = 0u32;

    for node in topology.schedulable_nodes() {
        deviation_before += (node.current_load - mean).abs();
        observed += 1;
        if node.current_load >= mean + REBALANCE_THRESHOLD {
            overloaded.push(node.id.clone());
        } else if node.current_load <= mean - REBALANCE_THRESHOLD {
            underloaded.push(node.id.clone());
        }
    }
    deviation_before /= observed.max(1) as f64;

    // Heaviest senders first, lightest receivers first
    overloaded.sort_by(|a, b| {
        let la = topology.node(a).map(|n| n.current_load).unwrap_or(0.0);
        let lb = topology.node(b).map(|n| n.current_load).unwrap_or(0.0);
        lb.partial_cmp(&la).unwrap_or(std::cmp::Ordering::Equal)
    });
    underloaded.sort_by(|a, b| {
        let la = topology.node(a).map(|n| n.current_load).unwrap_or(0.0);
        let lb = topology.node(b).map(|n| n.current_load).unwrap_or(0.0);
        la.partial_cmp(&lb).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut moved_tasks = 0u32;
    for (from, to) in overloaded.iter().zip(&underloaded) {
        let mut moved_here = 0u32;
        loop {
            let from_load = topology.node(from).map(|n| n.current_load).unwrap_or(0.0);
            let to_load = topology.node(to).map(|n| n.current_load).unwrap_or(0.0);
            if from_load - to_load < TARGET_GAP || moved_here >= MAX_MOVES_PER_PAIR {
                break;
            }
            if let Some(n) = topology.node_mut(from) {
                let load = n.current_load - 1.0;
                n.set_load(load);
            }
            if let Some(n) = topology.node_mut(to) {
                let load = n.current_load + 1.0;
                n.set_load(load);
            }
            moved_here += 1;
        }
        debug!(from = %from, to = %to, moved = moved_here, "Pair rebalanced");
        moved_tasks += moved_here;
    }

    let mut deviation_after = 0.0;
    for node in topology.schedulable_nodes() {
        deviation_after += (node.current_load - mean).abs();
    }
    deviation_after /= observed.max(1) as f64;

    let result = RebalanceResult {
        moved_tasks,
        overloaded,
        underloaded,
        utilization_delta: deviation_before - deviation_after,
    };
    if result.rebalanced() {
        info!(
            moved = result.moved_tasks,
            overloaded = result.overloaded.len(),
            underloaded = result.underloaded.len(),
            delta = result.utilization_delta,
            "Rebalance pass complete"
        );
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use noema_core::{MeshNode, NodeStatus, ResourceVector};

    fn node(id: &str, load: f64) -> MeshNode {
        let mut n = MeshNode::new(id, ["gpu"], ResourceVector::new(8.0, 16.0, 100.0, 500.0));
        n.set_load(load);
        n
    }

    fn topology(loads: &[(&str, f64)]) -> MeshTopology {
        let mut topo = MeshTopology::new();
        for (id, load) in loads {
            topo.add_node(node(id, *load));
        }
        topo
    }

    #[test]
    fn test_flags_over_and_under_loaded() {
        // Mean = 40; 70 >= 60 overloaded, 20 <= 20 underloaded
        let mut topo = topology(&[("a", 30.0), ("b", 70.0), ("c", 20.0)]);
        let result = rebalance(&mut topo);

        assert_eq!(result.overloaded, vec![NodeId::from("b")]);
        assert_eq!(result.underloaded, vec![NodeId::from("c")]);
        assert!(result.moved_tasks > 0);
    }

    #[test]
    fn test_migrates_until_gap_below_ten() {
        let mut topo = topology(&[("a", 30.0), ("b", 70.0), ("c", 20.0)]);
        let result = rebalance(&mut topo);

        let b = topo.node(&NodeId::from("b")).unwrap().current_load;
        let c = topo.node(&NodeId::from("c")).unwrap().current_load;
        assert!(b - c < 10.0);
        // 70/20 -> gap 50, each move closes 2 -> 21 moves ends at 49/41
        assert_eq!(result.moved_tasks, 21);
        assert_eq!(b, 49.0);
        assert_eq!(c, 41.0);
    }

    #[test]
    fn test_balanced_topology_is_untouched() {
        let mut topo = topology(&[("a", 45.0), ("b", 50.0), ("c", 55.0)]);
        let result = rebalance(&mut topo);

        assert!(!result.rebalanced());
        assert!(result.overloaded.is_empty());
        assert!(result.underloaded.is_empty());
        assert_eq!(topo.node(&NodeId::from("a")).unwrap().current_load, 45.0);
    }

    #[test]
    fn test_utilization_delta_is_positive_after_moves() {
        let mut topo = topology(&[("a", 30.0), ("b", 70.0), ("c", 20.0)]);
        let result = rebalance(&mut topo);
        assert!(result.utilization_delta > 0.0);
    }

    #[test]
    fn test_offline_nodes_excluded() {
        let mut topo = topology(&[("a", 90.0), ("b", 10.0), ("c", 50.0)]);
        topo.node_mut(&NodeId::from("a")).unwrap().status = NodeStatus::Offline;

        let result = rebalance(&mut topo);
        // Without "a", mean of b/c is 30: b is exactly 20 below, c 20 above
        assert!(!result.overloaded.contains(&NodeId::from("a")));
        assert_eq!(topo.node(&NodeId::from("a")).unwrap().current_load, 90.0);
    }

    #[test]
    fn test_empty_topology() {
        let mut topo = MeshTopology::new();
        let result = rebalance(&mut topo);
        assert_eq!(result, RebalanceResult::default());
    }

    #[test]
    fn test_unpaired_overloaded_node_waits() {
        // Two overloaded, one underloaded: only one pair migrates
        let mut topo = topology(&[("hot1", 90.0), ("hot2", 85.0), ("cold", 5.0), ("mid", 60.0)]);
        let result = rebalance(&mut topo);

        assert_eq!(result.overloaded.len(), 2);
        assert_eq!(result.underloaded.len(), 1);
        // hot1 (heaviest) pairs with cold; hot2 is left for a later pass
        assert_eq!(topo.node(&NodeId::from("hot2")).unwrap().current_load, 85.0);
    }
}
