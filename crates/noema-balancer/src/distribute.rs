//! Batch task distribution over the mesh.

use std::collections::HashMap;

use noema_core::{NodeId, ResourceVector, ScheduledTask};
use noema_mesh::MeshTopology;
use tracing::debug;

use crate::strategy::{SelectionStrategy, Strategy};

/// Place each task on a schedulable node, in input order.
///
/// A shadow copy of every node's remaining resources is kept for the whole
/// batch, so two tasks can never be promised the same capacity. For each
/// task the candidates are the schedulable nodes whose shadow remainder
/// still fits it *and* which offer all its required capabilities; the
/// strategy picks among those. Tasks with no feasible node are dropped from
/// the result map; absence is the contract, not an error.
///
/// The topology itself is not mutated; callers apply the returned placement
/// by reserving node resources when they dispatch the work.
pub fn distribute_load(
    tasks: &[ScheduledTask],
    topology: &MeshTopology,
    strategy: &mut Strategy,
) -> HashMap<NodeId, Vec<ScheduledTask>> {
    let mut shadow: HashMap<NodeId, ResourceVector> = topology
        .schedulable_nodes()
        .map(|n| (n.id.clone(), n.available))
        .collect();

    let mut placements: HashMap<NodeId, Vec<ScheduledTask>> = HashMap::new();
    let mut dropped = 0usize;

    for task in tasks {
        let mut candidates: Vec<&noema_core::MeshNode> = topology
            .schedulable_nodes()
            .filter(|n| {
                shadow
                    .get(&n.id)
                    .map(|remaining| task.requirements.fits_within(remaining))
                    .unwrap_or(false)
                    && n.capability_match(&task.required_capabilities) >= 1.0
            })
            .collect();
        // Deterministic candidate order regardless of map iteration
        candidates.sort_by(|a, b| a.id.cmp(&b.id));

        match strategy.select(task, &candidates) {
            Some(node_id) => {
                if let Some(remaining) = shadow.get_mut(&node_id) {
                    *remaining = remaining.saturating_sub(&task.requirements);
                }
                placements.entry(node_id).or_default().push(task.clone());
            }
            None => {
                debug!(task = %task.id, "Task dropped: no feasible node");
                dropped += 1;
            }
        }
    }

    debug!(
        tasks = tasks.len(),
        placed = tasks.len() - dropped,
        dropped,
        nodes = placements.len(),
        "Distribution complete"
    );
    placements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::StrategyKind;
    use noema_core::{MeshNode, NodeStatus};

    fn node(id: &str, cpu: f64) -> MeshNode {
        MeshNode::new(id, ["gpu"], ResourceVector::new(cpu, 100.0, 100.0, 100.0))
    }

    fn cpu_task(id: &str, cpu: f64) -> ScheduledTask {
        ScheduledTask::new(id, 50, 10.0, ResourceVector::new(cpu, 1.0, 1.0, 1.0))
    }

    fn topology(nodes: Vec<MeshNode>) -> MeshTopology {
        let mut topo = MeshTopology::new();
        for n in nodes {
            topo.add_node(n);
        }
        topo
    }

    #[test]
    fn test_all_tasks_placed_when_capacity_allows() {
        let topo = topology(vec![node("a", 10.0), node("b", 10.0)]);
        let tasks = vec![cpu_task("t1", 4.0), cpu_task("t2", 4.0), cpu_task("t3", 4.0)];

        let mut strategy = Strategy::from_kind(StrategyKind::LeastLoaded);
        let placements = distribute_load(&tasks, &topo, &mut strategy);

        let placed: usize = placements.values().map(|v| v.len()).sum();
        assert_eq!(placed, 3);
    }

    #[test]
    fn test_shadow_resources_never_oversubscribed() {
        let topo = topology(vec![node("a", 10.0)]);
        // Each task needs 4 cpu; only two fit in 10
        let tasks: Vec<ScheduledTask> = (0..5).map(|i| cpu_task(&format!("t{i}"), 4.0)).collect();

        let mut strategy = Strategy::from_kind(StrategyKind::PriorityScore);
        let placements = distribute_load(&tasks, &topo, &mut strategy);

        let placed = placements
            .get(&NodeId::from("a"))
            .map(|v| v.len())
            .unwrap_or(0);
        assert_eq!(placed, 2);

        let used: f64 = placements
            .values()
            .flatten()
            .map(|t| t.requirements.cpu)
            .sum();
        assert!(used <= 10.0);
    }

    #[test]
    fn test_infeasible_task_dropped_silently() {
        let topo = topology(vec![node("a", 2.0)]);
        let tasks = vec![cpu_task("huge", 50.0), cpu_task("small", 1.0)];

        let mut strategy = Strategy::default();
        let placements = distribute_load(&tasks, &topo, &mut strategy);

        let all: Vec<&ScheduledTask> = placements.values().flatten().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, noema_core::TaskId::from("small"));
    }

    #[test]
    fn test_offline_nodes_receive_nothing() {
        let mut topo = topology(vec![node("up", 10.0), node("down", 10.0)]);
        topo.node_mut(&NodeId::from("down")).unwrap().status = NodeStatus::Offline;

        let tasks: Vec<ScheduledTask> = (0..4).map(|i| cpu_task(&format!("t{i}"), 1.0)).collect();
        let mut strategy = Strategy::from_kind(StrategyKind::RoundRobin);
        let placements = distribute_load(&tasks, &topo, &mut strategy);

        assert!(!placements.contains_key(&NodeId::from("down")));
        assert_eq!(placements[&NodeId::from("up")].len(), 4);
    }

    #[test]
    fn test_capability_requirements_respected() {
        let mut plain = node("plain", 10.0);
        plain.capabilities.clear();
        let topo = topology(vec![plain, node("gpu-node", 10.0)]);

        let task = cpu_task("t", 1.0).with_capability("gpu");
        let mut strategy = Strategy::default();
        let placements = distribute_load(std::slice::from_ref(&task), &topo, &mut strategy);

        assert!(placements.contains_key(&NodeId::from("gpu-node")));
        assert!(!placements.contains_key(&NodeId::from("plain")));
    }

    #[test]
    fn test_spillover_to_second_node() {
        let topo = topology(vec![node("a", 4.0), node("b", 4.0)]);
        let tasks = vec![cpu_task("t1", 3.0), cpu_task("t2", 3.0)];

        let mut strategy = Strategy::from_kind(StrategyKind::PriorityScore);
        let placements = distribute_load(&tasks, &topo, &mut strategy);

        // Neither node can hold both tasks; each gets one
        assert_eq!(placements.len(), 2);
        for tasks in placements.values() {
            assert_eq!(tasks.len(), 1);
        }
    }

    #[test]
    fn test_empty_topology_drops_everything() {
        let topo = MeshTopology::new();
        let tasks = vec![cpu_task("t", 1.0)];
        let mut strategy = Strategy::default();
        assert!(distribute_load(&tasks, &topo, &mut strategy).is_empty());
    }
}
