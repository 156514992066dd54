//! Node selection strategies.
//!
//! A strategy picks one node from a candidate slice for a given task. The
//! candidates a strategy sees are already schedulable and already known to
//! fit the task; the strategy only expresses *preference*.

use noema_core::{MeshNode, NodeId, ScheduledTask};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Pluggable node selection.
pub trait SelectionStrategy {
    /// Choose a node for `task` from `candidates`, or `None` if the slice is
    /// empty.
    fn select(&mut self, task: &ScheduledTask, candidates: &[&MeshNode]) -> Option<NodeId>;
}

/// Which built-in strategy to run. Configuration-friendly mirror of
/// [`Strategy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrategyKind {
    RoundRobin,
    LeastLoaded,
    WeightedRandom,
    #[default]
    PriorityScore,
}

/// Enum-dispatched strategy holding any built-in implementation.
#[derive(Debug)]
pub enum Strategy {
    RoundRobin(RoundRobin),
    LeastLoaded(LeastLoaded),
    WeightedRandom(WeightedRandom),
    PriorityScore(PriorityScore),
}

impl Strategy {
    /// Instantiate a built-in strategy.
    pub fn from_kind(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::RoundRobin => Strategy::RoundRobin(RoundRobin::default()),
            StrategyKind::LeastLoaded => Strategy::LeastLoaded(LeastLoaded),
            StrategyKind::WeightedRandom => Strategy::WeightedRandom(WeightedRandom),
            StrategyKind::PriorityScore => Strategy::PriorityScore(PriorityScore),
        }
    }

    /// The kind of this strategy.
    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::RoundRobin(_) => StrategyKind::RoundRobin,
            Strategy::LeastLoaded(_) => StrategyKind::LeastLoaded,
            Strategy::WeightedRandom(_) => StrategyKind::WeightedRandom,
            Strategy::PriorityScore(_) => StrategyKind::PriorityScore,
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::from_kind(StrategyKind::default())
    }
}

impl SelectionStrategy for Strategy {
    fn select(&mut self, task: &ScheduledTask, candidates: &[&MeshNode]) -> Option<NodeId> {
        match self {
            Strategy::RoundRobin(s) => s.select(task, candidates),
            Strategy::LeastLoaded(s) => s.select(task, candidates),
            Strategy::WeightedRandom(s) => s.select(task, candidates),
            Strategy::PriorityScore(s) => s.select(task, candidates),
        }
    }
}

/// Cycles through candidates in call order.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: usize,
}

impl SelectionStrategy for RoundRobin {
    fn select(&mut self, _task: &ScheduledTask, candidates: &[&MeshNode]) -> Option<NodeId> {
        if candidates.is_empty() {
            return None;
        }
        let chosen = candidates[self.cursor % candidates.len()].id.clone();
        self.cursor = self.cursor.wrapping_add(1);
        Some(chosen)
    }
}

/// Always picks the candidate with the lowest current load.
#[derive(Debug, Default)]
pub struct LeastLoaded;

impl SelectionStrategy for LeastLoaded {
    fn select(&mut self, _task: &ScheduledTask, candidates: &[&MeshNode]) -> Option<NodeId> {
        candidates
            .iter()
            .min_by(|a, b| {
                a.current_load
                    .partial_cmp(&b.current_load)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .map(|n| n.id.clone())
    }
}

/// Random pick weighted by spare load: a node at load 20 is four times as
/// likely as a node at load 80.
#[derive(Debug, Default)]
pub struct WeightedRandom;

impl SelectionStrategy for WeightedRandom {
    fn select(&mut self, _task: &ScheduledTask, candidates: &[&MeshNode]) -> Option<NodeId> {
        if candidates.is_empty() {
            return None;
        }
        // Floor of 1 keeps fully loaded nodes selectable with low odds
        let weights: Vec<f64> = candidates
            .iter()
            .map(|n| (100.0 - n.current_load).max(1.0))
            .collect();
        let total: f64 = weights.iter().sum();

        let mut roll = rand::rng().random_range(0.0..total);
        for (node, weight) in candidates.iter().zip(&weights) {
            if roll < *weight {
                return Some(node.id.clone());
            }
            roll -= weight;
        }
        // Floating point rounding at the upper end lands on the last candidate
        candidates.last().map(|n| n.id.clone())
    }
}

/// Composite score: 0.4 x spare load + 0.3 x resource fit +
/// 0.3 x capability match. Highest score wins, ties broken by id.
#[derive(Debug, Default)]
pub struct PriorityScore;

impl PriorityScore {
    /// Score one candidate for a task, in `[0, 1]`.
    pub fn score(task: &ScheduledTask, node: &MeshNode) -> f64 {
        let spare_load = 1.0 - node.current_load / 100.0;
        let resource_fit = resource_fit(task, node);
        let capability = node.capability_match(&task.required_capabilities);
        0.4 * spare_load + 0.3 * resource_fit + 0.3 * capability
    }
}

/// How comfortably the node's availability covers the task's requirements:
/// mean over requirement dimensions of `min(1, available / required)`.
/// A task with no requirements fits perfectly.
fn resource_fit(task: &ScheduledTask, node: &MeshNode) -> f64 {
    let pairs = [
        (task.requirements.cpu, node.available.cpu),
        (task.requirements.memory, node.available.memory),
        (task.requirements.bandwidth, node.available.bandwidth),
        (task.requirements.storage, node.available.storage),
    ];
    let mut total = 0.0;
    let mut dims = 0u32;
    for (required, available) in pairs {
        if required > 0.0 {
            total += (available / required).min(1.0);
            dims += 1;
        }
    }
    if dims == 0 { 1.0 } else { total / dims as f64 }
}

impl SelectionStrategy for PriorityScore {
    fn select(&mut self, task: &ScheduledTask, candidates: &[&MeshNode]) -> Option<NodeId> {
        candidates
            .iter()
            .max_by(|a, b| {
                Self::score(task, a)
                    .partial_cmp(&Self::score(task, b))
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.id.cmp(&a.id))
            })
            .map(|n| n.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use noema_core::ResourceVector;

    fn node(id: &str, load: f64) -> MeshNode {
        let mut n = MeshNode::new(id, ["gpu"], ResourceVector::new(8.0, 16.0, 100.0, 500.0));
        n.set_load(load);
        n
    }

    fn task() -> ScheduledTask {
        ScheduledTask::new("t", 50, 10.0, ResourceVector::new(1.0, 1.0, 1.0, 1.0))
    }

    #[test]
    fn test_round_robin_cycles() {
        let a = node("a", 0.0);
        let b = node("b", 0.0);
        let candidates = vec![&a, &b];

        let mut rr = RoundRobin::default();
        let t = task();
        assert_eq!(rr.select(&t, &candidates), Some(NodeId::from("a")));
        assert_eq!(rr.select(&t, &candidates), Some(NodeId::from("b")));
        assert_eq!(rr.select(&t, &candidates), Some(NodeId::from("a")));
    }

    #[test]
    fn test_least_loaded_picks_minimum() {
        let a = node("a", 80.0);
        let b = node("b", 20.0);
        let c = node("c", 50.0);
        let candidates = vec![&a, &b, &c];

        let mut ll = LeastLoaded;
        assert_eq!(ll.select(&task(), &candidates), Some(NodeId::from("b")));
    }

    #[test]
    fn test_least_loaded_tie_breaks_by_id() {
        let b = node("b", 20.0);
        let a = node("a", 20.0);
        let candidates = vec![&b, &a];

        let mut ll = LeastLoaded;
        assert_eq!(ll.select(&task(), &candidates), Some(NodeId::from("a")));
    }

    #[test]
    fn test_weighted_random_always_returns_a_candidate() {
        let a = node("a", 99.0);
        let b = node("b", 1.0);
        let candidates = vec![&a, &b];

        let mut wr = WeightedRandom;
        for _ in 0..50 {
            let picked = wr.select(&task(), &candidates).unwrap();
            assert!(picked == NodeId::from("a") || picked == NodeId::from("b"));
        }
    }

    #[test]
    fn test_weighted_random_favors_idle_nodes() {
        let busy = node("busy", 99.0);
        let idle = node("idle", 0.0);
        let candidates = vec![&busy, &idle];

        let mut wr = WeightedRandom;
        let t = task();
        let idle_picks = (0..500)
            .filter(|_| wr.select(&t, &candidates) == Some(NodeId::from("idle")))
            .count();
        // idle weight 100 vs busy weight 1; even a loose bound shows the bias
        assert!(idle_picks > 350, "idle picked only {idle_picks}/500");
    }

    #[test]
    fn test_priority_score_components() {
        let t = ScheduledTask::new("t", 50, 10.0, ResourceVector::new(4.0, 0.0, 0.0, 0.0))
            .with_capability("gpu");

        let idle = node("idle", 0.0);
        // spare 1.0, fit min(1, 8/4)=1, caps 1 -> 0.4 + 0.3 + 0.3 = 1.0
        assert!((PriorityScore::score(&t, &idle) - 1.0).abs() < 1e-9);

        let mut weak = node("weak", 50.0);
        weak.capabilities.clear();
        weak.available.cpu = 2.0;
        // spare 0.5, fit 0.5, caps 0 -> 0.2 + 0.15 + 0 = 0.35
        assert!((PriorityScore::score(&t, &weak) - 0.35).abs() < 1e-9);
    }

    #[test]
    fn test_priority_score_selects_best() {
        let t = task();
        let good = node("good", 10.0);
        let bad = node("bad", 90.0);
        let candidates = vec![&bad, &good];

        let mut ps = PriorityScore;
        assert_eq!(ps.select(&t, &candidates), Some(NodeId::from("good")));
    }

    #[test]
    fn test_empty_candidates() {
        let t = task();
        assert_eq!(Strategy::default().select(&t, &[]), None);
        assert_eq!(RoundRobin::default().select(&t, &[]), None);
        assert_eq!(LeastLoaded.select(&t, &[]), None);
        assert_eq!(WeightedRandom.select(&t, &[]), None);
        assert_eq!(PriorityScore.select(&t, &[]), None);
    }

    #[test]
    fn test_strategy_kind_round_trip() {
        for kind in [
            StrategyKind::RoundRobin,
            StrategyKind::LeastLoaded,
            StrategyKind::WeightedRandom,
            StrategyKind::PriorityScore,
        ] {
            assert_eq!(Strategy::from_kind(kind).kind(), kind);
        }
    }
}
