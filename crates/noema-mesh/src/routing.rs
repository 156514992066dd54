//! All-pairs routing table.
//!
//! The table is derived state: it is recomputed in full from the connection
//! graph whenever the topology changes. Entries exist only for reachable
//! ordered pairs of distinct nodes; unreachability is represented by
//! absence, never by an error.
//!
//! The rebuild runs Floyd-Warshall over unit-weight edges, O(V^3) per edit.
//! Fine at this registry's scale; an incremental update would preserve the
//! same observable paths if edit rates ever grow.

use std::collections::{BTreeSet, HashMap};

use noema_core::NodeId;
use serde::{Deserialize, Serialize};

/// Shortest paths between all reachable node pairs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingTable {
    /// Full path (endpoints included) per reachable ordered pair.
    paths: HashMap<(NodeId, NodeId), Vec<NodeId>>,
}

impl RoutingTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute every path from the connection graph.
    pub fn rebuild(&mut self, connections: &HashMap<NodeId, BTreeSet<NodeId>>) {
        self.paths.clear();

        let ids: Vec<&NodeId> = {
            let mut ids: Vec<&NodeId> = connections.keys().collect();
            ids.sort();
            ids
        };
        let n = ids.len();
        if n == 0 {
            return;
        }
        let index: HashMap<&NodeId, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        const UNREACHABLE: u32 = u32::MAX;
        let mut dist = vec![vec![UNREACHABLE; n]; n];
        let mut next = vec![vec![usize::MAX; n]; n];

        for (i, id) in ids.iter().enumerate() {
            dist[i][i] = 0;
            next[i][i] = i;
            if let Some(neighbors) = connections.get(*id) {
                for neighbor in neighbors {
                    if let Some(&j) = index.get(neighbor) {
                        dist[i][j] = 1;
                        next[i][j] = j;
                    }
                }
            }
        }

        for k in 0..n {
            for i in 0..n {
                if dist[i][k] == UNREACHABLE {
                    continue;
                }
                for j in 0..n {
                    if dist[k][j] == UNREACHABLE {
                        continue;
                    }
                    let through = dist[i][k] + dist[k][j];
                    if through < dist[i][j] {
                        dist[i][j] = through;
                        next[i][j] = next[i][k];
                    }
                }
            }
        }

        for i in 0..n {
            for j in 0..n {
                if i == j || dist[i][j] == UNREACHABLE {
                    continue;
                }
                let mut path = Vec::with_capacity(dist[i][j] as usize + 1);
                let mut at = i;
                path.push(ids[at].clone());
                while at != j {
                    at = next[at][j];
                    path.push(ids[at].clone());
                }
                self.paths.insert((ids[i].clone(), ids[j].clone()), path);
            }
        }
    }

    /// The shortest path from `a` to `b`, endpoints included.
    /// `None` if `b` is unreachable from `a`.
    pub fn path(&self, a: &NodeId, b: &NodeId) -> Option<&[NodeId]> {
        self.paths
            .get(&(a.clone(), b.clone()))
            .map(|p| p.as_slice())
    }

    /// Hop count from `a` to `b`, if reachable.
    pub fn distance(&self, a: &NodeId, b: &NodeId) -> Option<usize> {
        self.path(a, b).map(|p| p.len() - 1)
    }

    /// True if `b` is reachable from `a`.
    pub fn is_reachable(&self, a: &NodeId, b: &NodeId) -> bool {
        self.paths.contains_key(&(a.clone(), b.clone()))
    }

    /// Number of reachable ordered pairs.
    pub fn route_count(&self) -> usize {
        self.paths.len()
    }

    /// True if no pair is reachable.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterate all routes.
    pub fn iter(&self) -> impl Iterator<Item = (&(NodeId, NodeId), &Vec<NodeId>)> {
        self.paths.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &str)]) -> HashMap<NodeId, BTreeSet<NodeId>> {
        let mut connections: HashMap<NodeId, BTreeSet<NodeId>> = HashMap::new();
        for (a, b) in edges {
            let a = NodeId::from(*a);
            let b = NodeId::from(*b);
            connections.entry(a.clone()).or_default().insert(b.clone());
            connections.entry(b).or_default().insert(a);
        }
        connections
    }

    fn with_isolated(
        mut connections: HashMap<NodeId, BTreeSet<NodeId>>,
        ids: &[&str],
    ) -> HashMap<NodeId, BTreeSet<NodeId>> {
        for id in ids {
            connections.entry(NodeId::from(*id)).or_default();
        }
        connections
    }

    #[test]
    fn test_line_graph_paths() {
        let mut table = RoutingTable::new();
        table.rebuild(&graph(&[("a", "b"), ("b", "c")]));

        let path = table.path(&NodeId::from("a"), &NodeId::from("c")).unwrap();
        assert_eq!(
            path,
            &[NodeId::from("a"), NodeId::from("b"), NodeId::from("c")]
        );
        assert_eq!(table.distance(&NodeId::from("a"), &NodeId::from("c")), Some(2));
        assert_eq!(table.distance(&NodeId::from("a"), &NodeId::from("b")), Some(1));
    }

    #[test]
    fn test_shortest_path_preferred() {
        // a-b-c-d plus a direct a-d edge
        let mut table = RoutingTable::new();
        table.rebuild(&graph(&[("a", "b"), ("b", "c"), ("c", "d"), ("a", "d")]));

        assert_eq!(table.distance(&NodeId::from("a"), &NodeId::from("d")), Some(1));
    }

    #[test]
    fn test_unreachable_pairs_absent() {
        let mut table = RoutingTable::new();
        table.rebuild(&with_isolated(graph(&[("a", "b")]), &["c"]));

        assert!(table.is_reachable(&NodeId::from("a"), &NodeId::from("b")));
        assert!(!table.is_reachable(&NodeId::from("a"), &NodeId::from("c")));
        assert!(table.path(&NodeId::from("c"), &NodeId::from("b")).is_none());
        // a<->b in both directions only
        assert_eq!(table.route_count(), 2);
    }

    #[test]
    fn test_no_self_routes() {
        let mut table = RoutingTable::new();
        table.rebuild(&graph(&[("a", "b")]));
        assert!(!table.is_reachable(&NodeId::from("a"), &NodeId::from("a")));
    }

    #[test]
    fn test_rebuild_replaces_previous_state() {
        let mut table = RoutingTable::new();
        table.rebuild(&graph(&[("a", "b"), ("b", "c")]));
        assert!(table.is_reachable(&NodeId::from("a"), &NodeId::from("c")));

        // b disappears, taking the bridge with it
        table.rebuild(&with_isolated(graph(&[]), &["a", "c"]));
        assert!(!table.is_reachable(&NodeId::from("a"), &NodeId::from("c")));
        assert!(table.is_empty());
    }

    #[test]
    fn test_empty_graph() {
        let mut table = RoutingTable::new();
        table.rebuild(&HashMap::new());
        assert!(table.is_empty());
        assert_eq!(table.route_count(), 0);
    }
}
