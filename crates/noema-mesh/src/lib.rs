//! # Noema Mesh
//!
//! Node registry and topology for the work mesh.
//!
//! ## Core Components
//!
//! - [`MeshTopology`]: node registry plus a symmetric compatibility graph
//! - [`RoutingTable`]: all-pairs shortest paths, fully derived from the graph
//! - heartbeat health tracking (timeout -> offline, resume -> active)
//!
//! Nodes are in-process records; there is no transport here. Connections are
//! formed automatically when two nodes' compatibility score exceeds a
//! threshold, and the routing table is recomputed from scratch on every
//! topology edit; unreachable pairs are simply absent from it.

pub mod routing;
pub mod topology;

pub use routing::RoutingTable;
pub use topology::{compatibility, MeshTopology, CONNECT_THRESHOLD, HEARTBEAT_MISS_FACTOR};

// Re-export the node types callers always use alongside the topology
pub use noema_core::{MeshError, MeshNode, NodeId, NodeStatus};
