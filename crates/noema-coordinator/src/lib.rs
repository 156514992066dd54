//! # Noema Coordinator
//!
//! The top-level handle tying the stack together: one attention engine, one
//! mesh topology, one distribution strategy, plus the background loops that
//! keep them healthy.
//!
//! ## Core Components
//!
//! - [`Coordinator`]: owns all state behind a single write lock and exposes
//!   the async facade (attention, scheduling, mesh membership, distribution)
//! - [`CoordinatorConfig`]: intervals, history capacity, economy parameters
//!   and distribution strategy
//! - [`TopologySnapshot`] / [`PerformanceRecord`] / [`FlowRecord`]:
//!   observability records captured without holding locks across awaits
//!
//! ## Background Loops
//!
//! [`Coordinator::start`] spawns three loops, each stopped by a broadcast
//! shutdown signal:
//!
//! - health: marks nodes offline after three missed heartbeats
//! - metrics: samples a [`PerformanceRecord`] into a bounded history
//! - rebalance: levels load between over- and under-utilized nodes
//!
//! A failed tick is logged and the loop keeps running; only shutdown stops a
//! loop.

pub mod config;
pub mod snapshot;

pub use config::CoordinatorConfig;
pub use snapshot::{FlowRecord, PerformanceRecord, TopologySnapshot};

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use noema_attention::{AttentionEngine, EntityProfile, ImportanceGraph, StimulusContext};
use noema_balancer::{RebalanceResult, Strategy, StrategyKind, distribute_load, rebalance};
use noema_core::{
    AttentionValue, EntityId, MeshNode, NodeId, NoemaResult, ResourceVector, ScheduledTask,
};
use noema_mesh::MeshTopology;
use noema_scheduler::SchedulingResult;
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Everything the facade mutates, behind one lock.
///
/// A single write lock serializes the economy, the topology and the strategy
/// cursor together, so a cycle can never observe a half-applied distribution.
struct CoreState {
    engine: AttentionEngine,
    topology: MeshTopology,
    strategy: Strategy,
}

/// Top-level coordinator. Cheap to share via the `Arc`s it holds internally;
/// callers typically wrap the whole coordinator in an `Arc` as well.
pub struct Coordinator {
    config: CoordinatorConfig,
    state: Arc<RwLock<CoreState>>,
    /// Bounded metrics samples, oldest first.
    performance: Arc<Mutex<VecDeque<PerformanceRecord>>>,
    /// Bounded per-node placement history.
    flows: Arc<DashMap<NodeId, VecDeque<FlowRecord>>>,
    shutdown_tx: broadcast::Sender<()>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Coordinator {
    /// Build a coordinator from validated configuration.
    pub fn new(config: CoordinatorConfig) -> NoemaResult<Self> {
        config.validate()?;
        let engine = AttentionEngine::new(config.economy.clone())?;
        let strategy = Strategy::from_kind(config.strategy);
        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            config,
            state: Arc::new(RwLock::new(CoreState {
                engine,
                topology: MeshTopology::new(),
                strategy,
            })),
            performance: Arc::new(Mutex::new(VecDeque::new())),
            flows: Arc::new(DashMap::new()),
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
        })
    }

    /// The configuration this coordinator runs with.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Spawn the health, metrics and rebalance loops. Idempotent: calling
    /// again while loops are running is a logged no-op.
    pub async fn start(&self) {
        let mut handles = self.handles.lock().await;
        if !handles.is_empty() {
            warn!("Coordinator already started");
            return;
        }

        handles.push(self.spawn_health_loop());
        handles.push(self.spawn_metrics_loop());
        handles.push(self.spawn_rebalance_loop());
        info!(
            health_secs = self.config.health_check_interval.as_secs_f64(),
            metrics_secs = self.config.metrics_interval.as_secs_f64(),
            rebalance_secs = self.config.rebalance_interval.as_secs_f64(),
            "Coordinator started"
        );
    }

    /// Signal all background loops to stop and wait for them to finish.
    pub async fn shutdown(&self) {
        // No receivers just means the loops were never started
        let _ = self.shutdown_tx.send(());

        let handles: Vec<JoinHandle<()>> = self.handles.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Background loop ended abnormally");
            }
        }
        info!("Coordinator shut down");
    }

    fn spawn_health_loop(&self) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let check_interval = self.config.health_check_interval;
        let heartbeat_interval = self.config.heartbeat_interval;

        tokio::spawn(async move {
            info!(
                interval_secs = check_interval.as_secs_f64(),
                "Health loop started"
            );
            let mut interval = tokio::time::interval(check_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Health loop shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let mut state = state.write().await;
                        let timed_out = state
                            .topology
                            .check_heartbeats(Utc::now(), heartbeat_interval);
                        for id in &timed_out {
                            warn!(node = %id, "Node offline after missed heartbeats");
                        }
                    }
                }
            }
        })
    }

    fn spawn_metrics_loop(&self) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let performance = Arc::clone(&self.performance);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let metrics_interval = self.config.metrics_interval;
        let capacity = self.config.history_capacity;

        tokio::spawn(async move {
            info!(
                interval_secs = metrics_interval.as_secs_f64(),
                "Metrics loop started"
            );
            let mut interval = tokio::time::interval(metrics_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Metrics loop shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let record = {
                            let state = state.read().await;
                            sample_performance(&state)
                        };
                        let mut history = performance.lock().await;
                        push_bounded(&mut history, record, capacity);
                    }
                }
            }
        })
    }

    fn spawn_rebalance_loop(&self) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let rebalance_interval = self.config.rebalance_interval;

        tokio::spawn(async move {
            info!(
                interval_secs = rebalance_interval.as_secs_f64(),
                "Rebalance loop started"
            );
            let mut interval = tokio::time::interval(rebalance_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Rebalance loop shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let mut state = state.write().await;
                        rebalance(&mut state.topology);
                    }
                }
            }
        })
    }

    // ---- attention facade ----

    /// Score an entity against a stimulus and store the result.
    pub async fn compute_attention(
        &self,
        profile: &EntityProfile,
        context: &StimulusContext,
    ) -> AttentionValue {
        self.state.write().await.engine.compute_attention(profile, context)
    }

    /// Look up an entity's attention value.
    pub async fn attention(&self, id: &EntityId) -> Option<AttentionValue> {
        self.state.read().await.engine.get(id)
    }

    /// Set an entity's attention value directly, clamped to economy bounds.
    pub async fn set_attention(&self, id: impl Into<EntityId>, value: AttentionValue) {
        self.state.write().await.engine.set(id, value);
    }

    /// Current bank balance.
    pub async fn bank(&self) -> f64 {
        self.state.read().await.engine.bank()
    }

    /// The conserved economic total: `bank + Σ max(0, sti)`.
    pub async fn conserved_total(&self) -> f64 {
        self.state.read().await.engine.store().conserved_total()
    }

    /// Run one full economic cycle over the graph.
    pub async fn run_cycle(&self, graph: &ImportanceGraph) {
        self.state.write().await.engine.run_cycle(graph);
    }

    // ---- scheduling facade ----

    /// Admit a feasible subset of `tasks` within `budget` and the attention
    /// spend cap derived from the current bank.
    pub async fn schedule(
        &self,
        tasks: &[ScheduledTask],
        budget: &ResourceVector,
    ) -> SchedulingResult {
        let state = self.state.read().await;
        noema_scheduler::schedule(tasks, budget, state.engine.bank())
    }

    // ---- mesh facade ----

    /// Register a node, connecting it to compatible peers.
    pub async fn add_node(&self, node: MeshNode) {
        self.state.write().await.topology.add_node(node);
    }

    /// Remove a node and its flow history. Returns the node's last record
    /// if it was registered.
    pub async fn remove_node(&self, id: &NodeId) -> Option<MeshNode> {
        self.flows.remove(id);
        self.state.write().await.topology.remove_node(id)
    }

    /// Record a heartbeat from a node.
    pub async fn record_heartbeat(&self, id: &NodeId) -> NoemaResult<()> {
        self.state
            .write()
            .await
            .topology
            .record_heartbeat(id, Utc::now())?;
        Ok(())
    }

    /// Put a node into (or take it out of) maintenance.
    pub async fn set_maintenance(&self, id: &NodeId, enabled: bool) -> NoemaResult<()> {
        self.state
            .write()
            .await
            .topology
            .set_maintenance(id, enabled)?;
        Ok(())
    }

    /// Capture a point-in-time view of the mesh.
    pub async fn topology_snapshot(&self) -> TopologySnapshot {
        TopologySnapshot::capture(&self.state.read().await.topology)
    }

    // ---- distribution facade ----

    /// Place tasks on schedulable nodes using the configured strategy,
    /// reserve the placed resources and record the flow history.
    ///
    /// Tasks with no feasible node are absent from the result map.
    pub async fn distribute_load(
        &self,
        tasks: &[ScheduledTask],
    ) -> HashMap<NodeId, Vec<ScheduledTask>> {
        let mut state = self.state.write().await;
        let CoreState {
            topology, strategy, ..
        } = &mut *state;

        let placements = distribute_load(tasks, topology, strategy);

        let now = Utc::now();
        for (node_id, placed) in &placements {
            if let Some(node) = topology.node_mut(node_id) {
                for task in placed {
                    if !node.reserve(&task.requirements) {
                        warn!(node = %node_id, task = %task.id, "Reservation exceeded availability");
                    }
                }
            }
            let mut history = self.flows.entry(node_id.clone()).or_default();
            for task in placed {
                push_bounded(
                    &mut history,
                    FlowRecord {
                        timestamp: now,
                        task_id: task.id.clone(),
                        node_id: node_id.clone(),
                        cost: task.attention_cost(),
                    },
                    self.config.history_capacity,
                );
            }
        }
        placements
    }

    /// Run one rebalance pass immediately, outside the background loop.
    pub async fn rebalance(&self) -> RebalanceResult {
        rebalance(&mut self.state.write().await.topology)
    }

    /// Swap the distribution strategy. Takes effect on the next placement.
    pub async fn set_strategy(&self, kind: StrategyKind) {
        let mut state = self.state.write().await;
        if state.strategy.kind() != kind {
            info!(from = ?state.strategy.kind(), to = ?kind, "Distribution strategy changed");
            state.strategy = Strategy::from_kind(kind);
        }
    }

    /// The currently configured distribution strategy.
    pub async fn strategy_kind(&self) -> StrategyKind {
        self.state.read().await.strategy.kind()
    }

    // ---- observability ----

    /// Metrics samples collected so far, oldest first.
    pub async fn performance_history(&self) -> Vec<PerformanceRecord> {
        self.performance.lock().await.iter().cloned().collect()
    }

    /// Placement history for one node, oldest first.
    pub fn flow_history(&self, node: &NodeId) -> Vec<FlowRecord> {
        self.flows
            .get(node)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default()
    }
}

fn sample_performance(state: &CoreState) -> PerformanceRecord {
    PerformanceRecord {
        timestamp: Utc::now(),
        node_count: state.topology.len(),
        schedulable_count: state.topology.schedulable_nodes().count(),
        mean_load: state.topology.mean_load(),
        bank: state.engine.bank(),
        entity_count: state.engine.store().entity_count(),
    }
}

fn push_bounded<T>(history: &mut VecDeque<T>, item: T, capacity: usize) {
    history.push_back(item);
    while history.len() > capacity {
        history.pop_front();
    }
}
