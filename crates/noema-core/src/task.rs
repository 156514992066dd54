//! Task and allocation records.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{NodeId, TaskId};
use crate::resources::ResourceVector;

/// A transient unit of work submitted for admission and placement.
///
/// Tasks are created by a caller and consumed once placed; only the
/// [`ResourceAllocation`] record survives admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: TaskId,
    /// Scheduling priority in `[0, 100]`, typically derived from attention.
    pub priority: u32,
    /// Caller-estimated execution cost, in attention currency units.
    pub estimated_cost: f64,
    pub requirements: ResourceVector,
    /// Capability tags a placement node should offer.
    pub required_capabilities: BTreeSet<String>,
    pub deadline: Option<DateTime<Utc>>,
    /// Caller bookkeeping only; the scheduler does not order by dependencies.
    pub dependencies: Vec<TaskId>,
}

impl ScheduledTask {
    /// Create a task with no capabilities, deadline or dependencies.
    pub fn new(
        id: impl Into<TaskId>,
        priority: u32,
        estimated_cost: f64,
        requirements: ResourceVector,
    ) -> Self {
        Self {
            id: id.into(),
            priority: priority.min(100),
            estimated_cost: estimated_cost.max(0.0),
            requirements,
            required_capabilities: BTreeSet::new(),
            deadline: None,
            dependencies: Vec::new(),
        }
    }

    /// Add a required capability tag.
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.required_capabilities.insert(capability.into());
        self
    }

    /// Set a deadline.
    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Add a dependency on another task.
    pub fn with_dependency(mut self, task: impl Into<TaskId>) -> Self {
        self.dependencies.push(task.into());
        self
    }

    /// Attention cost of admitting this task:
    /// `floor(estimated_cost * (priority/100) * (1 + Σrequirements/1000))`.
    pub fn attention_cost(&self) -> f64 {
        let priority_factor = self.priority as f64 / 100.0;
        let resource_factor = 1.0 + self.requirements.component_sum() / 1000.0;
        (self.estimated_cost * priority_factor * resource_factor).floor()
    }
}

/// Record retained for every task admitted by the scheduler.
///
/// `node_id` is `None` until the task has been placed on a mesh node by
/// distribution; the scheduler admits against a budget, not a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAllocation {
    pub task_id: TaskId,
    pub node_id: Option<NodeId>,
    pub allocated: ResourceVector,
    pub priority: u32,
    pub timestamp: DateTime<Utc>,
}

impl ResourceAllocation {
    /// Record an admission that has not yet been placed.
    pub fn pending(task: &ScheduledTask) -> Self {
        Self {
            task_id: task.id.clone(),
            node_id: None,
            allocated: task.requirements,
            priority: task.priority,
            timestamp: Utc::now(),
        }
    }

    /// Mark the allocation as placed on a node.
    pub fn placed_on(mut self, node: NodeId) -> Self {
        self.node_id = Some(node);
        self
    }
}
