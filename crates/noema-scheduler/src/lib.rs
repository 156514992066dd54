//! # Noema Scheduler
//!
//! Turns attention-derived priorities into a feasible task subset.
//!
//! [`schedule`] admits tasks greedily in descending priority order against a
//! resource budget and an attention-spend cap. Admission is all-or-nothing
//! per task; a task that does not fit is *silently excluded* from the result.
//! That exclusion is the documented contract: callers detect rejection by
//! absence, exactly as unreachable pairs are detected by absence from the
//! routing table. No error is raised for an infeasible task.

use noema_core::{ResourceAllocation, ResourceVector, ScheduledTask};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fraction of the bank a single scheduling call may spend on admissions.
pub const ATTENTION_SPEND_CAP: f64 = 0.8;

/// Outcome of one scheduling call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulingResult {
    /// Admitted tasks, in admission order (descending priority, stable).
    pub accepted: Vec<ScheduledTask>,
    /// One allocation record per admitted task, not yet placed on a node.
    pub allocations: Vec<ResourceAllocation>,
    /// Sum of the admitted tasks' raw estimated costs.
    pub total_cost: f64,
    /// Attention currency spent on admission, always `<= 0.8 * bank`.
    pub attention_spent: f64,
    /// Mean consumed fraction of the budget across its non-zero dimensions.
    pub utilization: f64,
}

impl SchedulingResult {
    /// Number of admitted tasks.
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    /// True if a task with this id was admitted.
    pub fn accepted_task(&self, id: &noema_core::TaskId) -> bool {
        self.accepted.iter().any(|t| &t.id == id)
    }
}

/// Admit a feasible subset of `tasks` within `budget` and the attention cap.
///
/// Tasks are considered in descending priority; ties keep input order
/// (stable sort), so results are deterministic. A task is admitted iff:
///
/// 1. its requirements fit the *remaining* budget on every dimension, and
/// 2. the attention already spent plus its cost stays within
///    `0.8 * bank`, where cost is
///    `floor(estimated_cost * (priority/100) * (1 + Σrequirements/1000))`.
///
/// On admission the remaining budget shrinks and a pending
/// [`ResourceAllocation`] is recorded. Everything else is dropped silently.
pub fn schedule(tasks: &[ScheduledTask], budget: &ResourceVector, bank: f64) -> SchedulingResult {
    let mut ordered: Vec<&ScheduledTask> = tasks.iter().collect();
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority));

    let spend_cap = ATTENTION_SPEND_CAP * bank.max(0.0);
    let mut remaining = *budget;
    let mut result = SchedulingResult::default();

    for task in ordered {
        if !task.requirements.fits_within(&remaining) {
            debug!(task = %task.id, "Task excluded: budget exhausted on some dimension");
            continue;
        }
        let cost = task.attention_cost();
        if result.attention_spent + cost > spend_cap {
            debug!(task = %task.id, cost, "Task excluded: attention spend cap reached");
            continue;
        }

        remaining = remaining.saturating_sub(&task.requirements);
        result.attention_spent += cost;
        result.total_cost += task.estimated_cost;
        result.allocations.push(ResourceAllocation::pending(task));
        result.accepted.push(task.clone());
    }

    let consumed = budget.saturating_sub(&remaining);
    result.utilization = consumed.utilization_of(budget);

    debug!(
        submitted = tasks.len(),
        accepted = result.accepted.len(),
        attention_spent = result.attention_spent,
        utilization = result.utilization,
        "Scheduling pass complete"
    );
    result
}
