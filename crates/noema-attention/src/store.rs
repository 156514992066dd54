//! The attention store: per-entity values plus the bank.
//!
//! The store is a plain owned structure. All mutation happens through the
//! engine, which runs under the coordinator's single-writer lock; the store
//! itself never synchronizes.

use std::collections::HashMap;

use noema_core::{AttentionValue, EntityId};
use serde::{Deserialize, Serialize};

/// Per-entity attention values and the unallocated currency pool.
///
/// Currency enters an entity only as wages and leaves it only as rent or
/// decay, all via the bank. The store exposes raw mutation for the engine;
/// bounds clamping is the engine's job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttentionStore {
    values: HashMap<EntityId, AttentionValue>,
    bank: f64,
}

impl AttentionStore {
    /// Create a store with the given starting bank balance.
    pub fn new(starting_funds: f64) -> Self {
        Self {
            values: HashMap::new(),
            bank: starting_funds.max(0.0),
        }
    }

    /// Current bank balance.
    pub fn bank(&self) -> f64 {
        self.bank
    }

    /// Move currency into the bank.
    pub fn deposit(&mut self, amount: f64) {
        self.bank += amount;
    }

    /// Move currency out of the bank. `false` if the balance is insufficient.
    pub fn withdraw(&mut self, amount: f64) -> bool {
        if self.bank >= amount {
            self.bank -= amount;
            true
        } else {
            false
        }
    }

    /// Look up an entity's value.
    pub fn get(&self, id: &EntityId) -> Option<AttentionValue> {
        self.values.get(id).copied()
    }

    /// Insert or replace an entity's value.
    pub fn insert(&mut self, id: EntityId, value: AttentionValue) {
        self.values.insert(id, value);
    }

    /// Insert a neutral value if the entity is unknown.
    pub fn ensure(&mut self, id: &EntityId) {
        if !self.values.contains_key(id) {
            self.values.insert(id.clone(), AttentionValue::default());
        }
    }

    /// Remove an entity. Returns its last value if it existed.
    pub fn remove(&mut self, id: &EntityId) -> Option<AttentionValue> {
        self.values.remove(id)
    }

    /// Mutable access for the engine's cycle phases.
    pub(crate) fn get_mut(&mut self, id: &EntityId) -> Option<&mut AttentionValue> {
        self.values.get_mut(id)
    }

    /// Iterate over all entities and values.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &AttentionValue)> {
        self.values.iter()
    }

    /// Mutable iteration for the engine's cycle phases.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&EntityId, &mut AttentionValue)> {
        self.values.iter_mut()
    }

    /// Drop entities failing `keep`. Returns how many were removed.
    pub(crate) fn retain(&mut self, keep: impl Fn(&EntityId, &AttentionValue) -> bool) -> usize {
        let before = self.values.len();
        self.values.retain(|id, v| keep(id, v));
        before - self.values.len()
    }

    /// Number of tracked entities.
    pub fn entity_count(&self) -> usize {
        self.values.len()
    }

    /// `Σ max(0, sti)` over all entities. Together with the bank this is the
    /// conserved quantity of the economy.
    pub fn positive_sti_total(&self) -> i64 {
        self.values.values().map(|v| v.positive_sti()).sum()
    }

    /// The conserved total: `bank + Σ max(0, sti)`.
    pub fn conserved_total(&self) -> f64 {
        self.bank + self.positive_sti_total() as f64
    }
}
