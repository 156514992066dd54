//! The attention engine: scoring plus the economic cycle.

use noema_core::{AttentionValue, ConfigError, EntityId};
use tracing::{debug, info};

use crate::graph::ImportanceGraph;
use crate::params::EconomyParams;
use crate::profile::{EntityProfile, StimulusContext};
use crate::store::AttentionStore;

/// Per-edge spread cap: no single spread step may move more than this
/// fraction of the source's STI.
const SPREAD_CAP: f64 = 0.1;

/// Owns the attention store and bank, computes attention values and runs the
/// economic cycle.
///
/// The engine is a plain owned structure; the coordinator serializes all
/// mutation through a single write lock. No method here blocks or suspends.
pub struct AttentionEngine {
    params: EconomyParams,
    store: AttentionStore,
}

impl AttentionEngine {
    /// Build an engine from validated parameters.
    ///
    /// Fails fast on malformed bounds or rates; an engine never runs with an
    /// invalid economy.
    pub fn new(params: EconomyParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let store = AttentionStore::new(params.starting_funds);
        Ok(Self { params, store })
    }

    /// The economy parameters this engine runs with.
    pub fn params(&self) -> &EconomyParams {
        &self.params
    }

    /// Read access to the store, for snapshots.
    pub fn store(&self) -> &AttentionStore {
        &self.store
    }

    /// Current bank balance.
    pub fn bank(&self) -> f64 {
        self.store.bank()
    }

    /// Look up an entity's attention value.
    pub fn get(&self, id: &EntityId) -> Option<AttentionValue> {
        self.store.get(id)
    }

    /// Set an entity's attention value directly, clamped to bounds.
    pub fn set(&mut self, id: impl Into<EntityId>, value: AttentionValue) {
        let clamped = AttentionValue {
            sti: self.params.clamp_sti(value.sti),
            lti: self.params.clamp_lti(value.lti),
            vlti: value.vlti,
        };
        self.store.insert(id.into(), clamped);
    }

    /// Score an entity against a stimulus and store the result.
    ///
    /// STI combines recency (up to 1000), frequency (up to 500), direct
    /// stimulus (up to 500), co-activation (up to 300) and context relevance
    /// (up to 200). LTI combines the category baseline, age in days (capped
    /// at 2000) and activation count (capped at 1000). VLTI protection is
    /// granted to explicitly flagged entities and to heavily-activated
    /// structurally-critical ones.
    pub fn compute_attention(
        &mut self,
        profile: &EntityProfile,
        context: &StimulusContext,
    ) -> AttentionValue {
        let seconds_idle = (context.observed_at - profile.last_activity)
            .num_seconds()
            .max(0);
        let recency_bonus = (1_000 - seconds_idle).max(0) as f64;
        let frequency_bonus = profile.activation_count.saturating_mul(10).min(500) as f64;
        let attention_bonus = context.stimulus_level.clamp(0.0, 1.0) * 500.0;
        let activation_bonus = context.activation_level.clamp(0.0, 1.0) * 300.0;
        let relevance = context.relevance_to(profile);

        let raw_sti =
            recency_bonus + frequency_bonus + attention_bonus + activation_bonus + relevance * 200.0;
        let sti = self.params.clamp_sti(raw_sti.floor() as i64);

        let age_days = (context.observed_at - profile.created_at)
            .num_days()
            .max(0)
            .min(2_000);
        let activation_lti = profile.activation_count.saturating_mul(5).min(1_000) as i64;
        let lti = self
            .params
            .clamp_lti(profile.category.lti_baseline() + age_days + activation_lti);

        let vlti = profile.flagged_critical
            || (profile.category.is_structurally_critical() && profile.activation_count > 100);

        let value = AttentionValue { sti, lti, vlti };
        self.store.insert(profile.id.clone(), value);
        value
    }

    /// Spread importance along graph edges.
    ///
    /// For each edge `(u, v, weight)` the offered amount is
    /// `min(sti[u] * spread_rate * weight, sti[u] * 0.1)`; amounts of one
    /// unit or less are not worth moving. The transfer is additionally
    /// limited by the receiver's headroom below `max_sti`, so no currency is
    /// clipped away at the bound. Unknown sources are skipped; unknown
    /// receivers are initialized neutral.
    pub fn spread_importance(&mut self, graph: &ImportanceGraph) -> i64 {
        let mut moved_total = 0i64;

        for edge in graph.edges() {
            let source_sti = match self.store.get(&edge.from) {
                Some(v) => v.sti,
                None => continue,
            };
            if source_sti <= 0 {
                continue;
            }

            let offered = (source_sti as f64 * self.params.spread_rate * edge.weight)
                .min(source_sti as f64 * SPREAD_CAP);
            if offered <= 1.0 {
                continue;
            }
            let offered = offered.floor() as i64;

            self.store.ensure(&edge.to);
            let receiver_sti = self.store.get(&edge.to).map(|v| v.sti).unwrap_or(0);
            let headroom = (self.params.max_sti - receiver_sti).max(0);
            let moved = offered.min(headroom);
            if moved == 0 {
                continue;
            }

            if let Some(source) = self.store.get_mut(&edge.from) {
                source.sti = self.params.clamp_sti(source.sti - moved);
            }
            if let Some(receiver) = self.store.get_mut(&edge.to) {
                receiver.sti = self.params.clamp_sti(receiver.sti + moved);
            }
            moved_total += moved;
        }

        debug!(moved = moved_total, edges = graph.len(), "Importance spread");
        moved_total
    }

    /// Tax every entity with positive STI, moving
    /// `floor(sti * rent_rate)` into the bank. Returns the total collected.
    pub fn collect_rent(&mut self) -> i64 {
        let rate = self.params.rent_rate;
        let mut collected = 0i64;

        for (_, value) in self.store.iter_mut() {
            if value.sti > 0 {
                let rent = (value.sti as f64 * rate).floor() as i64;
                value.sti -= rent;
                collected += rent;
            }
        }

        self.store.deposit(collected as f64);
        debug!(collected, "Rent collected");
        collected
    }

    /// Pay wages from the bank to entities whose LTI exceeds the threshold.
    ///
    /// The wage pool is `bank * wage_rate`, split evenly across candidates
    /// (highest LTI served first, ties broken by id for determinism). A
    /// candidate already at `max_sti` keeps the clamped remainder in the
    /// bank, so wages never destroy currency.
    pub fn pay_wages(&mut self) -> i64 {
        let pool = self.store.bank() * self.params.wage_rate;
        let threshold = self.params.wage_lti_threshold;

        let mut candidates: Vec<(EntityId, i64)> = self
            .store
            .iter()
            .filter(|(_, v)| v.lti > threshold)
            .map(|(id, v)| (id.clone(), v.lti))
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let per_candidate = (pool / candidates.len().max(1) as f64).floor() as i64;
        if per_candidate < 1 {
            return 0;
        }

        let mut paid_total = 0i64;
        for (id, _) in candidates {
            if self.store.bank() < per_candidate as f64 {
                break;
            }
            let granted = if let Some(value) = self.store.get_mut(&id) {
                let old = value.sti;
                value.sti = self.params.clamp_sti(old + per_candidate);
                value.sti - old
            } else {
                0
            };
            if granted > 0 {
                self.store.withdraw(granted as f64);
                paid_total += granted;
            }
        }

        debug!(paid = paid_total, "Wages paid");
        paid_total
    }

    /// Decay all values: `sti = floor(sti * decay_rate)`,
    /// `lti = floor(lti * sqrt(decay_rate))`.
    ///
    /// The positive STI shaved off by decay is returned to the bank, keeping
    /// `bank + Σ max(0, sti)` invariant across cycles.
    pub fn decay(&mut self) -> i64 {
        let rate = self.params.decay_rate;
        let lti_rate = rate.sqrt();
        let min_sti = self.params.min_sti;
        let mut reclaimed = 0i64;

        for (_, value) in self.store.iter_mut() {
            let old_positive = value.sti.max(0);
            value.sti = ((value.sti as f64 * rate).floor() as i64).max(min_sti);
            value.lti = ((value.lti as f64 * lti_rate).floor() as i64).max(0);
            reclaimed += old_positive - value.sti.max(0);
        }

        self.store.deposit(reclaimed as f64);
        debug!(reclaimed, "Decay applied");
        reclaimed
    }

    /// Delete entities whose STI has fallen below the forgetting threshold,
    /// unless protected by VLTI. Returns how many were forgotten.
    pub fn forget(&mut self) -> usize {
        let threshold = self.params.forgetting_threshold;
        let forgotten = self
            .store
            .retain(|_, v| v.vlti || v.sti >= threshold);
        if forgotten > 0 {
            debug!(forgotten, "Entities forgotten");
        }
        forgotten
    }

    /// Run one full economic cycle over the graph, in fixed order:
    /// ensure-initialized, spread, rent, wages, decay, forget.
    ///
    /// Rent and wages must follow spread so redistributed importance is
    /// taxed and rewarded; they must precede decay and forgetting so
    /// freshly-taxed values still decay uniformly.
    pub fn run_cycle(&mut self, graph: &ImportanceGraph) {
        for id in graph.entities() {
            self.store.ensure(id);
        }

        let spread = self.spread_importance(graph);
        let rent = self.collect_rent();
        let wages = self.pay_wages();
        let reclaimed = self.decay();
        let forgotten = self.forget();

        info!(
            spread,
            rent,
            wages,
            reclaimed,
            forgotten,
            bank = self.store.bank(),
            entities = self.store.entity_count(),
            "Attention cycle complete"
        );
    }
}
