//! Attention scoring inputs.
//!
//! [`EntityProfile`] describes the entity being scored; [`StimulusContext`]
//! describes the observation that triggered scoring. Both are explicit
//! structs so every contribution to an attention value is visible at the
//! call site.

use chrono::{DateTime, Utc};
use noema_core::EntityId;
use serde::{Deserialize, Serialize};

/// Coarse entity category. Determines the LTI baseline and whether the
/// entity counts as structurally critical for VLTI protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityCategory {
    /// Load-bearing for the system itself.
    Core,
    /// Part of a structure other entities hang off.
    Structural,
    /// Does work but is replaceable.
    Functional,
    /// Everything else.
    Peripheral,
}

impl EntityCategory {
    /// LTI baseline contributed by the category.
    pub fn lti_baseline(&self) -> i64 {
        match self {
            EntityCategory::Core => 1_000,
            EntityCategory::Structural => 800,
            EntityCategory::Functional => 600,
            EntityCategory::Peripheral => 400,
        }
    }

    /// Categories whose heavily-activated entities earn VLTI protection.
    pub fn is_structurally_critical(&self) -> bool {
        matches!(self, EntityCategory::Core | EntityCategory::Structural)
    }
}

/// Everything the scorer knows about an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityProfile {
    pub id: EntityId,
    pub category: EntityCategory,
    /// Free-form kind tag, matched against the context's expected kind.
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub activation_count: u64,
    /// Explicitly flagged as critical by the caller; forces VLTI.
    pub flagged_critical: bool,
    /// Embedding for relevance comparison. May be empty.
    pub embedding: Vec<f64>,
}

impl EntityProfile {
    /// Create a profile created and last active now.
    pub fn new(id: impl Into<EntityId>, category: EntityCategory, kind: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            category,
            kind: kind.into(),
            created_at: now,
            last_activity: now,
            activation_count: 0,
            flagged_critical: false,
            embedding: Vec::new(),
        }
    }

    /// Set the activation count.
    pub fn with_activations(mut self, count: u64) -> Self {
        self.activation_count = count;
        self
    }

    /// Mark the entity as critical.
    pub fn with_critical_flag(mut self) -> Self {
        self.flagged_critical = true;
        self
    }

    /// Set the embedding vector.
    pub fn with_embedding(mut self, embedding: Vec<f64>) -> Self {
        self.embedding = embedding;
        self
    }
}

/// The observation that triggered a scoring call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StimulusContext {
    /// Category the current focus expects, if any.
    pub category: Option<EntityCategory>,
    /// Kind tag the current focus expects, if any.
    pub kind: Option<String>,
    /// Embedding of the current focus. May be empty.
    pub embedding: Vec<f64>,
    /// Direct stimulus strength in `[0, 1]`; contributes up to 500 STI.
    pub stimulus_level: f64,
    /// Co-activation strength in `[0, 1]`; contributes up to 300 STI.
    pub activation_level: f64,
    /// When the observation happened. Recency and age are measured against
    /// this instant, keeping scoring deterministic under test.
    pub observed_at: DateTime<Utc>,
}

impl StimulusContext {
    /// A neutral context observed now: no expectations, no stimulus.
    pub fn neutral() -> Self {
        Self {
            category: None,
            kind: None,
            embedding: Vec::new(),
            stimulus_level: 0.0,
            activation_level: 0.0,
            observed_at: Utc::now(),
        }
    }

    /// Set the expected category.
    pub fn with_category(mut self, category: EntityCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Set the expected kind tag.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the focus embedding.
    pub fn with_embedding(mut self, embedding: Vec<f64>) -> Self {
        self.embedding = embedding;
        self
    }

    /// Set the stimulus level (clamped to `[0, 1]`).
    pub fn with_stimulus(mut self, level: f64) -> Self {
        self.stimulus_level = level.clamp(0.0, 1.0);
        self
    }

    /// Set the co-activation level (clamped to `[0, 1]`).
    pub fn with_activation(mut self, level: f64) -> Self {
        self.activation_level = level.clamp(0.0, 1.0);
        self
    }

    /// Set the observation instant.
    pub fn observed_at(mut self, at: DateTime<Utc>) -> Self {
        self.observed_at = at;
        self
    }

    /// Relevance of an entity to this context, in `[0, 1]`:
    /// 0.3 for a categorical match, 0.2 for a kind match, and up to 0.5 from
    /// cosine similarity of the embeddings.
    pub fn relevance_to(&self, profile: &EntityProfile) -> f64 {
        let category_match = match self.category {
            Some(c) if c == profile.category => 0.3,
            _ => 0.0,
        };
        let kind_match = match &self.kind {
            Some(k) if *k == profile.kind => 0.2,
            _ => 0.0,
        };
        let similarity = cosine_similarity(&self.embedding, &profile.embedding);
        category_match + kind_match + 0.5 * similarity
    }
}

/// Cosine similarity of two vectors, clamped to `[0, 1]`.
///
/// Mismatched lengths or empty vectors score zero rather than erroring;
/// relevance simply loses its similarity term.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lti_baselines() {
        assert_eq!(EntityCategory::Core.lti_baseline(), 1_000);
        assert_eq!(EntityCategory::Structural.lti_baseline(), 800);
        assert_eq!(EntityCategory::Functional.lti_baseline(), 600);
        assert_eq!(EntityCategory::Peripheral.lti_baseline(), 400);
    }

    #[test]
    fn test_structurally_critical() {
        assert!(EntityCategory::Core.is_structurally_critical());
        assert!(EntityCategory::Structural.is_structurally_critical());
        assert!(!EntityCategory::Functional.is_structurally_critical());
        assert!(!EntityCategory::Peripheral.is_structurally_critical());
    }

    #[test]
    fn test_cosine_similarity_basic() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_negative_clamped() {
        // Opposed vectors clamp to zero rather than going negative
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_relevance_combines_terms() {
        let profile = EntityProfile::new("e", EntityCategory::Functional, "pattern")
            .with_embedding(vec![1.0, 0.0]);

        let ctx = StimulusContext::neutral()
            .with_category(EntityCategory::Functional)
            .with_kind("pattern")
            .with_embedding(vec![1.0, 0.0]);

        // 0.3 + 0.2 + 0.5 * 1.0
        assert!((ctx.relevance_to(&profile) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_relevance_partial_match() {
        let profile = EntityProfile::new("e", EntityCategory::Core, "pattern");
        let ctx = StimulusContext::neutral().with_kind("pattern");
        // Kind matches, category absent, no embeddings
        assert!((ctx.relevance_to(&profile) - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_stimulus_levels_clamped() {
        let ctx = StimulusContext::neutral().with_stimulus(7.0).with_activation(-3.0);
        assert_eq!(ctx.stimulus_level, 1.0);
        assert_eq!(ctx.activation_level, 0.0);
    }
}
