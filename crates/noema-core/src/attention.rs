//! Attention value type.
//!
//! Every tracked entity carries one [`AttentionValue`], owned exclusively by
//! the attention store: values are created on first computation and deleted
//! when the entity is forgotten.

use serde::{Deserialize, Serialize};

/// Economic importance of one entity.
///
/// - `sti` (short-term importance) is the spendable currency: it is spread
///   along graph edges, taxed as rent, rewarded as wages and decays each
///   cycle. Bounded to the configured `[min_sti, max_sti]`.
/// - `lti` (long-term importance) accrues with age and activity, decays
///   slowly, and qualifies the entity for wages. Bounded to `[0, max_lti]`.
/// - `vlti` (very-long-term importance) is a protection flag: a `vlti`
///   entity is never forgotten regardless of how low its `sti` falls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttentionValue {
    pub sti: i64,
    pub lti: i64,
    pub vlti: bool,
}

impl AttentionValue {
    /// Create an attention value. Bounds are enforced by the store, not here.
    pub fn new(sti: i64, lti: i64, vlti: bool) -> Self {
        Self { sti, lti, vlti }
    }

    /// The positive portion of STI, as counted by the conservation invariant
    /// `bank + Σ max(0, sti)`.
    pub fn positive_sti(&self) -> i64 {
        self.sti.max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_neutral() {
        let v = AttentionValue::default();
        assert_eq!(v.sti, 0);
        assert_eq!(v.lti, 0);
        assert!(!v.vlti);
    }

    #[test]
    fn test_positive_sti() {
        assert_eq!(AttentionValue::new(100, 0, false).positive_sti(), 100);
        assert_eq!(AttentionValue::new(-300, 0, false).positive_sti(), 0);
    }
}
