//! Resource quadruple shared by requirements, budgets and capacities.

use serde::{Deserialize, Serialize};

/// A non-negative cpu/memory/bandwidth/storage quadruple.
///
/// The same type describes what a task needs, what a node offers, and what a
/// scheduling call may spend. Units are caller-defined; all comparisons are
/// per-dimension.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceVector {
    pub cpu: f64,
    pub memory: f64,
    pub bandwidth: f64,
    pub storage: f64,
}

impl ResourceVector {
    /// Create a resource vector, clamping negative components to zero.
    pub fn new(cpu: f64, memory: f64, bandwidth: f64, storage: f64) -> Self {
        Self {
            cpu: cpu.max(0.0),
            memory: memory.max(0.0),
            bandwidth: bandwidth.max(0.0),
            storage: storage.max(0.0),
        }
    }

    /// The zero vector.
    pub fn zero() -> Self {
        Self::default()
    }

    /// True if every component of `self` fits within `other`.
    pub fn fits_within(&self, other: &Self) -> bool {
        self.cpu <= other.cpu
            && self.memory <= other.memory
            && self.bandwidth <= other.bandwidth
            && self.storage <= other.storage
    }

    /// Component-wise subtraction; `None` if any component would go negative.
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        if other.fits_within(self) {
            Some(Self {
                cpu: self.cpu - other.cpu,
                memory: self.memory - other.memory,
                bandwidth: self.bandwidth - other.bandwidth,
                storage: self.storage - other.storage,
            })
        } else {
            None
        }
    }

    /// Component-wise subtraction, clamping at zero.
    pub fn saturating_sub(&self, other: &Self) -> Self {
        Self {
            cpu: (self.cpu - other.cpu).max(0.0),
            memory: (self.memory - other.memory).max(0.0),
            bandwidth: (self.bandwidth - other.bandwidth).max(0.0),
            storage: (self.storage - other.storage).max(0.0),
        }
    }

    /// Component-wise addition.
    pub fn saturating_add(&self, other: &Self) -> Self {
        Self {
            cpu: self.cpu + other.cpu,
            memory: self.memory + other.memory,
            bandwidth: self.bandwidth + other.bandwidth,
            storage: self.storage + other.storage,
        }
    }

    /// Sum of all four components.
    pub fn component_sum(&self) -> f64 {
        self.cpu + self.memory + self.bandwidth + self.storage
    }

    /// True if every component is zero.
    pub fn is_zero(&self) -> bool {
        self.component_sum() == 0.0
    }

    /// Mean consumed fraction of `budget` across dimensions with a non-zero
    /// budget. Dimensions the budget does not offer are skipped.
    pub fn utilization_of(&self, budget: &Self) -> f64 {
        let mut total = 0.0;
        let mut dims = 0u32;
        for (used, avail) in [
            (self.cpu, budget.cpu),
            (self.memory, budget.memory),
            (self.bandwidth, budget.bandwidth),
            (self.storage, budget.storage),
        ] {
            if avail > 0.0 {
                total += (used / avail).min(1.0);
                dims += 1;
            }
        }
        if dims == 0 { 0.0 } else { total / dims as f64 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clamps_negative() {
        let r = ResourceVector::new(-1.0, 2.0, -0.5, 3.0);
        assert_eq!(r.cpu, 0.0);
        assert_eq!(r.memory, 2.0);
        assert_eq!(r.bandwidth, 0.0);
        assert_eq!(r.storage, 3.0);
    }

    #[test]
    fn test_fits_within() {
        let small = ResourceVector::new(1.0, 1.0, 1.0, 1.0);
        let big = ResourceVector::new(2.0, 2.0, 2.0, 2.0);
        assert!(small.fits_within(&big));
        assert!(!big.fits_within(&small));
        assert!(small.fits_within(&small));
    }

    #[test]
    fn test_fits_within_fails_on_single_dimension() {
        let req = ResourceVector::new(1.0, 1.0, 5.0, 1.0);
        let budget = ResourceVector::new(10.0, 10.0, 4.0, 10.0);
        assert!(!req.fits_within(&budget));
    }

    #[test]
    fn test_checked_sub() {
        let a = ResourceVector::new(5.0, 5.0, 5.0, 5.0);
        let b = ResourceVector::new(2.0, 3.0, 5.0, 0.0);

        let diff = a.checked_sub(&b).unwrap();
        assert_eq!(diff.cpu, 3.0);
        assert_eq!(diff.memory, 2.0);
        assert_eq!(diff.bandwidth, 0.0);
        assert_eq!(diff.storage, 5.0);

        // Underflow on one dimension fails the whole subtraction
        let too_big = ResourceVector::new(6.0, 0.0, 0.0, 0.0);
        assert!(a.checked_sub(&too_big).is_none());
    }

    #[test]
    fn test_component_sum_and_zero() {
        assert!(ResourceVector::zero().is_zero());
        let r = ResourceVector::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(r.component_sum(), 10.0);
        assert!(!r.is_zero());
    }

    #[test]
    fn test_utilization_skips_empty_dimensions() {
        let used = ResourceVector::new(5.0, 0.0, 0.0, 0.0);
        let budget = ResourceVector::new(10.0, 0.0, 0.0, 0.0);
        assert_eq!(used.utilization_of(&budget), 0.5);

        // No budget at all
        assert_eq!(used.utilization_of(&ResourceVector::zero()), 0.0);
    }
}
