//! Economy parameters.
//!
//! All bounds and rates driving the attention economy live here and are
//! validated once, at engine construction. A bad configuration never
//! produces a running engine.

use noema_core::ConfigError;
use serde::{Deserialize, Serialize};

/// Bounds and rates for the attention economy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomyParams {
    /// Lower STI bound. May be negative (debt).
    pub min_sti: i64,
    /// Upper STI bound.
    pub max_sti: i64,
    /// Upper LTI bound. LTI is never negative.
    pub max_lti: i64,
    /// Fraction of a source's STI offered along each outgoing edge per
    /// spread pass, before the 10% per-edge cap.
    pub spread_rate: f64,
    /// Fraction of positive STI taxed into the bank each cycle.
    pub rent_rate: f64,
    /// Fraction of the bank paid out as wages each cycle.
    pub wage_rate: f64,
    /// Minimum LTI to qualify for wages.
    pub wage_lti_threshold: i64,
    /// Multiplicative STI decay per cycle; LTI decays by its square root.
    pub decay_rate: f64,
    /// Entities with STI below this (and no VLTI protection) are forgotten.
    pub forgetting_threshold: i64,
    /// Initial bank balance.
    pub starting_funds: f64,
}

impl Default for EconomyParams {
    fn default() -> Self {
        Self {
            min_sti: -1_000,
            max_sti: 10_000,
            max_lti: 10_000,
            spread_rate: 0.1,
            rent_rate: 0.01,
            wage_rate: 0.05,
            wage_lti_threshold: 500,
            decay_rate: 0.95,
            forgetting_threshold: -500,
            starting_funds: 10_000.0,
        }
    }
}

impl EconomyParams {
    /// Validate bounds and rates. Called by the engine constructor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_sti > self.max_sti {
            return Err(ConfigError::InvalidStiBounds {
                min: self.min_sti,
                max: self.max_sti,
            });
        }
        if self.max_lti < 0 {
            return Err(ConfigError::InvalidLtiBound(self.max_lti));
        }
        for (name, value) in [
            ("spread_rate", self.spread_rate),
            ("rent_rate", self.rent_rate),
            ("wage_rate", self.wage_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidRate { name, value });
            }
        }
        if !(self.decay_rate > 0.0 && self.decay_rate <= 1.0) {
            return Err(ConfigError::InvalidDecayRate(self.decay_rate));
        }
        Ok(())
    }

    /// Set the STI bounds.
    pub fn with_sti_bounds(mut self, min: i64, max: i64) -> Self {
        self.min_sti = min;
        self.max_sti = max;
        self
    }

    /// Set the spread rate.
    pub fn with_spread_rate(mut self, rate: f64) -> Self {
        self.spread_rate = rate;
        self
    }

    /// Set the rent rate.
    pub fn with_rent_rate(mut self, rate: f64) -> Self {
        self.rent_rate = rate;
        self
    }

    /// Set the wage rate.
    pub fn with_wage_rate(mut self, rate: f64) -> Self {
        self.wage_rate = rate;
        self
    }

    /// Set the decay rate.
    pub fn with_decay_rate(mut self, rate: f64) -> Self {
        self.decay_rate = rate;
        self
    }

    /// Set the forgetting threshold.
    pub fn with_forgetting_threshold(mut self, threshold: i64) -> Self {
        self.forgetting_threshold = threshold;
        self
    }

    /// Set the initial bank balance.
    pub fn with_starting_funds(mut self, funds: f64) -> Self {
        self.starting_funds = funds.max(0.0);
        self
    }

    /// Clamp an STI value to the configured bounds.
    pub fn clamp_sti(&self, sti: i64) -> i64 {
        sti.clamp(self.min_sti, self.max_sti)
    }

    /// Clamp an LTI value to `[0, max_lti]`.
    pub fn clamp_lti(&self, lti: i64) -> i64 {
        lti.clamp(0, self.max_lti)
    }
}
