//! Configuration for the coordinator.

use std::time::Duration;

use noema_attention::EconomyParams;
use noema_balancer::StrategyKind;
use noema_core::ConfigError;

/// Configuration for a [`Coordinator`](crate::Coordinator).
///
/// Intervals drive the background loops; the economy parameters are
/// validated when the coordinator is built, so a coordinator never runs
/// with a malformed economy.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Expected time between heartbeats from a healthy node. A node is
    /// marked offline after missing three of these.
    pub heartbeat_interval: Duration,
    /// How often the health loop scans for missed heartbeats.
    pub health_check_interval: Duration,
    /// How often the metrics loop samples a performance record.
    pub metrics_interval: Duration,
    /// How often the rebalance loop levels node loads.
    pub rebalance_interval: Duration,
    /// Maximum entries retained per history buffer (performance records,
    /// per-node flow records). Oldest entries are evicted first.
    pub history_capacity: usize,
    /// Attention economy parameters.
    pub economy: EconomyParams,
    /// Node selection strategy for task distribution.
    pub strategy: StrategyKind,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(10),
            health_check_interval: Duration::from_secs(5),
            metrics_interval: Duration::from_secs(30),
            rebalance_interval: Duration::from_secs(60),
            history_capacity: 256,
            economy: EconomyParams::default(),
            strategy: StrategyKind::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Set the expected heartbeat interval.
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Set the health check interval.
    pub fn with_health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    /// Set the metrics sampling interval.
    pub fn with_metrics_interval(mut self, interval: Duration) -> Self {
        self.metrics_interval = interval;
        self
    }

    /// Set the rebalance interval.
    pub fn with_rebalance_interval(mut self, interval: Duration) -> Self {
        self.rebalance_interval = interval;
        self
    }

    /// Set the per-buffer history capacity.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Set the economy parameters.
    pub fn with_economy(mut self, economy: EconomyParams) -> Self {
        self.economy = economy;
        self
    }

    /// Set the distribution strategy.
    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    /// Check interval sanity. Economy parameters are validated separately
    /// when the attention engine is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let intervals = [
            ("heartbeat_interval", self.heartbeat_interval),
            ("health_check_interval", self.health_check_interval),
            ("metrics_interval", self.metrics_interval),
            ("rebalance_interval", self.rebalance_interval),
        ];
        for (name, interval) in intervals {
            if interval.is_zero() {
                return Err(ConfigError::ZeroInterval { name });
            }
        }
        Ok(())
    }
}
