//! # Pre-Trade Risk Checks
//!
//! Limit checks applied to every order before it reaches the execution
//! simulator. A violation rejects the order and emits a risk event; it never
//! aborts the run.

use crate::portfolio::PortfolioState;
use serde::{Deserialize, Serialize};
use sigmasim_models::Order;
use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

fn default_max_open_positions() -> usize {
    50
}

fn default_max_order_quantity() -> u32 {
    100
}

fn default_max_group_positions() -> usize {
    20
}

fn default_buying_power_ratio() -> f64 {
    1.0
}

/// Risk limits. All limits are per-run static configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Maximum simultaneously open (symbol, strategy) positions.
    pub max_open_positions: usize,
    /// Maximum contracts on a single order.
    pub max_order_quantity: u32,
    /// Maximum open positions within one correlation group.
    pub max_group_positions: usize,
    /// Underlying → correlation group. Untabled underlyings form their own
    /// single-member group.
    pub correlation_groups: HashMap<String, String>,
    /// Fraction of cash an opening order's estimated cost may consume.
    pub buying_power_ratio: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_open_positions: default_max_open_positions(),
            max_order_quantity: default_max_order_quantity(),
            max_group_positions: default_max_group_positions(),
            correlation_groups: HashMap::new(),
            buying_power_ratio: default_buying_power_ratio(),
        }
    }
}

/// Why an order failed pre-trade checks.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RiskViolation {
    #[error("open position limit reached ({limit})")]
    PositionLimit { limit: usize },

    #[error("order quantity {quantity} exceeds limit {limit}")]
    OrderQuantity { quantity: u32, limit: u32 },

    #[error("correlation group '{group}' at position limit ({limit})")]
    GroupLimit { group: String, limit: usize },

    #[error("estimated cost {cost:.2} exceeds buying power {available:.2}")]
    BuyingPower { cost: f64, available: f64 },
}

/// Stateless check runner over the configured limits.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    config: RiskConfig,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Correlation group of an underlying.
    pub fn group_of(&self, underlying: &str) -> String {
        self.config
            .correlation_groups
            .get(underlying)
            .cloned()
            .unwrap_or_else(|| underlying.to_string())
    }

    /// Runs every check in order; the first violation wins.
    ///
    /// `estimated_cost` is the worst-case debit of the order (premium plus
    /// frictions); only buys consume buying power.
    ///
    /// # Errors
    /// The violated limit. The caller rejects the order and continues.
    pub fn check_order(
        &self,
        order: &Order,
        estimated_cost: f64,
        portfolio: &PortfolioState,
    ) -> Result<(), RiskViolation> {
        if order.quantity > self.config.max_order_quantity {
            let violation = RiskViolation::OrderQuantity {
                quantity: order.quantity,
                limit: self.config.max_order_quantity,
            };
            warn!(order_id = %order.id, %violation, "order rejected by risk");
            return Err(violation);
        }

        // Limits on position count apply only to orders opening a new key.
        let opens_new = portfolio.position(&order.position_key()).is_none();
        if opens_new && portfolio.open_positions() >= self.config.max_open_positions {
            let violation = RiskViolation::PositionLimit {
                limit: self.config.max_open_positions,
            };
            warn!(order_id = %order.id, %violation, "order rejected by risk");
            return Err(violation);
        }

        if opens_new {
            let group = self.group_of(&order.contract.underlying);
            let in_group = portfolio.positions_in_group(&group, |u| self.group_of(u));
            if in_group >= self.config.max_group_positions {
                let violation = RiskViolation::GroupLimit {
                    group,
                    limit: self.config.max_group_positions,
                };
                warn!(order_id = %order.id, %violation, "order rejected by risk");
                return Err(violation);
            }
        }

        if estimated_cost > 0.0 {
            let available = portfolio.cash * self.config.buying_power_ratio;
            if estimated_cost > available {
                let violation = RiskViolation::BuyingPower {
                    cost: estimated_cost,
                    available,
                };
                warn!(order_id = %order.id, %violation, "order rejected by risk");
                return Err(violation);
            }
        }

        Ok(())
    }
}
