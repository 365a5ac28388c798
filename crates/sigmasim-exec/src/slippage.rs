//! # Slippage Model
//!
//! Adverse price movement applied on top of the half-spread.
//!
//! ## Description
//! base slippage × (1 + linear size impact) × volatility ratio × time-of-day
//! multiplier, applied in the adverse direction relative to the order side:
//! buys slip up, sells slip down.

use serde::{Deserialize, Serialize};
use sigmasim_models::{OrderSide, TradingPhase};

/// Slippage configuration. Coefficients are directionally realistic policy,
/// not calibrated market-impact estimates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlippageConfig {
    /// Base slippage in price units per contract.
    pub base: f64,
    /// Linear impact per contract of order size.
    pub size_impact_per_contract: f64,
    /// Volatility treated as "normal".
    pub reference_vol: f64,
    /// Phase multipliers.
    pub open_multiplier: f64,
    pub lunch_multiplier: f64,
    pub power_hour_multiplier: f64,
}

impl Default for SlippageConfig {
    fn default() -> Self {
        Self {
            base: 0.01,
            size_impact_per_contract: 0.0005,
            reference_vol: 0.20,
            open_multiplier: 1.5,
            lunch_multiplier: 1.2,
            power_hour_multiplier: 1.4,
        }
    }
}

/// Stateless slippage calculator.
#[derive(Debug, Clone, Default)]
pub struct SlippageModel {
    config: SlippageConfig,
}

impl SlippageModel {
    pub fn new(config: SlippageConfig) -> Self {
        Self { config }
    }

    fn phase_multiplier(&self, phase: TradingPhase) -> f64 {
        match phase {
            TradingPhase::Open => self.config.open_multiplier,
            TradingPhase::Lunch => self.config.lunch_multiplier,
            TradingPhase::PowerHour => self.config.power_hour_multiplier,
            TradingPhase::Normal => 1.0,
        }
    }

    /// Unsigned slippage magnitude for an order.
    pub fn magnitude(&self, quantity: u32, vol: f64, phase: TradingPhase) -> f64 {
        let vol_ratio = if self.config.reference_vol > 0.0 {
            (vol / self.config.reference_vol).max(0.25)
        } else {
            1.0
        };
        let size_mult = 1.0 + self.config.size_impact_per_contract * quantity as f64;
        self.config.base * size_mult * vol_ratio * self.phase_multiplier(phase)
    }

    /// Worst-case magnitude for a given size in the most hostile phase.
    /// Used by callers that need a conservative fill-price band.
    pub fn max_magnitude(&self, quantity: u32, vol: f64) -> f64 {
        let worst = self
            .config
            .open_multiplier
            .max(self.config.lunch_multiplier)
            .max(self.config.power_hour_multiplier)
            .max(1.0);
        self.magnitude(quantity, vol, TradingPhase::Normal) * worst
    }

    /// Signed adjustment: positive for buys (price worsens up), negative for
    /// sells.
    pub fn signed(&self, side: OrderSide, quantity: u32, vol: f64, phase: TradingPhase) -> f64 {
        side.sign() * self.magnitude(quantity, vol, phase)
    }
}
