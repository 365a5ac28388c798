//! # Simulation Configuration
//!
//! The full configuration surface of the core, deserializable from TOML.
//!
//! ## Description
//! One aggregate covers the event queue, execution frictions, risk limits,
//! rate/dividend tables, and the volatility surface. Validation runs once at
//! startup; configuration errors are the only fatal errors in the core.

use crate::error::EngineError;
use crate::risk::RiskConfig;
use serde::{Deserialize, Serialize};
use sigmasim_exec::ExecConfig;
use sigmasim_models::{InstrumentClass, PriorityTable};
use sigmasim_pricing::SurfaceConfig;
use std::collections::HashMap;

/// One tenor point of the piecewise-flat risk-free curve.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateTenor {
    /// Applies to expiries up to this many days.
    pub max_days: i64,
    pub rate: f64,
}

fn default_queue_capacity() -> usize {
    65_536
}

fn default_max_events_per_tick() -> usize {
    10_000
}

fn default_multiplier() -> f64 {
    100.0
}

fn default_initial_cash() -> f64 {
    100_000.0
}

fn default_rate_curve() -> Vec<RateTenor> {
    vec![
        RateTenor { max_days: 30, rate: 0.045 },
        RateTenor { max_days: 90, rate: 0.045 },
        RateTenor { max_days: 365, rate: 0.04 },
    ]
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Bounded event-queue capacity.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Soft cap on events dispatched within one tick.
    #[serde(default = "default_max_events_per_tick")]
    pub max_events_per_tick: usize,
    /// Event-kind dispatch priorities.
    #[serde(default)]
    pub priority: PriorityTable,
    /// Seed for every randomized element; fixed seed ⇒ identical run.
    #[serde(default)]
    pub seed: u64,
    /// Contract multiplier for option premium cash flows.
    #[serde(default = "default_multiplier")]
    pub contract_multiplier: f64,
    #[serde(default = "default_initial_cash")]
    pub initial_cash: f64,
    /// Execution frictions (spread, slippage, commissions, rejection rate).
    #[serde(default)]
    pub exec: ExecConfig,
    /// Volatility skew/term adjustment tables.
    #[serde(default)]
    pub surface: SurfaceConfig,
    /// Piecewise-flat risk-free curve by days-to-expiry.
    #[serde(default = "default_rate_curve")]
    pub rate_curve: Vec<RateTenor>,
    /// Continuous dividend yield by underlying symbol; absent ⇒ 0.
    #[serde(default)]
    pub dividend_yields: HashMap<String, f64>,
    /// Underlyings priced and billed as index options.
    #[serde(default)]
    pub index_underlyings: Vec<String>,
    #[serde(default)]
    pub risk: RiskConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            max_events_per_tick: default_max_events_per_tick(),
            priority: PriorityTable::default(),
            seed: 0,
            contract_multiplier: default_multiplier(),
            initial_cash: default_initial_cash(),
            exec: ExecConfig::default(),
            surface: SurfaceConfig::default(),
            rate_curve: default_rate_curve(),
            dividend_yields: HashMap::new(),
            index_underlyings: Vec::new(),
            risk: RiskConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parses and validates a TOML configuration document.
    ///
    /// # Errors
    /// [`EngineError::Config`] on parse failure or invalid values; fatal.
    pub fn from_toml(text: &str) -> Result<Self, EngineError> {
        let config: SimConfig =
            toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Startup validation of the instrument tables and limits.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.queue_capacity == 0 {
            return Err(EngineError::Config("queue_capacity must be > 0".into()));
        }
        if self.max_events_per_tick == 0 {
            return Err(EngineError::Config(
                "max_events_per_tick must be > 0".into(),
            ));
        }
        if self.contract_multiplier <= 0.0 {
            return Err(EngineError::Config(
                "contract_multiplier must be positive".into(),
            ));
        }
        if self.rate_curve.is_empty() {
            return Err(EngineError::Config("rate_curve must not be empty".into()));
        }
        if self
            .rate_curve
            .windows(2)
            .any(|w| w[0].max_days >= w[1].max_days)
        {
            return Err(EngineError::Config(
                "rate_curve tenors must be strictly ascending".into(),
            ));
        }
        if self.dividend_yields.values().any(|q| *q < 0.0) {
            return Err(EngineError::Config(
                "dividend yields must be non-negative".into(),
            ));
        }
        Ok(())
    }

    /// Risk-free rate for an expiry this many days out. The last tenor also
    /// covers everything beyond its bound.
    pub fn rate_for(&self, days_to_expiry: i64) -> f64 {
        self.rate_curve
            .iter()
            .find(|t| days_to_expiry <= t.max_days)
            .or_else(|| self.rate_curve.last())
            .map(|t| t.rate)
            .unwrap_or(0.0)
    }

    /// Dividend yield for an underlying; 0 when untabled.
    pub fn dividend_for(&self, underlying: &str) -> f64 {
        self.dividend_yields.get(underlying).copied().unwrap_or(0.0)
    }

    /// Instrument class for an option on this underlying.
    pub fn class_for(&self, underlying: &str) -> InstrumentClass {
        if self.index_underlyings.iter().any(|s| s == underlying) {
            InstrumentClass::IndexOption
        } else {
            InstrumentClass::EquityOption
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(SimConfig::default().validate().is_ok());
    }

    #[test]
    fn rate_curve_lookup() {
        let config = SimConfig::default();
        assert_eq!(config.rate_for(7), 0.045);
        assert_eq!(config.rate_for(200), 0.04);
        // Beyond the last tenor the last rate applies.
        assert_eq!(config.rate_for(1000), 0.04);
    }

    #[test]
    fn toml_round_trip_with_overrides() {
        let text = r#"
            queue_capacity = 128
            seed = 42
            index_underlyings = ["SPX"]

            [exec]
            rejection_rate = 0.0

            [risk]
            max_open_positions = 4
        "#;
        let config = SimConfig::from_toml(text).unwrap();
        assert_eq!(config.queue_capacity, 128);
        assert_eq!(config.seed, 42);
        assert_eq!(config.class_for("SPX"), InstrumentClass::IndexOption);
        assert_eq!(config.class_for("AAPL"), InstrumentClass::EquityOption);
        assert_eq!(config.risk.max_open_positions, 4);
    }

    #[test]
    fn malformed_tables_are_fatal() {
        let text = "queue_capacity = 0";
        assert!(SimConfig::from_toml(text).is_err());

        let mut config = SimConfig::default();
        config.rate_curve = vec![
            RateTenor { max_days: 90, rate: 0.05 },
            RateTenor { max_days: 30, rate: 0.05 },
        ];
        assert!(config.validate().is_err());
    }
}
