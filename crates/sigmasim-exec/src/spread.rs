//! # Dynamic Spread Model
//!
//! Synthesizes a bid-ask spread from instrument class, volatility regime,
//! time of day, displayed volume, and moneyness.
//!
//! ## Description
//! base spread by instrument class
//!   × volatility ratio vs a reference level
//!   × time-of-day multiplier (wider at open/close/lunch)
//!   × 1/√(volume ratio) (thinner volume ⇒ wider)
//!   × moneyness widening for OTM options
//! floored at a minimum tick-equivalent spread.

use serde::{Deserialize, Serialize};
use sigmasim_models::{InstrumentClass, OptionType, TradingPhase};

/// Spread model configuration. All values are tunable policy, not market
/// microstructure estimates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadConfig {
    /// Base half-spread-free spread per class, in price units per contract.
    pub base_equity_option: f64,
    pub base_index_option: f64,
    pub base_equity: f64,
    pub base_future: f64,
    /// Volatility treated as "normal"; spreads scale with vol / reference.
    pub reference_vol: f64,
    /// Volume treated as "normal" for the inverse-sqrt volume scaling.
    pub reference_volume: f64,
    /// Phase multipliers.
    pub open_multiplier: f64,
    pub lunch_multiplier: f64,
    pub power_hour_multiplier: f64,
    /// Additional widening per 10% OTM.
    pub otm_widening: f64,
    /// Minimum tick-equivalent spread.
    pub min_spread: f64,
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            base_equity_option: 0.05,
            base_index_option: 0.10,
            base_equity: 0.01,
            base_future: 0.25,
            reference_vol: 0.20,
            reference_volume: 1_000_000.0,
            open_multiplier: 1.8,
            lunch_multiplier: 1.3,
            power_hour_multiplier: 1.5,
            otm_widening: 0.30,
            min_spread: 0.01,
        }
    }
}

/// Stateless spread calculator.
#[derive(Debug, Clone, Default)]
pub struct SpreadModel {
    config: SpreadConfig,
}

impl SpreadModel {
    pub fn new(config: SpreadConfig) -> Self {
        Self { config }
    }

    fn base_for(&self, class: InstrumentClass) -> f64 {
        match class {
            InstrumentClass::EquityOption => self.config.base_equity_option,
            InstrumentClass::IndexOption => self.config.base_index_option,
            InstrumentClass::Equity => self.config.base_equity,
            InstrumentClass::Future => self.config.base_future,
        }
    }

    fn phase_multiplier(&self, phase: TradingPhase) -> f64 {
        match phase {
            TradingPhase::Open => self.config.open_multiplier,
            TradingPhase::Lunch => self.config.lunch_multiplier,
            TradingPhase::PowerHour => self.config.power_hour_multiplier,
            TradingPhase::Normal => 1.0,
        }
    }

    /// Full synthetic spread for an option quote.
    ///
    /// # Parameters
    /// * `class` - Instrument class for the base table.
    /// * `vol` - Current (adjusted) volatility.
    /// * `phase` - Time-of-day phase.
    /// * `volume` - Displayed bar volume of the underlying.
    /// * `spot` / `strike` - For OTM widening; pass `spot == strike` for
    ///   non-option classes.
    pub fn spread(
        &self,
        class: InstrumentClass,
        vol: f64,
        phase: TradingPhase,
        volume: f64,
        spot: f64,
        strike: f64,
        option_type: OptionType,
    ) -> f64 {
        let vol_ratio = if self.config.reference_vol > 0.0 {
            (vol / self.config.reference_vol).max(0.25)
        } else {
            1.0
        };

        let volume_ratio = if volume > 0.0 && self.config.reference_volume > 0.0 {
            (volume / self.config.reference_volume).max(1e-4)
        } else {
            1.0
        };

        // Distance out of the money as a fraction of spot.
        let otm_fraction = if spot > 0.0 {
            match option_type {
                OptionType::Call => ((strike - spot) / spot).max(0.0),
                OptionType::Put => ((spot - strike) / spot).max(0.0),
            }
        } else {
            0.0
        };
        let moneyness_mult = 1.0 + self.config.otm_widening * (otm_fraction / 0.10);

        let spread = self.base_for(class)
            * vol_ratio
            * self.phase_multiplier(phase)
            * (1.0 / volume_ratio.sqrt())
            * moneyness_mult;

        spread.max(self.config.min_spread)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> SpreadModel {
        SpreadModel::default()
    }

    #[test]
    fn wider_at_the_open() {
        let m = model();
        let open = m.spread(
            InstrumentClass::EquityOption,
            0.20,
            TradingPhase::Open,
            1_000_000.0,
            100.0,
            100.0,
            OptionType::Call,
        );
        let normal = m.spread(
            InstrumentClass::EquityOption,
            0.20,
            TradingPhase::Normal,
            1_000_000.0,
            100.0,
            100.0,
            OptionType::Call,
        );
        assert!(open > normal);
    }

    #[test]
    fn thin_volume_widens() {
        let m = model();
        let thin = m.spread(
            InstrumentClass::EquityOption,
            0.20,
            TradingPhase::Normal,
            100_000.0,
            100.0,
            100.0,
            OptionType::Call,
        );
        let thick = m.spread(
            InstrumentClass::EquityOption,
            0.20,
            TradingPhase::Normal,
            4_000_000.0,
            100.0,
            100.0,
            OptionType::Call,
        );
        assert!(thin > thick);
    }

    #[test]
    fn otm_options_quote_wider() {
        let m = model();
        let atm = m.spread(
            InstrumentClass::EquityOption,
            0.20,
            TradingPhase::Normal,
            1_000_000.0,
            100.0,
            100.0,
            OptionType::Call,
        );
        let otm = m.spread(
            InstrumentClass::EquityOption,
            0.20,
            TradingPhase::Normal,
            1_000_000.0,
            100.0,
            115.0,
            OptionType::Call,
        );
        assert!(otm > atm);
    }

    #[test]
    fn floor_holds_under_calm_markets() {
        let m = model();
        let s = m.spread(
            InstrumentClass::Equity,
            0.01,
            TradingPhase::Normal,
            100_000_000.0,
            100.0,
            100.0,
            OptionType::Call,
        );
        assert!(s >= 0.01);
    }
}
