//! # Volatility Surface Adjustment
//!
//! Deterministic skew and term-structure adjustment applied to a base
//! at-the-money volatility before every pricing call.
//!
//! ## Description
//! The adjustment is tunable configuration, not derived from market
//! microstructure: a quadratic moneyness skew plus a days-to-expiry bucket
//! multiplier table. OTM puts (and ITM calls) price richer under the default
//! skew, and short-dated buckets carry a premium over the base vol.

use serde::{Deserialize, Serialize};
use sigmasim_models::OptionType;

/// One term-structure bucket: applies to expiries up to `max_days`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TermBucket {
    pub max_days: i64,
    pub multiplier: f64,
}

/// Configuration of the skew/term adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Linear skew coefficient against log-moneyness (negative tilts puts richer).
    pub skew_slope: f64,
    /// Quadratic smile coefficient against log-moneyness.
    pub smile_curvature: f64,
    /// Buckets ordered by ascending `max_days`; the last bucket's multiplier
    /// also applies beyond its bound.
    pub term_buckets: Vec<TermBucket>,
    /// Hard floor on the adjusted volatility.
    pub vol_floor: f64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            skew_slope: -0.10,
            smile_curvature: 0.50,
            term_buckets: vec![
                TermBucket { max_days: 1, multiplier: 1.30 },
                TermBucket { max_days: 7, multiplier: 1.15 },
                TermBucket { max_days: 30, multiplier: 1.05 },
                TermBucket { max_days: 90, multiplier: 1.00 },
                TermBucket { max_days: 365, multiplier: 0.95 },
            ],
            vol_floor: 0.01,
        }
    }
}

/// Applies the configured adjustment to a base ATM volatility.
#[derive(Debug, Clone, Default)]
pub struct VolSurface {
    config: SurfaceConfig,
}

impl VolSurface {
    pub fn new(config: SurfaceConfig) -> Self {
        Self { config }
    }

    /// Adjusted volatility for a contract.
    ///
    /// # Parameters
    /// * `base_vol` - ATM volatility estimate from the market snapshot.
    /// * `spot` / `strike` - For log-moneyness.
    /// * `days_to_expiry` - Selects the term bucket.
    pub fn adjust(
        &self,
        base_vol: f64,
        spot: f64,
        strike: f64,
        days_to_expiry: i64,
        _option_type: OptionType,
    ) -> f64 {
        if base_vol <= 0.0 || spot <= 0.0 || strike <= 0.0 {
            return base_vol.max(0.0);
        }

        let log_moneyness = (strike / spot).ln();
        let skew = self.config.skew_slope * log_moneyness
            + self.config.smile_curvature * log_moneyness * log_moneyness;

        let term = self
            .config
            .term_buckets
            .iter()
            .find(|b| days_to_expiry <= b.max_days)
            .or_else(|| self.config.term_buckets.last())
            .map(|b| b.multiplier)
            .unwrap_or(1.0);

        ((base_vol + skew) * term).max(self.config.vol_floor)
    }
}
