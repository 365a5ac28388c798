//! # Option Greeks
//!
//! The Greek vector {delta, gamma, theta, vega, rho} with aggregation
//! helpers for multi-leg positions and portfolio totals.
//!
//! ## Conventions
//! - `theta` is per calendar day.
//! - `vega` is per 1-point change in volatility (e.g., 20% → 21%).
//! - `rho` is per 1% change in the risk-free rate.

use serde::{Deserialize, Serialize};

/// Partial derivatives of an option price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionGreeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
    pub rho: f64,
}

impl OptionGreeks {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Component-wise sum for combining legs.
    pub fn add(&self, other: &OptionGreeks) -> OptionGreeks {
        OptionGreeks {
            delta: self.delta + other.delta,
            gamma: self.gamma + other.gamma,
            theta: self.theta + other.theta,
            vega: self.vega + other.vega,
            rho: self.rho + other.rho,
        }
    }

    /// Scales by a signed quantity (short legs flip sign).
    pub fn scale(&self, qty: f64) -> OptionGreeks {
        OptionGreeks {
            delta: self.delta * qty,
            gamma: self.gamma * qty,
            theta: self.theta * qty,
            vega: self.vega * qty,
            rho: self.rho * qty,
        }
    }
}
