//! # Implied Volatility Solver
//!
//! Newton-Raphson inversion of the Black-Scholes-Merton price.
//!
//! ## Description
//! Seeds at 20% volatility and iterates σₙ₊₁ = σₙ - priceError / vega,
//! clamped to [0.1%, 500%] each step, at most 100 iterations, converging on
//! a price-error tolerance (default 0.001, i.e. 0.1 cents). Non-convergence
//! returns the best estimate flagged `converged: false` with a logged
//! warning; callers must treat such a result as approximate.

use crate::bsm::{self, PricingInputs};
use sigmasim_models::OptionType;
use tracing::warn;

const VOL_SEED: f64 = 0.20;
const VOL_MIN: f64 = 0.001;
const VOL_MAX: f64 = 5.0;
const MAX_ITERATIONS: u32 = 100;
const DEFAULT_TOLERANCE: f64 = 0.001;

/// Solver parameters.
#[derive(Debug, Clone, Copy)]
pub struct IvParams {
    pub market_price: f64,
    pub spot: f64,
    pub strike: f64,
    pub time_to_expiry: f64,
    pub risk_free_rate: f64,
    pub dividend_yield: f64,
    pub option_type: OptionType,
    /// Convergence tolerance on price error.
    pub tolerance: f64,
}

impl IvParams {
    pub fn new(
        market_price: f64,
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        risk_free_rate: f64,
        dividend_yield: f64,
        option_type: OptionType,
    ) -> Self {
        Self {
            market_price,
            spot,
            strike,
            time_to_expiry,
            risk_free_rate,
            dividend_yield,
            option_type,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Solver output. `volatility` is the best estimate even when not converged.
#[derive(Debug, Clone, Copy)]
pub struct IvSolution {
    pub volatility: f64,
    pub converged: bool,
    pub iterations: u32,
    /// Residual price error at the returned volatility.
    pub price_error: f64,
}

/// Solves for the volatility reproducing `market_price`.
///
/// Never fails: a vega collapse or iteration exhaustion yields the best
/// estimate with `converged: false` and a warning in the log.
pub fn implied_volatility(params: &IvParams) -> IvSolution {
    let mut vol = VOL_SEED;
    let mut last_error = f64::MAX;

    for iteration in 0..MAX_ITERATIONS {
        let inputs = PricingInputs {
            spot: params.spot,
            strike: params.strike,
            time_to_expiry: params.time_to_expiry,
            volatility: vol,
            risk_free_rate: params.risk_free_rate,
            dividend_yield: params.dividend_yield,
            option_type: params.option_type,
        };
        let valuation = bsm::price(&inputs);
        let error = valuation.price - params.market_price;
        last_error = error;

        if error.abs() < params.tolerance {
            return IvSolution {
                volatility: vol,
                converged: true,
                iterations: iteration,
                price_error: error,
            };
        }

        // Vega per 1.0 of volatility (the struct field is per point).
        let vega_raw = valuation.greeks.vega * 100.0;
        if vega_raw.abs() < 1e-10 {
            warn!(
                strike = params.strike,
                spot = params.spot,
                vol,
                "implied volatility solver stalled on vanishing vega; returning approximate result"
            );
            return IvSolution {
                volatility: vol,
                converged: false,
                iterations: iteration,
                price_error: error,
            };
        }

        vol = (vol - error / vega_raw).clamp(VOL_MIN, VOL_MAX);
    }

    warn!(
        strike = params.strike,
        spot = params.spot,
        residual = last_error,
        "implied volatility did not converge in {} iterations; returning approximate result",
        MAX_ITERATIONS
    );
    IvSolution {
        volatility: vol,
        converged: false,
        iterations: MAX_ITERATIONS,
        price_error: last_error,
    }
}
