//! # Binomial American Pricing
//!
//! Cox-Ross-Rubinstein lattice with early exercise at every node.
//!
//! ## Description
//! Standard CRR parameterization: u = e^(σ√Δt), d = 1/u, risk-neutral
//! probability p = (e^((r-q)Δt) - d) / (u - d). Backward induction compares
//! continuation value against immediate exercise at each node. Step count
//! trades accuracy for speed; this is an explicit approximation.

use crate::bsm::PricingInputs;
use sigmasim_models::OptionType;

/// Default lattice depth.
pub const DEFAULT_STEPS: usize = 50;

/// Prices an American-style option on a CRR lattice.
///
/// Degenerates to intrinsic value when `time_to_expiry <= 0` or
/// `volatility <= 0`, consistent with the European pricer.
pub fn american_price(inputs: &PricingInputs, steps: usize) -> f64 {
    let PricingInputs {
        spot,
        strike,
        time_to_expiry: t,
        volatility: sigma,
        risk_free_rate: r,
        dividend_yield: q,
        option_type,
    } = *inputs;

    let exercise = |s: f64| match option_type {
        OptionType::Call => (s - strike).max(0.0),
        OptionType::Put => (strike - s).max(0.0),
    };

    if t <= 0.0 || sigma <= 0.0 {
        return exercise(spot);
    }

    let steps = steps.max(1);
    let dt = t / steps as f64;
    let up = (sigma * dt.sqrt()).exp();
    let down = 1.0 / up;
    let growth = ((r - q) * dt).exp();
    let p = ((growth - down) / (up - down)).clamp(0.0, 1.0);
    let discount = (-r * dt).exp();

    // Terminal payoffs.
    let mut values: Vec<f64> = (0..=steps)
        .map(|i| exercise(spot * up.powi(i as i32) * down.powi((steps - i) as i32)))
        .collect();

    // Backward induction with an early-exercise check at every node.
    for step in (0..steps).rev() {
        for i in 0..=step {
            let continuation = discount * (p * values[i + 1] + (1.0 - p) * values[i]);
            let node_spot = spot * up.powi(i as i32) * down.powi((step - i) as i32);
            values[i] = continuation.max(exercise(node_spot));
        }
    }

    values[0]
}
