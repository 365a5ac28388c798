//! # Option Pricing Engine
//!
//! Closed-form and lattice valuation with an implied-volatility solver.
//!
//! ## Description
//! Pure valuation: no shared mutable state, safe to call concurrently for
//! unrelated contracts. European pricing uses the Black-Scholes-Merton
//! closed form with a continuous dividend yield; American-style exercise is
//! approximated by a Cox-Ross-Rubinstein binomial lattice. A deterministic
//! volatility surface adjustment (moneyness skew + term-structure multiplier
//! table) is applied to a base at-the-money volatility before pricing.
//!
//! ### Module Structure
//! - [`bsm`] - European price + analytic Greeks, put-call parity helper
//! - [`iv`] - Newton-Raphson implied-volatility solver
//! - [`binomial`] - CRR American pricing with early exercise
//! - [`surface`] - skew / term-structure volatility adjustment
//!
//! ## References
//! - Black, F., & Scholes, M. (1973). The Pricing of Options and Corporate
//!   Liabilities. Journal of Political Economy, 81(3), 637-654.
//! - Cox, J., Ross, S., & Rubinstein, M. (1979). Option Pricing: A
//!   Simplified Approach.

pub mod binomial;
pub mod bsm;
pub mod iv;
pub mod surface;

pub use binomial::american_price;
pub use bsm::{parity_gap, price, PricingInputs, Valuation};
pub use iv::{implied_volatility, IvParams, IvSolution};
pub use surface::{SurfaceConfig, TermBucket, VolSurface};
