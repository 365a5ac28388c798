//! # Option Contract Types
//!
//! Formal definition of option instruments and expiry calculation helpers.
//!
//! ## Description
//! An `OptionContract` is immutable once created: underlying symbol, strike,
//! expiry timestamp, and right (call/put). Symbols are built canonically so
//! the portfolio ledger and fill log agree on identity.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Classification of the option right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    /// Right to buy the underlying at the strike.
    Call,
    /// Right to sell the underlying at the strike.
    Put,
}

impl OptionType {
    /// Suffix used in canonical trading symbols.
    pub fn symbol_suffix(&self) -> &'static str {
        match self {
            OptionType::Call => "C",
            OptionType::Put => "P",
        }
    }
}

/// Logical model of a single option contract.
///
/// # Fields
/// * `underlying` - Underlying asset symbol (e.g., "SPY").
/// * `strike` - Exercise price.
/// * `expiry` - Expiration timestamp (settlement cut).
/// * `option_type` - Call or Put.
/// * `symbol` - Canonical trading symbol derived from the other fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub underlying: String,
    pub strike: f64,
    pub expiry: DateTime<Utc>,
    pub option_type: OptionType,
    pub symbol: String,
}

impl OptionContract {
    pub fn new(
        underlying: &str,
        strike: f64,
        expiry: DateTime<Utc>,
        option_type: OptionType,
    ) -> Self {
        let symbol = Self::build_symbol(underlying, strike, expiry, option_type);
        Self {
            underlying: underlying.to_string(),
            strike,
            expiry,
            option_type,
            symbol,
        }
    }

    /// Constructs a canonical symbol: `SPY250321C00450000` style.
    pub fn build_symbol(
        underlying: &str,
        strike: f64,
        expiry: DateTime<Utc>,
        option_type: OptionType,
    ) -> String {
        format!(
            "{}{:02}{:02}{:02}{}{:08}",
            underlying,
            expiry.year() % 100,
            expiry.month(),
            expiry.day(),
            option_type.symbol_suffix(),
            (strike * 1000.0).round() as u64,
        )
    }

    /// Exercise payoff at a given underlying price.
    pub fn intrinsic(&self, spot: f64) -> f64 {
        match self.option_type {
            OptionType::Call => (spot - self.strike).max(0.0),
            OptionType::Put => (self.strike - spot).max(0.0),
        }
    }

    /// Remaining life in calendar years; negative after expiry.
    pub fn time_to_expiry(&self, now: DateTime<Utc>) -> f64 {
        (self.expiry - now).num_seconds() as f64 / (365.0 * 86_400.0)
    }

    /// Remaining life in whole calendar days, clamped at zero.
    pub fn days_to_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expiry - now).num_days().max(0)
    }

    /// True once the settlement cut has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expiry
    }
}

/// Next Friday on or after `from` (standard weekly expiry).
pub fn next_weekly_expiry(from: NaiveDate) -> NaiveDate {
    let days_until_friday = (Weekday::Fri.num_days_from_monday() as i64
        - from.weekday().num_days_from_monday() as i64
        + 7)
        % 7;
    from + chrono::Duration::days(days_until_friday)
}

/// Third Friday of the given month (standard monthly expiry).
pub fn monthly_expiry(year: i32, month: u32) -> NaiveDate {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, 1, 1).expect("valid date"));
    let offset = (Weekday::Fri.num_days_from_monday() as i64
        - first.weekday().num_days_from_monday() as i64
        + 7)
        % 7;
    first + chrono::Duration::days(offset + 14)
}
