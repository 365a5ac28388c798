//! # Market Snapshot Types
//!
//! Immutable per-bar observations consumed read-only by the whole core.
//!
//! ## Description
//! A `MarketSnapshot` is one bar (typically one minute) for one underlying:
//! OHLCV, best bid/ask, an implied-volatility estimate, and the discrete
//! time-of-day phase used by both pricing and execution. Snapshots are
//! produced by an external data-path collaborator; the core never mutates
//! them and requires non-decreasing timestamps per symbol.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Discrete intraday liquidity regime.
///
/// Spreads and slippage widen at the open, around lunch, and into the close;
/// the execution simulator keys its multipliers off this phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradingPhase {
    /// First ~30 minutes of the session.
    Open,
    /// Midday liquidity trough.
    Lunch,
    /// Final hour of the session.
    PowerHour,
    /// Everything else.
    Normal,
}

impl TradingPhase {
    /// Classifies a UTC timestamp against a regular US-equity session
    /// (14:30–21:00 UTC). Feed generators may override the phase directly;
    /// this is the fallback used when a bar carries no phase.
    pub fn from_timestamp(ts: DateTime<Utc>) -> Self {
        let minutes = (ts.hour() * 60 + ts.minute()) as i32;
        match minutes {
            m if (870..900).contains(&m) => TradingPhase::Open, // 14:30-15:00
            m if (1020..1080).contains(&m) => TradingPhase::Lunch, // 17:00-18:00
            m if (1200..1260).contains(&m) => TradingPhase::PowerHour, // 20:00-21:00
            m if (870..1260).contains(&m) => TradingPhase::Normal,
            _ => TradingPhase::Normal,
        }
    }

    /// True while the exchange accepts orders.
    pub fn market_open(ts: DateTime<Utc>) -> bool {
        let minutes = (ts.hour() * 60 + ts.minute()) as i32;
        (870..1260).contains(&minutes)
    }
}

/// Instrument classification used by commission and friction tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentClass {
    /// Options on single-name equities.
    EquityOption,
    /// Options on broad indices.
    IndexOption,
    /// The underlying shares themselves.
    Equity,
    /// Listed futures.
    Future,
}

/// One immutable bar for one underlying symbol.
///
/// # Fields
/// * `ts` - Bar timestamp (bar close).
/// * `symbol` - Underlying identifier (e.g., "SPY").
/// * `open`/`high`/`low`/`close` - Bar OHLC of the underlying.
/// * `last` - Last traded price (equals `close` for historical bars).
/// * `volume` - Bar volume in shares/contracts.
/// * `bid`/`ask` - Best quote for the underlying at bar close.
/// * `implied_vol` - ATM implied-volatility estimate for the bar.
/// * `phase` - Discrete time-of-day phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ts: DateTime<Utc>,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub last: f64,
    pub volume: f64,
    pub bid: f64,
    pub ask: f64,
    pub implied_vol: f64,
    pub phase: TradingPhase,
}

impl MarketSnapshot {
    /// Quote midpoint, falling back to last when the quote is degenerate.
    pub fn mid(&self) -> f64 {
        if self.bid > 0.0 && self.ask >= self.bid {
            (self.bid + self.ask) * 0.5
        } else {
            self.last
        }
    }

    /// Quoted spread in price units (0 when the quote is degenerate).
    pub fn spread(&self) -> f64 {
        if self.bid > 0.0 && self.ask >= self.bid {
            self.ask - self.bid
        } else {
            0.0
        }
    }
}
