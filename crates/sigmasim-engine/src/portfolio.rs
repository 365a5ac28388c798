//! # Portfolio Ledger
//!
//! Cash, positions, and P&L, mutated only by fills and expiry settlement.
//!
//! ## Description
//! Positions are keyed by (symbol, strategy) so two strategies trading the
//! same contract stay independent. Fill application handles opening, adding,
//! reducing, and flipping; a position whose quantity reaches zero is removed
//! from the book. Realized P&L is booked at reduction time against the
//! volume-weighted average entry price.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sigmasim_models::{Fill, OptionContract, OptionGreeks, OrderSide, PositionKey};
use std::collections::HashMap;
use tracing::debug;

/// One open position. Quantity is signed: positive long, negative short.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub key: PositionKey,
    pub contract: OptionContract,
    pub quantity: i64,
    /// Volume-weighted average entry price.
    pub avg_price: f64,
    /// Last mark price used for valuation.
    pub last_price: f64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
    /// Greeks of the whole position (per-contract Greeks × signed quantity).
    pub greeks: OptionGreeks,
}

impl Position {
    fn open(key: PositionKey, contract: OptionContract, quantity: i64, price: f64) -> Self {
        Self {
            key,
            contract,
            quantity,
            avg_price: price,
            last_price: price,
            market_value: 0.0,
            unrealized_pnl: 0.0,
            greeks: OptionGreeks::zero(),
        }
    }
}

/// Per-position line item inside a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionSummary {
    pub symbol: String,
    pub strategy: String,
    /// Signed: positive long, negative short.
    pub quantity: i64,
    pub avg_price: f64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
}

/// Point-in-time view of the book, pushed at each tick boundary: cash, the
/// full position list, aggregate Greeks, and total value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub ts: DateTime<Utc>,
    pub cash: f64,
    pub equity: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub net_greeks: OptionGreeks,
    pub open_positions: usize,
    pub positions: Vec<PositionSummary>,
}

/// The mutable ledger. Fills are the single mutation path during a run;
/// expiry settlement is the only other.
#[derive(Debug, Clone)]
pub struct PortfolioState {
    pub cash: f64,
    pub realized_pnl: f64,
    multiplier: f64,
    positions: HashMap<PositionKey, Position>,
}

impl PortfolioState {
    pub fn new(initial_cash: f64, multiplier: f64) -> Self {
        Self {
            cash: initial_cash,
            realized_pnl: 0.0,
            multiplier,
            positions: HashMap::new(),
        }
    }

    pub fn position(&self, key: &PositionKey) -> Option<&Position> {
        self.positions.get(key)
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn open_positions(&self) -> usize {
        self.positions.len()
    }

    /// Open positions whose underlying maps into `group` under `group_of`.
    pub fn positions_in_group<F>(&self, group: &str, group_of: F) -> usize
    where
        F: Fn(&str) -> String,
    {
        self.positions
            .values()
            .filter(|p| group_of(&p.contract.underlying) == group)
            .count()
    }

    /// Applies a fill: moves cash and updates the keyed position.
    ///
    /// The caller supplies the traded contract so a fill that opens a fresh
    /// position can carry full contract terms into the book.
    pub fn apply_fill(&mut self, fill: &Fill, contract: &OptionContract) {
        self.cash += fill.cash_flow(self.multiplier);

        let key = PositionKey::new(&fill.symbol, &fill.strategy);
        let fill_qty = fill.quantity as i64 * if fill.side == OrderSide::Buy { 1 } else { -1 };

        match self.positions.get_mut(&key) {
            None => {
                self.positions.insert(
                    key.clone(),
                    Position::open(key, contract.clone(), fill_qty, fill.price),
                );
            }
            Some(position) => {
                if position.quantity.signum() == fill_qty.signum() {
                    // Same direction: extend at volume-weighted average.
                    let total = position.quantity + fill_qty;
                    position.avg_price = (position.avg_price * position.quantity.abs() as f64
                        + fill.price * fill_qty.abs() as f64)
                        / total.abs() as f64;
                    position.quantity = total;
                } else {
                    let closed = fill_qty.abs().min(position.quantity.abs());
                    let direction = position.quantity.signum() as f64;
                    let pnl =
                        (fill.price - position.avg_price) * closed as f64 * direction * self.multiplier;
                    self.realized_pnl += pnl;
                    debug!(
                        symbol = %fill.symbol,
                        strategy = %fill.strategy,
                        closed,
                        pnl,
                        "position reduced"
                    );

                    let remainder = position.quantity + fill_qty;
                    if remainder == 0 {
                        self.positions.remove(&key);
                    } else if remainder.signum() == position.quantity.signum() {
                        position.quantity = remainder;
                    } else {
                        // Flip: the excess opens a new position at the fill price.
                        position.quantity = remainder;
                        position.avg_price = fill.price;
                        position.last_price = fill.price;
                    }
                }
            }
        }
    }

    /// Re-marks one position at a theoretical price and per-contract Greeks.
    pub fn mark(&mut self, key: &PositionKey, price: f64, per_contract_greeks: OptionGreeks) {
        if let Some(position) = self.positions.get_mut(key) {
            position.last_price = price;
            position.market_value = price * position.quantity as f64 * self.multiplier;
            position.unrealized_pnl =
                (price - position.avg_price) * position.quantity as f64 * self.multiplier;
            position.greeks = per_contract_greeks.scale(position.quantity as f64);
        }
    }

    /// Settles an expired position at intrinsic value and removes it.
    pub fn settle_expiry(&mut self, key: &PositionKey, intrinsic: f64) -> Option<f64> {
        let position = self.positions.remove(key)?;
        let cash_flow = intrinsic * position.quantity as f64 * self.multiplier;
        let pnl = (intrinsic - position.avg_price) * position.quantity as f64 * self.multiplier;
        self.cash += cash_flow;
        self.realized_pnl += pnl;
        debug!(
            symbol = %position.key.symbol,
            strategy = %position.key.strategy,
            intrinsic,
            pnl,
            "expiry settlement"
        );
        Some(pnl)
    }

    /// Cash plus marked value of every open position.
    pub fn equity(&self) -> f64 {
        self.cash + self.positions.values().map(|p| p.market_value).sum::<f64>()
    }

    pub fn snapshot(&self, ts: DateTime<Utc>) -> PortfolioSnapshot {
        let mut net_greeks = OptionGreeks::zero();
        let mut unrealized = 0.0;
        let mut summaries: Vec<PositionSummary> = Vec::with_capacity(self.positions.len());
        for position in self.positions.values() {
            net_greeks = net_greeks.add(&position.greeks);
            unrealized += position.unrealized_pnl;
            summaries.push(PositionSummary {
                symbol: position.key.symbol.clone(),
                strategy: position.key.strategy.clone(),
                quantity: position.quantity,
                avg_price: position.avg_price,
                market_value: position.market_value,
                unrealized_pnl: position.unrealized_pnl,
            });
        }
        // Stable ordering for snapshot consumers and serialized artifacts.
        summaries.sort_by(|a, b| (&a.symbol, &a.strategy).cmp(&(&b.symbol, &b.strategy)));
        PortfolioSnapshot {
            ts,
            cash: self.cash,
            equity: self.equity(),
            realized_pnl: self.realized_pnl,
            unrealized_pnl: unrealized,
            net_greeks,
            open_positions: self.positions.len(),
            positions: summaries,
        }
    }
}
