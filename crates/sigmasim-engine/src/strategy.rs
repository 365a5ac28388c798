//! # Strategy Seam
//!
//! The trait a trading strategy implements to participate in a run, plus a
//! scripted implementation for deterministic scenario tests.
//!
//! ## Description
//! Strategies never construct `Order` values directly: they return
//! [`OrderRequest`] intents and the scheduler assigns deterministic ids,
//! runs risk checks, and owns the order lifecycle from there.

use chrono::{DateTime, Utc};
use sigmasim_models::{
    Fill, MarketSnapshot, OptionContract, Order, OrderSide, OrderType,
};
use uuid::Uuid;

use crate::portfolio::PortfolioState;

/// A strategy's intent to trade, before id assignment and risk checks.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub contract: OptionContract,
    pub side: OrderSide,
    pub quantity: u32,
    pub order_type: OrderType,
    pub limit_price: Option<f64>,
    pub stop_price: Option<f64>,
}

impl OrderRequest {
    pub fn market(contract: OptionContract, side: OrderSide, quantity: u32) -> Self {
        Self {
            contract,
            side,
            quantity,
            order_type: OrderType::Market,
            limit_price: None,
            stop_price: None,
        }
    }

    pub fn limit(contract: OptionContract, side: OrderSide, quantity: u32, limit: f64) -> Self {
        Self {
            limit_price: Some(limit),
            order_type: OrderType::Limit,
            ..Self::market(contract, side, quantity)
        }
    }

    pub fn stop(contract: OptionContract, side: OrderSide, quantity: u32, stop: f64) -> Self {
        Self {
            stop_price: Some(stop),
            order_type: OrderType::Stop,
            ..Self::market(contract, side, quantity)
        }
    }

    /// Materializes the request into an order owned by `strategy`.
    pub fn into_order(self, id: Uuid, strategy: &str, ts: DateTime<Utc>) -> Order {
        Order {
            id,
            contract: self.contract,
            side: self.side,
            quantity: self.quantity,
            order_type: self.order_type,
            limit_price: self.limit_price,
            stop_price: self.stop_price,
            strategy: strategy.to_string(),
            status: sigmasim_models::OrderStatus::Pending,
            filled_quantity: 0,
            created_ts: ts,
        }
    }
}

/// A participant in the event loop.
pub trait Strategy {
    /// Stable name used as the position-attribution tag.
    fn name(&self) -> &str;

    /// Called once per market-data event for a subscribed underlying.
    fn on_bar(&mut self, snap: &MarketSnapshot, portfolio: &PortfolioState) -> Vec<OrderRequest>;

    /// Called for each fill attributed to this strategy.
    fn on_fill(&mut self, _fill: &Fill) {}
}

/// Emits pre-scripted requests when the clock reaches each step. Used for
/// deterministic scenario runs; steps fire at most once, in order.
pub struct ScriptedStrategy {
    name: String,
    steps: Vec<(DateTime<Utc>, Vec<OrderRequest>)>,
    next_step: usize,
}

impl ScriptedStrategy {
    pub fn new(name: &str, mut steps: Vec<(DateTime<Utc>, Vec<OrderRequest>)>) -> Self {
        steps.sort_by_key(|(ts, _)| *ts);
        Self {
            name: name.to_string(),
            steps,
            next_step: 0,
        }
    }
}

impl Strategy for ScriptedStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_bar(&mut self, snap: &MarketSnapshot, _portfolio: &PortfolioState) -> Vec<OrderRequest> {
        let mut requests = Vec::new();
        while self.next_step < self.steps.len() && self.steps[self.next_step].0 <= snap.ts {
            requests.extend(self.steps[self.next_step].1.iter().cloned());
            self.next_step += 1;
        }
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sigmasim_models::{OptionType, TradingPhase};

    fn contract() -> OptionContract {
        let expiry = Utc.with_ymd_and_hms(2025, 3, 21, 21, 0, 0).unwrap();
        OptionContract::new("SPY", 450.0, expiry, OptionType::Call)
    }

    fn bar(minute: u32) -> MarketSnapshot {
        let ts = Utc.with_ymd_and_hms(2025, 3, 3, 16, minute, 0).unwrap();
        MarketSnapshot {
            ts,
            symbol: "SPY".to_string(),
            open: 450.0,
            high: 450.5,
            low: 449.5,
            close: 450.0,
            last: 450.0,
            volume: 1_000_000.0,
            bid: 449.98,
            ask: 450.02,
            implied_vol: 0.20,
            phase: TradingPhase::Normal,
        }
    }

    #[test]
    fn scripted_steps_fire_once_in_order() {
        let t1 = bar(5).ts;
        let t2 = bar(10).ts;
        let mut strategy = ScriptedStrategy::new(
            "scripted",
            vec![
                (t2, vec![OrderRequest::market(contract(), OrderSide::Sell, 1)]),
                (t1, vec![OrderRequest::market(contract(), OrderSide::Buy, 2)]),
            ],
        );
        let book = PortfolioState::new(0.0, 100.0);

        assert!(strategy.on_bar(&bar(0), &book).is_empty());

        let first = strategy.on_bar(&bar(5), &book);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].side, OrderSide::Buy);

        // Jumping past both remaining steps releases them together.
        let rest = strategy.on_bar(&bar(30), &book);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].side, OrderSide::Sell);

        assert!(strategy.on_bar(&bar(31), &book).is_empty());
    }
}
