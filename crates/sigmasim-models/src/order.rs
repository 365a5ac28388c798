//! # Order and Fill Types
//!
//! Trade intents, their lifecycle states, and realized executions.
//!
//! ## Lifecycle
//! ```text
//! PENDING → FILLED
//!         → PARTIALLY_FILLED → FILLED
//!         → REJECTED
//!         → CANCELLED
//! ```
//! No transitions leave a terminal state. An `Order` is consumed exactly once
//! by the execution simulator; every realized execution is an append-only
//! `Fill` fact that mutates the position it applies to.

use crate::contract::OptionContract;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of the trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// +1 for buys, -1 for sells.
    pub fn sign(&self) -> f64 {
        match self {
            OrderSide::Buy => 1.0,
            OrderSide::Sell => -1.0,
        }
    }

}

/// Constraint on execution price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Immediate fill at prevailing conditions.
    Market,
    /// Fill only at or better than the limit price.
    Limit,
    /// Becomes a market order once the stop price trades.
    Stop,
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    PartiallyFilled,
    Filled,
    Rejected,
    Cancelled,
}

impl OrderStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Rejected | OrderStatus::Cancelled
        )
    }
}

/// Why an order was refused before (or instead of) execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Malformed order data: missing symbol, zero quantity, missing prices.
    InvalidOrder(String),
    /// Submitted outside trading hours.
    MarketClosed,
    /// Randomized broker-style rejection.
    BrokerRejected,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::InvalidOrder(detail) => write!(f, "invalid order: {}", detail),
            RejectReason::MarketClosed => write!(f, "market closed"),
            RejectReason::BrokerRejected => write!(f, "rejected by broker"),
        }
    }
}

/// Composite portfolio key: positions are keyed by (symbol, strategy), never
/// by ad-hoc string concatenation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionKey {
    pub symbol: String,
    pub strategy: String,
}

impl PositionKey {
    pub fn new(symbol: &str, strategy: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            strategy: strategy.to_string(),
        }
    }
}

/// Intent to trade a single option contract.
///
/// # Fields
/// * `id` - Deterministic id assigned at creation.
/// * `contract` - The contract to trade.
/// * `side` - Buy or Sell.
/// * `quantity` - Contracts requested; always positive.
/// * `order_type` - Market, Limit, or Stop.
/// * `limit_price` - Required for Limit orders.
/// * `stop_price` - Required for Stop orders.
/// * `strategy` - Strategy tag for position attribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub contract: OptionContract,
    pub side: OrderSide,
    pub quantity: u32,
    pub order_type: OrderType,
    pub limit_price: Option<f64>,
    pub stop_price: Option<f64>,
    pub strategy: String,
    pub status: OrderStatus,
    pub filled_quantity: u32,
    pub created_ts: DateTime<Utc>,
}

impl Order {
    pub fn market(
        id: Uuid,
        contract: OptionContract,
        side: OrderSide,
        quantity: u32,
        strategy: &str,
        ts: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            contract,
            side,
            quantity,
            order_type: OrderType::Market,
            limit_price: None,
            stop_price: None,
            strategy: strategy.to_string(),
            status: OrderStatus::Pending,
            filled_quantity: 0,
            created_ts: ts,
        }
    }

    pub fn limit(
        id: Uuid,
        contract: OptionContract,
        side: OrderSide,
        quantity: u32,
        limit_price: f64,
        strategy: &str,
        ts: DateTime<Utc>,
    ) -> Self {
        Self {
            limit_price: Some(limit_price),
            order_type: OrderType::Limit,
            ..Self::market(id, contract, side, quantity, strategy, ts)
        }
    }

    pub fn stop(
        id: Uuid,
        contract: OptionContract,
        side: OrderSide,
        quantity: u32,
        stop_price: f64,
        strategy: &str,
        ts: DateTime<Utc>,
    ) -> Self {
        Self {
            stop_price: Some(stop_price),
            order_type: OrderType::Stop,
            ..Self::market(id, contract, side, quantity, strategy, ts)
        }
    }

    /// Contracts still open on the order.
    pub fn remaining(&self) -> u32 {
        self.quantity.saturating_sub(self.filled_quantity)
    }

    /// Position key this order's fills attribute to.
    pub fn position_key(&self) -> PositionKey {
        PositionKey::new(&self.contract.symbol, &self.strategy)
    }
}

/// A realized execution. Append-only.
///
/// # Fields
/// * `order_id` - Order this fill applies to.
/// * `quantity` - Contracts filled (may be partial).
/// * `price` - Execution price per contract.
/// * `slippage` - Adverse price movement vs theoretical mid, per contract.
/// * `spread_cost` - Half-spread paid, per contract.
/// * `commission` - Broker commission for the fill.
/// * `fees` - Exchange/regulatory fees for the fill.
/// * `venue` - Venue tag ("SIM" for the simulator).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: Uuid,
    pub symbol: String,
    pub strategy: String,
    pub side: OrderSide,
    pub quantity: u32,
    pub price: f64,
    pub slippage: f64,
    pub spread_cost: f64,
    pub commission: f64,
    pub fees: f64,
    pub ts: DateTime<Utc>,
    pub venue: String,
}

impl Fill {
    /// Signed cash flow of this fill including costs. Buys are outflows.
    /// Uses a contract multiplier of 100 for options premium.
    pub fn cash_flow(&self, multiplier: f64) -> f64 {
        let gross = self.price * self.quantity as f64 * multiplier;
        let signed = match self.side {
            OrderSide::Buy => -gross,
            OrderSide::Sell => gross,
        };
        signed - self.commission - self.fees
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::OptionType;
    use chrono::TimeZone;

    fn test_contract() -> OptionContract {
        let expiry = Utc.with_ymd_and_hms(2025, 3, 21, 21, 0, 0).unwrap();
        OptionContract::new("SPY", 450.0, expiry, OptionType::Call)
    }

    #[test]
    fn terminal_states() {
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::PartiallyFilled.is_terminal());
    }

    #[test]
    fn remaining_never_underflows() {
        let ts = Utc::now();
        let mut order = Order::market(
            Uuid::nil(),
            test_contract(),
            OrderSide::Buy,
            5,
            "test",
            ts,
        );
        order.filled_quantity = 5;
        assert_eq!(order.remaining(), 0);
        order.filled_quantity = 7; // corrupt on purpose
        assert_eq!(order.remaining(), 0);
    }

    #[test]
    fn fill_cash_flow_signs() {
        let fill = Fill {
            order_id: Uuid::nil(),
            symbol: "SPY250321C00450000".to_string(),
            strategy: "test".to_string(),
            side: OrderSide::Buy,
            quantity: 2,
            price: 1.50,
            slippage: 0.01,
            spread_cost: 0.02,
            commission: 1.30,
            fees: 0.10,
            ts: Utc::now(),
            venue: "SIM".to_string(),
        };
        // Buy 2 @ 1.50 x100 = -300, minus 1.40 costs.
        assert!((fill.cash_flow(100.0) - (-301.40)).abs() < 1e-9);
    }
}
