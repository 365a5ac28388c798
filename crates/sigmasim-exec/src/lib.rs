//! # Execution Simulator
//!
//! Converts an order intent plus a market snapshot into a realistic fill,
//! modeling the frictions a live broker would impose.
//!
//! ## Description
//! Quote-driven simulation around a theoretical mid supplied by the pricing
//! engine: a synthetic bid/ask is built from the dynamic spread model, then
//! market orders cross the book with slippage and liquidity-capped partial
//! fills, limit orders either cross immediately or park with a
//! queue-position fill probability evaluated once per bar, and stop orders
//! arm into market orders when the bar trades through the trigger.
//!
//! All randomized elements (broker rejection, partial-fill ratio, price
//! improvement, queue fills) draw from one seeded PRNG so identical seeds
//! reproduce identical runs.
//!
//! ### Module Structure
//! - [`spread`] - dynamic bid-ask spread model
//! - [`slippage`] - adverse price movement model
//! - [`commission`] - commission/fee schedule by instrument class

pub mod commission;
pub mod slippage;
pub mod spread;

pub use commission::{ClassSchedule, CommissionSchedule};
pub use slippage::{SlippageConfig, SlippageModel};
pub use spread::{SpreadConfig, SpreadModel};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use sigmasim_models::{
    Fill, InstrumentClass, MarketSnapshot, Order, OrderSide, OrderType, RejectReason,
    TradingPhase,
};
use sigmasim_pricing::Valuation;
use thiserror::Error;
use tracing::debug;

/// Venue tag stamped on every simulated fill.
pub const SIM_VENUE: &str = "SIM";

/// Configuration errors are fatal at startup; everything else degrades.
#[derive(Debug, Error)]
pub enum ExecConfigError {
    #[error("rejection rate {0} outside [0, 1]")]
    RejectionRate(f64),
    #[error("liquidity fraction {0} must be positive")]
    LiquidityFraction(f64),
    #[error("price improvement chance {0} outside [0, 1]")]
    PriceImprovement(f64),
}

/// Queue-position policy for parked limit orders. The coefficients are
/// configurable policy, directionally realistic only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueuePolicy {
    /// Fill probability per bar for a limit resting exactly at the touch.
    pub base_fill_prob: f64,
    /// Volume treated as "normal"; probability scales with √(volume ratio).
    pub reference_volume: f64,
}

impl Default for QueuePolicy {
    fn default() -> Self {
        Self {
            base_fill_prob: 0.35,
            reference_volume: 1_000_000.0,
        }
    }
}

/// Top-level execution simulator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Base probability of a broker-style rejection per order.
    pub rejection_rate: f64,
    /// Fraction of bar volume available to a single order, expressed in
    /// contracts per million shares of underlying volume.
    pub liquidity_contracts_per_mm_volume: f64,
    /// Chance that a marketable order fills inside the touch.
    pub price_improvement_chance: f64,
    pub queue: QueuePolicy,
    pub spread: SpreadConfig,
    pub slippage: SlippageConfig,
    pub commissions: CommissionSchedule,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            rejection_rate: 0.01,
            liquidity_contracts_per_mm_volume: 500.0,
            price_improvement_chance: 0.10,
            queue: QueuePolicy::default(),
            spread: SpreadConfig::default(),
            slippage: SlippageConfig::default(),
            commissions: CommissionSchedule::default(),
        }
    }
}

/// Per-order context computed by the caller from the pricing engine.
#[derive(Debug, Clone, Copy)]
pub struct ExecContext {
    /// Theoretical mid for the contract being traded.
    pub theo_mid: f64,
    /// Adjusted volatility used for this contract's valuation.
    pub vol: f64,
    pub class: InstrumentClass,
}

impl ExecContext {
    /// Builds the context from a pricing-engine valuation.
    pub fn from_valuation(valuation: &Valuation, vol: f64, class: InstrumentClass) -> Self {
        Self {
            theo_mid: valuation.price,
            vol,
            class,
        }
    }
}

/// Outcome of one simulation attempt.
#[derive(Debug, Clone)]
pub enum FillOutcome {
    /// Entire remaining quantity executed.
    Filled(Fill),
    /// Liquidity-capped execution of part of the remaining quantity.
    PartiallyFilled(Fill),
    /// Order remains working; re-evaluate next bar.
    Parked,
    /// Order refused; terminal for the order.
    Rejected(RejectReason),
}

/// Execution-quality statistics for a run.
#[derive(Debug, Clone, Default)]
pub struct ExecStats {
    pub orders_seen: u64,
    pub fills: u64,
    pub partial_fills: u64,
    pub rejections: u64,
    pub parked: u64,
    /// Slippage per fill in basis points of the theoretical mid.
    pub slippage_samples_bps: Vec<f64>,
}

impl ExecStats {
    pub fn avg_slippage_bps(&self) -> f64 {
        if self.slippage_samples_bps.is_empty() {
            return 0.0;
        }
        self.slippage_samples_bps.iter().sum::<f64>() / self.slippage_samples_bps.len() as f64
    }

    /// Slippage percentile in [0, 100].
    pub fn slippage_percentile(&self, p: f64) -> f64 {
        if self.slippage_samples_bps.is_empty() {
            return 0.0;
        }
        let mut sorted = self.slippage_samples_bps.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
        sorted[idx.min(sorted.len() - 1)]
    }
}

/// Quote-driven execution simulator with seeded randomness.
pub struct ExecutionSimulator {
    config: ExecConfig,
    spread_model: SpreadModel,
    slippage_model: SlippageModel,
    rng: Pcg64,
    stats: ExecStats,
}

impl ExecutionSimulator {
    /// Validates the configuration and seeds the PRNG.
    ///
    /// # Errors
    /// Returns [`ExecConfigError`] for out-of-range rates; configuration
    /// errors are the only fatal errors in the execution layer.
    pub fn new(config: ExecConfig, seed: u64) -> Result<Self, ExecConfigError> {
        if !(0.0..=1.0).contains(&config.rejection_rate) {
            return Err(ExecConfigError::RejectionRate(config.rejection_rate));
        }
        if config.liquidity_contracts_per_mm_volume <= 0.0 {
            return Err(ExecConfigError::LiquidityFraction(
                config.liquidity_contracts_per_mm_volume,
            ));
        }
        if !(0.0..=1.0).contains(&config.price_improvement_chance) {
            return Err(ExecConfigError::PriceImprovement(
                config.price_improvement_chance,
            ));
        }
        let spread_model = SpreadModel::new(config.spread.clone());
        let slippage_model = SlippageModel::new(config.slippage.clone());
        Ok(Self {
            config,
            spread_model,
            slippage_model,
            rng: Pcg64::seed_from_u64(seed),
            stats: ExecStats::default(),
        })
    }

    pub fn stats(&self) -> &ExecStats {
        &self.stats
    }

    /// Synthetic spread for an order under current conditions.
    pub fn synthetic_spread(&self, order: &Order, snap: &MarketSnapshot, ctx: &ExecContext) -> f64 {
        self.spread_model.spread(
            ctx.class,
            ctx.vol,
            snap.phase,
            snap.volume,
            snap.last,
            order.contract.strike,
            order.contract.option_type,
        )
    }

    /// Worst-case slippage magnitude for an order, for fill-price bands.
    pub fn max_slippage(&self, order: &Order, ctx: &ExecContext) -> f64 {
        self.slippage_model.max_magnitude(order.remaining(), ctx.vol)
    }

    /// Simulates an order against one bar.
    ///
    /// Validation runs before any pricing logic: malformed orders, closed
    /// markets, and randomized broker rejections short-circuit to
    /// [`FillOutcome::Rejected`].
    pub fn simulate_fill(
        &mut self,
        order: &Order,
        snap: &MarketSnapshot,
        ctx: &ExecContext,
    ) -> FillOutcome {
        self.stats.orders_seen += 1;

        if let Some(reason) = self.validate(order, snap) {
            self.stats.rejections += 1;
            return FillOutcome::Rejected(reason);
        }

        if self.rng.gen::<f64>() < self.config.rejection_rate {
            self.stats.rejections += 1;
            debug!(order_id = %order.id, "order hit randomized broker rejection");
            return FillOutcome::Rejected(RejectReason::BrokerRejected);
        }

        match order.order_type {
            OrderType::Market => self.fill_marketable(order, snap, ctx),
            OrderType::Limit => self.try_limit(order, snap, ctx),
            OrderType::Stop => {
                if self.stop_triggered(order, snap) {
                    self.fill_marketable(order, snap, ctx)
                } else {
                    self.stats.parked += 1;
                    FillOutcome::Parked
                }
            }
        }
    }

    /// Re-evaluates a parked limit or stop order on a new bar. Stop orders
    /// check their trigger; limit orders roll the queue-position dice.
    pub fn evaluate_parked(
        &mut self,
        order: &Order,
        snap: &MarketSnapshot,
        ctx: &ExecContext,
    ) -> FillOutcome {
        match order.order_type {
            OrderType::Stop => {
                if self.stop_triggered(order, snap) {
                    self.fill_marketable(order, snap, ctx)
                } else {
                    FillOutcome::Parked
                }
            }
            OrderType::Limit => {
                let outcome = self.try_limit(order, snap, ctx);
                match outcome {
                    FillOutcome::Parked => self.try_queue_fill(order, snap, ctx),
                    other => other,
                }
            }
            OrderType::Market => self.fill_marketable(order, snap, ctx),
        }
    }

    fn validate(&self, order: &Order, snap: &MarketSnapshot) -> Option<RejectReason> {
        if order.contract.symbol.is_empty() || order.contract.underlying.is_empty() {
            return Some(RejectReason::InvalidOrder("missing symbol".to_string()));
        }
        if order.quantity == 0 || order.remaining() == 0 {
            return Some(RejectReason::InvalidOrder("zero quantity".to_string()));
        }
        if order.order_type == OrderType::Limit && order.limit_price.is_none() {
            return Some(RejectReason::InvalidOrder(
                "limit order without limit price".to_string(),
            ));
        }
        if order.order_type == OrderType::Stop && order.stop_price.is_none() {
            return Some(RejectReason::InvalidOrder(
                "stop order without stop price".to_string(),
            ));
        }
        if !TradingPhase::market_open(snap.ts) {
            return Some(RejectReason::MarketClosed);
        }
        None
    }

    fn stop_triggered(&self, order: &Order, snap: &MarketSnapshot) -> bool {
        let Some(stop) = order.stop_price else {
            return false;
        };
        match order.side {
            // Buy stop arms when the market trades up through the trigger.
            OrderSide::Buy => snap.high >= stop,
            OrderSide::Sell => snap.low <= stop,
        }
    }

    /// Market-order path: mid ± half-spread ± slippage, liquidity-capped.
    fn fill_marketable(
        &mut self,
        order: &Order,
        snap: &MarketSnapshot,
        ctx: &ExecContext,
    ) -> FillOutcome {
        let spread = self.synthetic_spread(order, snap, ctx);
        let mut half_spread = spread * 0.5;

        if self.rng.gen::<f64>() < self.config.price_improvement_chance {
            // Fill inside the touch by a random fraction of the half-spread.
            half_spread *= self.rng.gen_range(0.2..0.8);
        }

        let slip = self
            .slippage_model
            .magnitude(order.remaining(), ctx.vol, snap.phase);

        let price = match order.side {
            OrderSide::Buy => ctx.theo_mid + half_spread + slip,
            OrderSide::Sell => (ctx.theo_mid - half_spread - slip).max(0.0),
        };

        let remaining = order.remaining();
        let available = self.available_contracts(snap);
        let (quantity, partial) = if remaining <= available {
            (remaining, false)
        } else {
            // Insufficient displayed liquidity: randomized partial ratio.
            let ratio = self.rng.gen_range(0.4..0.9);
            let qty = ((available as f64 * ratio) as u32).clamp(1, remaining);
            (qty, true)
        };

        let (commission, fees) = self.config.commissions.calculate(ctx.class, quantity);
        let fill = Fill {
            order_id: order.id,
            symbol: order.contract.symbol.clone(),
            strategy: order.strategy.clone(),
            side: order.side,
            quantity,
            price,
            slippage: slip,
            spread_cost: half_spread,
            commission,
            fees,
            ts: snap.ts,
            venue: SIM_VENUE.to_string(),
        };
        self.record_fill(&fill, ctx.theo_mid, partial);
        if partial {
            FillOutcome::PartiallyFilled(fill)
        } else {
            FillOutcome::Filled(fill)
        }
    }

    /// Limit path: fill only when the limit has crossed the synthetic book.
    fn try_limit(&mut self, order: &Order, snap: &MarketSnapshot, ctx: &ExecContext) -> FillOutcome {
        let Some(limit) = order.limit_price else {
            self.stats.rejections += 1;
            return FillOutcome::Rejected(RejectReason::InvalidOrder(
                "limit order without limit price".to_string(),
            ));
        };
        let spread = self.synthetic_spread(order, snap, ctx);
        let bid = (ctx.theo_mid - spread * 0.5).max(0.0);
        let ask = ctx.theo_mid + spread * 0.5;

        let crossed = match order.side {
            OrderSide::Buy => limit >= ask,
            OrderSide::Sell => limit <= bid,
        };
        if !crossed {
            self.stats.parked += 1;
            return FillOutcome::Parked;
        }

        // Crossing limits execute at the touch, never worse than the limit.
        let price = match order.side {
            OrderSide::Buy => ask.min(limit),
            OrderSide::Sell => bid.max(limit),
        };

        let quantity = order.remaining();
        let (commission, fees) = self.config.commissions.calculate(ctx.class, quantity);
        let fill = Fill {
            order_id: order.id,
            symbol: order.contract.symbol.clone(),
            strategy: order.strategy.clone(),
            side: order.side,
            quantity,
            price,
            slippage: 0.0,
            spread_cost: spread * 0.5,
            commission,
            fees,
            ts: snap.ts,
            venue: SIM_VENUE.to_string(),
        };
        self.record_fill(&fill, ctx.theo_mid, false);
        FillOutcome::Filled(fill)
    }

    /// Queue-position model for a resting limit: probability of getting
    /// filled this bar decays with distance from mid and scales with volume.
    fn try_queue_fill(
        &mut self,
        order: &Order,
        snap: &MarketSnapshot,
        ctx: &ExecContext,
    ) -> FillOutcome {
        let Some(limit) = order.limit_price else {
            return FillOutcome::Parked;
        };
        let spread = self.synthetic_spread(order, snap, ctx);
        if spread <= 0.0 {
            return FillOutcome::Parked;
        }

        let distance = (ctx.theo_mid - limit).abs();
        // 1.0 at the mid, 0.0 one full spread away.
        let closeness = (1.0 - distance / spread).clamp(0.0, 1.0);
        let volume_factor = if self.config.queue.reference_volume > 0.0 {
            (snap.volume / self.config.queue.reference_volume)
                .sqrt()
                .min(1.5)
        } else {
            1.0
        };
        let p = (self.config.queue.base_fill_prob * closeness * volume_factor).clamp(0.0, 1.0);

        if self.rng.gen::<f64>() >= p {
            return FillOutcome::Parked;
        }

        let quantity = order.remaining();
        let (commission, fees) = self.config.commissions.calculate(ctx.class, quantity);
        let fill = Fill {
            order_id: order.id,
            symbol: order.contract.symbol.clone(),
            strategy: order.strategy.clone(),
            side: order.side,
            quantity,
            price: limit,
            slippage: 0.0,
            spread_cost: (ctx.theo_mid - limit).abs(),
            commission,
            fees,
            ts: snap.ts,
            venue: SIM_VENUE.to_string(),
        };
        self.record_fill(&fill, ctx.theo_mid, false);
        FillOutcome::Filled(fill)
    }

    fn available_contracts(&self, snap: &MarketSnapshot) -> u32 {
        let contracts =
            snap.volume / 1_000_000.0 * self.config.liquidity_contracts_per_mm_volume;
        (contracts as u32).max(1)
    }

    fn record_fill(&mut self, fill: &Fill, theo_mid: f64, partial: bool) {
        if partial {
            self.stats.partial_fills += 1;
        } else {
            self.stats.fills += 1;
        }
        if theo_mid > 0.0 {
            let adverse = match fill.side {
                OrderSide::Buy => fill.price - theo_mid,
                OrderSide::Sell => theo_mid - fill.price,
            };
            let bps = adverse / theo_mid * 10_000.0;
            if bps.is_finite() {
                self.stats.slippage_samples_bps.push(bps);
            }
        }
    }
}
