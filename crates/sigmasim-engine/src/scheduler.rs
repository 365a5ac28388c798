//! # Event Scheduler
//!
//! The deterministic event loop at the center of a run.
//!
//! ## Description
//! Events drain from the bounded queue in (timestamp, priority, enqueue
//! order). Each market-data bar drives a fixed pipeline: re-mark positions on
//! the bar's underlying, re-evaluate parked orders, then hand the bar to
//! every strategy. Strategy intents pass pre-trade risk checks before they
//! become order events; order events run through the execution simulator.
//! Realized executions are booked into the ledger, the fill log, and the
//! owning strategy synchronously at execution time, then surfaced as fill
//! notification events; dropping a notification never loses the trade.
//!
//! A failure while handling one event is logged and counted; it never aborts
//! the run. When a tick's event count exceeds the configured cap, the
//! remainder of that tick is dropped with a warning.
//!
//! At each tick boundary the scheduler settles expired positions at
//! intrinsic value, cancels working orders on expired contracts, prunes
//! terminal orders, and pushes a portfolio snapshot.

use crate::config::SimConfig;
use crate::error::EngineError;
use crate::portfolio::{PortfolioSnapshot, PortfolioState};
use crate::queue::{EventId, EventQueue};
use crate::risk::RiskEngine;
use crate::strategy::{OrderRequest, Strategy};
use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use sigmasim_exec::{ExecContext, ExecStats, ExecutionSimulator, FillOutcome};
use sigmasim_models::event::RiskNote;
use sigmasim_models::{
    EventPayload, Fill, MarketSnapshot, OptionContract, Order, OrderSide, OrderStatus,
    PositionKey,
};
use sigmasim_pricing::{PricingInputs, Valuation, VolSurface};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Aggregate counters and per-tick snapshots for one completed run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub ticks: u64,
    pub events_processed: u64,
    /// Events whose handler returned an error; isolated, never fatal.
    pub events_failed: u64,
    /// Events dropped by queue capacity or the per-tick cap.
    pub events_dropped: u64,
    /// Ticks that hit the per-tick event cap.
    pub truncated_ticks: u64,
    pub snapshots: Vec<PortfolioSnapshot>,
}

impl RunSummary {
    pub fn final_snapshot(&self) -> Option<&PortfolioSnapshot> {
        self.snapshots.last()
    }
}

/// Deterministic event-driven simulation core.
pub struct EventScheduler {
    config: SimConfig,
    queue: EventQueue,
    portfolio: PortfolioState,
    risk: RiskEngine,
    exec: ExecutionSimulator,
    surface: VolSurface,
    strategies: Vec<Box<dyn Strategy>>,
    /// Latest bar per underlying; the valuation context for everything.
    marks: HashMap<String, MarketSnapshot>,
    /// Working and just-terminal orders, pruned at tick boundaries.
    open_orders: HashMap<Uuid, Order>,
    /// Last seen bar timestamp per underlying, for monotonicity checks.
    last_bar_ts: HashMap<String, DateTime<Utc>>,
    id_rng: Pcg64,
    /// Applied fills in dispatch order.
    fill_log: Vec<Fill>,
    summary: RunSummary,
}

impl EventScheduler {
    /// Validates the configuration and assembles the core.
    ///
    /// # Errors
    /// [`EngineError::Config`] for invalid configuration; fatal.
    pub fn new(
        config: SimConfig,
        strategies: Vec<Box<dyn Strategy>>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let exec = ExecutionSimulator::new(config.exec.clone(), config.seed)?;
        let queue = EventQueue::new(config.queue_capacity, config.priority.clone());
        let portfolio = PortfolioState::new(config.initial_cash, config.contract_multiplier);
        let risk = RiskEngine::new(config.risk.clone());
        let surface = VolSurface::new(config.surface.clone());
        // Separate id stream so order ids do not consume execution draws.
        let id_rng = Pcg64::seed_from_u64(config.seed.wrapping_add(1));
        Ok(Self {
            config,
            queue,
            portfolio,
            risk,
            exec,
            surface,
            strategies,
            marks: HashMap::new(),
            open_orders: HashMap::new(),
            last_bar_ts: HashMap::new(),
            id_rng,
            fill_log: Vec::new(),
            summary: RunSummary::default(),
        })
    }

    pub fn portfolio(&self) -> &PortfolioState {
        &self.portfolio
    }

    pub fn exec_stats(&self) -> &ExecStats {
        self.exec.stats()
    }

    /// Every applied fill, in dispatch order.
    pub fn fill_log(&self) -> &[Fill] {
        &self.fill_log
    }

    /// Fill log as one JSON object per line, for run artifacts.
    pub fn fill_log_jsonl(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        for fill in &self.fill_log {
            out.push_str(&serde_json::to_string(fill)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Enqueues an externally sourced event.
    ///
    /// # Errors
    /// [`EngineError::QueueFull`] when the bounded queue is at capacity; the
    /// event is dropped and the queue is unchanged.
    pub fn enqueue(
        &mut self,
        ts: DateTime<Utc>,
        payload: EventPayload,
    ) -> Result<EventId, EngineError> {
        self.queue.enqueue(ts, payload)
    }

    /// Drains the queue to completion and returns the run summary.
    pub fn run(&mut self) -> RunSummary {
        self.run_window(None, None)
    }

    /// Runs over a clock window: events before `start` are dropped, and the
    /// run stops (leaving later events queued) once the next event is past
    /// `end`.
    pub fn run_between(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> RunSummary {
        self.run_window(Some(start), Some(end))
    }

    fn run_window(
        &mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> RunSummary {
        let mut current_tick: Option<DateTime<Utc>> = None;
        let mut events_this_tick = 0usize;
        let mut tick_truncated = false;

        loop {
            match (self.queue.peek_ts(), end) {
                (Some(next), Some(end)) if next > end => break,
                (None, _) => break,
                _ => {}
            }
            let Some((ts, payload)) = self.queue.pop() else {
                break;
            };
            if let Some(start) = start {
                if ts < start {
                    self.summary.events_dropped += 1;
                    continue;
                }
            }
            match current_tick {
                Some(tick) if ts > tick => {
                    self.finalize_tick(tick);
                    current_tick = Some(ts);
                    events_this_tick = 0;
                    tick_truncated = false;
                }
                None => current_tick = Some(ts),
                _ => {}
            }

            events_this_tick += 1;
            if events_this_tick > self.config.max_events_per_tick {
                if !tick_truncated {
                    warn!(
                        %ts,
                        cap = self.config.max_events_per_tick,
                        "per-tick event cap hit; dropping the remainder of the tick"
                    );
                    self.summary.truncated_ticks += 1;
                    tick_truncated = true;
                }
                self.summary.events_dropped += 1;
                continue;
            }

            match self.dispatch(payload) {
                Ok(()) => self.summary.events_processed += 1,
                Err(err) => {
                    self.summary.events_failed += 1;
                    error!(%ts, %err, "event handler failed; event dropped");
                }
            }
        }

        if let Some(tick) = current_tick {
            self.finalize_tick(tick);
        }

        info!(
            ticks = self.summary.ticks,
            processed = self.summary.events_processed,
            failed = self.summary.events_failed,
            dropped = self.summary.events_dropped,
            "run complete"
        );
        self.summary.clone()
    }

    fn dispatch(&mut self, payload: EventPayload) -> Result<(), EngineError> {
        match payload {
            EventPayload::MarketData(snap) => self.on_market_data(snap),
            EventPayload::Order(order) => self.on_order(order),
            EventPayload::Fill(fill) => self.on_fill(fill),
            EventPayload::StrategySignal(note) => {
                debug!(symbol = %note.symbol, strategy = %note.strategy, note = %note.note, "signal");
                Ok(())
            }
            EventPayload::Risk(note) => {
                warn!(strategy = %note.strategy, detail = %note.detail, "risk event");
                Ok(())
            }
            EventPayload::TimeTrigger(note) => {
                info!(label = %note.label, "time trigger");
                Ok(())
            }
            EventPayload::CorporateAction(note) => {
                info!(symbol = %note.symbol, detail = %note.detail, "corporate action");
                Ok(())
            }
        }
    }

    /// Market-data pipeline: mark → parked orders → strategies.
    fn on_market_data(&mut self, snap: MarketSnapshot) -> Result<(), EngineError> {
        if let Some(prev) = self.last_bar_ts.get(&snap.symbol) {
            if snap.ts < *prev {
                return Err(EngineError::InvalidEvent(format!(
                    "market data for {} went backwards: {} after {}",
                    snap.symbol, snap.ts, prev
                )));
            }
        }
        self.last_bar_ts.insert(snap.symbol.clone(), snap.ts);
        self.marks.insert(snap.symbol.clone(), snap.clone());

        self.revalue_underlying(&snap);
        self.evaluate_parked(&snap);

        let mut submissions: Vec<(String, OrderRequest)> = Vec::new();
        {
            let portfolio = &self.portfolio;
            for strategy in &mut self.strategies {
                for request in strategy.on_bar(&snap, portfolio) {
                    submissions.push((strategy.name().to_string(), request));
                }
            }
        }
        for (name, request) in submissions {
            self.submit_request(&name, request, &snap);
        }
        Ok(())
    }

    /// Re-marks every position on this bar's underlying.
    fn revalue_underlying(&mut self, snap: &MarketSnapshot) {
        let targets: Vec<(PositionKey, OptionContract)> = self
            .portfolio
            .positions()
            .filter(|p| p.contract.underlying == snap.symbol)
            .map(|p| (p.key.clone(), p.contract.clone()))
            .collect();
        for (key, contract) in targets {
            let (valuation, _) = self.value_contract(&contract, snap);
            self.portfolio.mark(&key, valuation.price, valuation.greeks);
        }
    }

    /// Gives every working order on this underlying one fill attempt.
    fn evaluate_parked(&mut self, snap: &MarketSnapshot) {
        let ids: Vec<Uuid> = self
            .open_orders
            .values()
            .filter(|o| {
                o.contract.underlying == snap.symbol
                    && !o.status.is_terminal()
                    && o.remaining() > 0
            })
            .map(|o| o.id)
            .collect();
        for id in ids {
            let Some(order) = self.open_orders.remove(&id) else {
                continue;
            };
            let (valuation, vol) = self.value_contract(&order.contract, snap);
            let ctx = ExecContext::from_valuation(
                &valuation,
                vol,
                self.config.class_for(&order.contract.underlying),
            );
            let outcome = self.exec.evaluate_parked(&order, snap, &ctx);
            self.handle_outcome(order, outcome);
        }
    }

    /// Risk-checks a strategy intent and enqueues it as an order event.
    fn submit_request(&mut self, strategy: &str, request: OrderRequest, snap: &MarketSnapshot) {
        let id = Uuid::from_u128(self.id_rng.gen());
        let order = request.into_order(id, strategy, snap.ts);
        let estimated = self.estimated_cost(&order, snap);

        match self.risk.check_order(&order, estimated, &self.portfolio) {
            Ok(()) => {
                if let Err(err) = self.queue.enqueue(snap.ts, EventPayload::Order(order)) {
                    warn!(%err, strategy, "order event dropped at enqueue");
                    self.summary.events_dropped += 1;
                }
            }
            Err(violation) => {
                let note = RiskNote {
                    strategy: strategy.to_string(),
                    detail: violation.to_string(),
                };
                if let Err(err) = self.queue.enqueue(snap.ts, EventPayload::Risk(note)) {
                    warn!(%err, strategy, "risk event dropped at enqueue");
                    self.summary.events_dropped += 1;
                }
            }
        }
    }

    /// Worst-case debit of an order: theoretical mid plus full frictions.
    /// Sells are credits and consume no buying power.
    fn estimated_cost(&self, order: &Order, snap: &MarketSnapshot) -> f64 {
        if order.side == OrderSide::Sell {
            return 0.0;
        }
        let (valuation, vol) = self.value_contract(&order.contract, snap);
        let ctx = ExecContext::from_valuation(
            &valuation,
            vol,
            self.config.class_for(&order.contract.underlying),
        );
        let spread = self.exec.synthetic_spread(order, snap, &ctx);
        let slip = self.exec.max_slippage(order, &ctx);
        (valuation.price + spread * 0.5 + slip)
            * order.quantity as f64
            * self.config.contract_multiplier
    }

    /// Order events run through the execution simulator exactly once.
    fn on_order(&mut self, order: Order) -> Result<(), EngineError> {
        let Some(snap) = self.marks.get(&order.contract.underlying).cloned() else {
            return Err(EngineError::InvalidEvent(format!(
                "order {} arrived before any market data for {}",
                order.id, order.contract.underlying
            )));
        };
        let (valuation, vol) = self.value_contract(&order.contract, &snap);
        let ctx = ExecContext::from_valuation(
            &valuation,
            vol,
            self.config.class_for(&order.contract.underlying),
        );
        let outcome = self.exec.simulate_fill(&order, &snap, &ctx);
        self.handle_outcome(order, outcome);
        Ok(())
    }

    /// Applies an execution outcome to the order. Fills are booked into the
    /// ledger here, before any further event traffic, so the order state and
    /// the cash flow can never diverge.
    fn handle_outcome(&mut self, mut order: Order, outcome: FillOutcome) {
        match outcome {
            FillOutcome::Filled(fill) | FillOutcome::PartiallyFilled(fill) => {
                order.filled_quantity += fill.quantity;
                order.status = if order.remaining() == 0 {
                    OrderStatus::Filled
                } else {
                    OrderStatus::PartiallyFilled
                };
                let contract = order.contract.clone();
                let ts = fill.ts;
                self.open_orders.insert(order.id, order);
                self.apply_fill(fill.clone(), &contract);
                // Notification only; the execution is already booked.
                if let Err(err) = self.queue.enqueue(ts, EventPayload::Fill(fill)) {
                    warn!(%err, "fill notification dropped at enqueue");
                    self.summary.events_dropped += 1;
                }
            }
            FillOutcome::Parked => {
                self.open_orders.insert(order.id, order);
            }
            FillOutcome::Rejected(reason) => {
                warn!(order_id = %order.id, %reason, "order rejected");
                order.status = OrderStatus::Rejected;
                self.open_orders.insert(order.id, order);
            }
        }
    }

    /// Books one realized execution: ledger, position re-mark, owning
    /// strategy, fill log. Called at execution time, never from the queue.
    fn apply_fill(&mut self, fill: Fill, contract: &OptionContract) {
        self.portfolio.apply_fill(&fill, contract);
        debug!(
            symbol = %fill.symbol,
            strategy = %fill.strategy,
            quantity = fill.quantity,
            price = fill.price,
            "fill applied"
        );

        // Mark the touched position immediately so tick-end snapshots do not
        // lag behind the fill.
        if let Some(snap) = self.marks.get(&contract.underlying).cloned() {
            let key = PositionKey::new(&fill.symbol, &fill.strategy);
            if self.portfolio.position(&key).is_some() {
                let (valuation, _) = self.value_contract(contract, &snap);
                self.portfolio.mark(&key, valuation.price, valuation.greeks);
            }
        }

        for strategy in &mut self.strategies {
            if strategy.name() == fill.strategy {
                strategy.on_fill(&fill);
            }
        }
        self.fill_log.push(fill);
    }

    /// Fill events are notifications of executions already booked. A fill
    /// referencing an order this scheduler never saw is invalid.
    fn on_fill(&mut self, fill: Fill) -> Result<(), EngineError> {
        if !self.open_orders.contains_key(&fill.order_id) {
            return Err(EngineError::InvalidEvent(format!(
                "fill references unknown order {}",
                fill.order_id
            )));
        }
        debug!(order_id = %fill.order_id, quantity = fill.quantity, "fill notification");
        Ok(())
    }

    /// Settles expiries, prunes terminal orders, and snapshots the book.
    fn finalize_tick(&mut self, ts: DateTime<Utc>) {
        let expired: Vec<(PositionKey, OptionContract)> = self
            .portfolio
            .positions()
            .filter(|p| p.contract.is_expired(ts))
            .map(|p| (p.key.clone(), p.contract.clone()))
            .collect();
        for (key, contract) in expired {
            let spot = self.marks.get(&contract.underlying).map(|s| s.last);
            let intrinsic = match spot {
                Some(spot) => contract.intrinsic(spot),
                None => {
                    warn!(symbol = %key.symbol, "no mark for expiring contract; settling at zero");
                    0.0
                }
            };
            if let Some(pnl) = self.portfolio.settle_expiry(&key, intrinsic) {
                info!(symbol = %key.symbol, strategy = %key.strategy, intrinsic, pnl, "expired");
            }
        }

        for order in self.open_orders.values_mut() {
            if !order.status.is_terminal() && order.contract.is_expired(ts) {
                order.status = OrderStatus::Cancelled;
                debug!(order_id = %order.id, "working order cancelled at expiry");
            }
        }
        self.open_orders.retain(|_, o| !o.status.is_terminal());

        self.summary.ticks += 1;
        self.summary.snapshots.push(self.portfolio.snapshot(ts));
    }

    /// Valuation of one contract under the current bar: surface-adjusted vol
    /// into the closed form, with the configured rate and dividend tables.
    fn value_contract(&self, contract: &OptionContract, snap: &MarketSnapshot) -> (Valuation, f64) {
        let days = contract.days_to_expiry(snap.ts);
        let vol = self.surface.adjust(
            snap.implied_vol,
            snap.last,
            contract.strike,
            days,
            contract.option_type,
        );
        let inputs = PricingInputs {
            spot: snap.last,
            strike: contract.strike,
            time_to_expiry: contract.time_to_expiry(snap.ts).max(0.0),
            volatility: vol,
            risk_free_rate: self.config.rate_for(days),
            dividend_yield: self.config.dividend_for(&contract.underlying),
            option_type: contract.option_type,
        };
        (sigmasim_pricing::price(&inputs), vol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sigmasim_models::{OptionType, TradingPhase};

    fn bar(minute: u32, last: f64) -> MarketSnapshot {
        let ts = Utc.with_ymd_and_hms(2025, 3, 3, 16, minute, 0).unwrap();
        MarketSnapshot {
            ts,
            symbol: "SPY".to_string(),
            open: last,
            high: last + 0.5,
            low: last - 0.5,
            close: last,
            last,
            volume: 2_000_000.0,
            bid: last - 0.02,
            ask: last + 0.02,
            implied_vol: 0.20,
            phase: TradingPhase::Normal,
        }
    }

    fn contract(strike: f64, option_type: OptionType) -> OptionContract {
        let expiry = Utc.with_ymd_and_hms(2025, 4, 18, 21, 0, 0).unwrap();
        OptionContract::new("SPY", strike, expiry, option_type)
    }

    fn quiet_config() -> SimConfig {
        let mut config = SimConfig::default();
        config.exec.rejection_rate = 0.0;
        config
    }

    #[test]
    fn empty_queue_run_is_a_no_op() {
        let mut scheduler = EventScheduler::new(quiet_config(), Vec::new()).unwrap();
        let summary = scheduler.run();
        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.events_processed, 0);
        assert!(summary.snapshots.is_empty());
    }

    #[test]
    fn market_data_alone_produces_snapshots() {
        let mut scheduler = EventScheduler::new(quiet_config(), Vec::new()).unwrap();
        for minute in 0..3 {
            scheduler
                .enqueue(bar(minute, 450.0).ts, EventPayload::MarketData(bar(minute, 450.0)))
                .unwrap();
        }
        let summary = scheduler.run();
        assert_eq!(summary.ticks, 3);
        assert_eq!(summary.events_processed, 3);
        assert_eq!(summary.final_snapshot().unwrap().open_positions, 0);
    }

    #[test]
    fn backwards_market_data_is_isolated_not_fatal() {
        let mut scheduler = EventScheduler::new(quiet_config(), Vec::new()).unwrap();
        // Same symbol, but the second bar is stamped earlier than the first.
        // Enqueue order controls dispatch order within the later timestamp.
        let late = bar(10, 450.0);
        let early = bar(5, 451.0);
        scheduler
            .enqueue(late.ts, EventPayload::MarketData(late.clone()))
            .unwrap();
        scheduler
            .enqueue(late.ts, EventPayload::MarketData(early))
            .unwrap();

        let summary = scheduler.run();
        assert_eq!(summary.events_processed, 1);
        assert_eq!(summary.events_failed, 1);
    }

    #[test]
    fn orphan_fill_is_isolated() {
        let mut scheduler = EventScheduler::new(quiet_config(), Vec::new()).unwrap();
        let fill = Fill {
            order_id: Uuid::from_u128(99),
            symbol: contract(450.0, OptionType::Call).symbol,
            strategy: "ghost".to_string(),
            side: OrderSide::Buy,
            quantity: 1,
            price: 1.0,
            slippage: 0.0,
            spread_cost: 0.0,
            commission: 0.0,
            fees: 0.0,
            ts: bar(0, 450.0).ts,
            venue: "SIM".to_string(),
        };
        scheduler.enqueue(fill.ts, EventPayload::Fill(fill)).unwrap();
        let summary = scheduler.run();
        assert_eq!(summary.events_failed, 1);
        assert_eq!(scheduler.portfolio().open_positions(), 0);
    }

    #[test]
    fn per_tick_cap_truncates_with_counters() {
        let mut config = quiet_config();
        config.max_events_per_tick = 2;
        let mut scheduler = EventScheduler::new(config, Vec::new()).unwrap();
        let ts = bar(0, 450.0).ts;
        for _ in 0..5 {
            scheduler
                .enqueue(
                    ts,
                    EventPayload::TimeTrigger(sigmasim_models::event::TimeTriggerNote {
                        label: "flood".to_string(),
                    }),
                )
                .unwrap();
        }
        let summary = scheduler.run();
        assert_eq!(summary.events_processed, 2);
        assert_eq!(summary.events_dropped, 3);
        assert_eq!(summary.truncated_ticks, 1);
    }

    #[test]
    fn capped_tick_never_loses_a_booked_fill() {
        use crate::strategy::ScriptedStrategy;

        // Cap of 2 admits the bar and the order; the fill notification is
        // dropped by the cap, but the execution itself must stay booked.
        let mut config = quiet_config();
        config.max_events_per_tick = 2;

        let entry = bar(0, 450.0);
        let strategy = ScriptedStrategy::new(
            "capped",
            vec![(
                entry.ts,
                vec![OrderRequest::market(
                    contract(450.0, OptionType::Call),
                    OrderSide::Buy,
                    1,
                )],
            )],
        );
        let mut scheduler = EventScheduler::new(config, vec![Box::new(strategy)]).unwrap();
        scheduler
            .enqueue(entry.ts, EventPayload::MarketData(entry))
            .unwrap();
        let summary = scheduler.run();

        assert_eq!(summary.truncated_ticks, 1);
        assert_eq!(scheduler.exec_stats().fills, 1);
        assert_eq!(scheduler.fill_log().len(), 1);
        assert_eq!(scheduler.portfolio().open_positions(), 1);
        assert!(
            scheduler.portfolio().cash < SimConfig::default().initial_cash,
            "the fill's cash flow must reach the ledger"
        );
    }

    #[test]
    fn run_between_honors_the_clock_window() {
        let mut scheduler = EventScheduler::new(quiet_config(), Vec::new()).unwrap();
        for minute in 0..10 {
            let b = bar(minute, 450.0);
            scheduler.enqueue(b.ts, EventPayload::MarketData(b)).unwrap();
        }
        let summary = scheduler.run_between(bar(2, 450.0).ts, bar(6, 450.0).ts);
        // Bars 0-1 dropped, 2-6 processed, 7-9 left queued.
        assert_eq!(summary.events_processed, 5);
        assert_eq!(summary.events_dropped, 2);

        let rest = scheduler.run();
        assert_eq!(rest.events_processed, 8);
    }

    #[test]
    fn identical_seeds_identical_runs() {
        use crate::strategy::ScriptedStrategy;

        let run = |seed: u64| -> (f64, u64) {
            let mut config = quiet_config();
            config.seed = seed;
            let entry = bar(1, 450.0).ts;
            let strategy = ScriptedStrategy::new(
                "det",
                vec![(
                    entry,
                    vec![OrderRequest::market(
                        contract(450.0, OptionType::Call),
                        OrderSide::Buy,
                        2,
                    )],
                )],
            );
            let mut scheduler =
                EventScheduler::new(config, vec![Box::new(strategy)]).unwrap();
            for minute in 0..5 {
                let b = bar(minute, 450.0 + minute as f64 * 0.1);
                scheduler.enqueue(b.ts, EventPayload::MarketData(b)).unwrap();
            }
            let summary = scheduler.run();
            (
                summary.final_snapshot().unwrap().equity,
                summary.events_processed,
            )
        };

        assert_eq!(run(11), run(11));
    }
}
