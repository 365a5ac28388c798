//! End-to-end scenario runs through the full scheduler pipeline: market
//! data in, strategy intents through risk and execution, fills into the
//! ledger, expiry settlement out.

use chrono::{DateTime, TimeZone, Utc};
use sigmasim_engine::config::SimConfig;
use sigmasim_engine::scheduler::EventScheduler;
use sigmasim_engine::strategy::{OrderRequest, ScriptedStrategy, Strategy};
use sigmasim_engine::PortfolioState;
use sigmasim_exec::{SlippageModel, SpreadModel};
use sigmasim_models::{
    EventPayload, Fill, InstrumentClass, MarketSnapshot, OptionContract, OptionType, OrderSide,
    TradingPhase,
};
use sigmasim_pricing::{PricingInputs, VolSurface};
use std::cell::RefCell;
use std::rc::Rc;

fn bar_at(ts: DateTime<Utc>, last: f64, volume: f64) -> MarketSnapshot {
    MarketSnapshot {
        ts,
        symbol: "SPY".to_string(),
        open: last,
        high: last + 0.5,
        low: last - 0.5,
        close: last,
        last,
        volume,
        bid: last - 0.02,
        ask: last + 0.02,
        implied_vol: 0.20,
        phase: TradingPhase::Normal,
    }
}

fn session_bar(minute: u32, last: f64, volume: f64) -> MarketSnapshot {
    let ts = Utc.with_ymd_and_hms(2025, 3, 17, 16, minute, 0).unwrap();
    bar_at(ts, last, volume)
}

fn quiet_config() -> SimConfig {
    let mut config = SimConfig::default();
    config.exec.rejection_rate = 0.0;
    config
}

/// Scripted entry with fill capture for conservation checks.
struct RecordingStrategy {
    inner: ScriptedStrategy,
    fills: Rc<RefCell<Vec<Fill>>>,
}

impl RecordingStrategy {
    fn new(
        name: &str,
        steps: Vec<(DateTime<Utc>, Vec<OrderRequest>)>,
    ) -> (Self, Rc<RefCell<Vec<Fill>>>) {
        let fills = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                inner: ScriptedStrategy::new(name, steps),
                fills: fills.clone(),
            },
            fills,
        )
    }
}

impl Strategy for RecordingStrategy {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn on_bar(&mut self, snap: &MarketSnapshot, portfolio: &PortfolioState) -> Vec<OrderRequest> {
        self.inner.on_bar(snap, portfolio)
    }

    fn on_fill(&mut self, fill: &Fill) {
        self.fills.borrow_mut().push(fill.clone());
    }
}

#[test]
fn atm_market_buy_fills_inside_the_friction_band() {
    let config = quiet_config();
    let expiry = Utc.with_ymd_and_hms(2025, 4, 18, 21, 0, 0).unwrap();
    let contract = OptionContract::new("SPY", 450.0, expiry, OptionType::Call);

    let entry = session_bar(0, 450.0, 2_000_000.0);
    let (strategy, fills) = RecordingStrategy::new(
        "atm",
        vec![(
            entry.ts,
            vec![OrderRequest::market(contract.clone(), OrderSide::Buy, 1)],
        )],
    );

    let mut scheduler = EventScheduler::new(config.clone(), vec![Box::new(strategy)]).unwrap();
    scheduler
        .enqueue(entry.ts, EventPayload::MarketData(entry.clone()))
        .unwrap();
    let summary = scheduler.run();
    assert_eq!(summary.events_failed, 0);

    let fills = fills.borrow();
    assert_eq!(fills.len(), 1);
    let fill = &fills[0];
    assert_eq!(fill.quantity, 1);

    // Reconstruct the theoretical mid and friction band from the same models
    // the scheduler uses.
    let days = contract.days_to_expiry(entry.ts);
    let vol = VolSurface::new(config.surface.clone()).adjust(
        entry.implied_vol,
        entry.last,
        contract.strike,
        days,
        contract.option_type,
    );
    let valuation = sigmasim_pricing::price(&PricingInputs {
        spot: entry.last,
        strike: contract.strike,
        time_to_expiry: contract.time_to_expiry(entry.ts),
        volatility: vol,
        risk_free_rate: config.rate_for(days),
        dividend_yield: 0.0,
        option_type: contract.option_type,
    });
    let spread = SpreadModel::new(config.exec.spread.clone()).spread(
        InstrumentClass::EquityOption,
        vol,
        entry.phase,
        entry.volume,
        entry.last,
        contract.strike,
        contract.option_type,
    );
    let max_slip = SlippageModel::new(config.exec.slippage.clone()).max_magnitude(1, vol);

    assert!(
        fill.price > valuation.price,
        "buy must pay through the mid: {} vs {}",
        fill.price,
        valuation.price
    );
    assert!(
        fill.price <= valuation.price + spread * 0.5 + max_slip + 1e-9,
        "fill {} outside band (mid {}, spread {}, max slip {})",
        fill.price,
        valuation.price,
        spread,
        max_slip
    );

    // The fill reached the ledger exactly once.
    assert_eq!(scheduler.portfolio().open_positions(), 1);
    let snapshot = summary.final_snapshot().unwrap();
    assert_eq!(snapshot.open_positions, 1);
    assert!(snapshot.cash < config.initial_cash);
}

#[test]
fn oversized_order_conserves_quantity_across_partial_fills() {
    let config = quiet_config();
    let expiry = Utc.with_ymd_and_hms(2025, 4, 18, 21, 0, 0).unwrap();
    let contract = OptionContract::new("SPY", 450.0, expiry, OptionType::Call);

    // Thin bars: 10k shares of volume cap a single order at 5 contracts.
    let entry = session_bar(0, 450.0, 10_000.0);
    let (strategy, fills) = RecordingStrategy::new(
        "whale",
        vec![(
            entry.ts,
            vec![OrderRequest::market(contract, OrderSide::Buy, 50)],
        )],
    );

    let mut scheduler = EventScheduler::new(config, vec![Box::new(strategy)]).unwrap();
    for minute in 0..60 {
        let bar = session_bar(minute, 450.0, 10_000.0);
        scheduler.enqueue(bar.ts, EventPayload::MarketData(bar)).unwrap();
    }
    let summary = scheduler.run();
    assert_eq!(summary.events_failed, 0);

    let fills = fills.borrow();
    assert!(fills.len() > 1, "expected multiple partial fills");
    let total: u32 = fills.iter().map(|f| f.quantity).sum();
    assert_eq!(total, 50, "fills must conserve the ordered quantity");
    for fill in fills.iter() {
        assert!(fill.quantity >= 1 && fill.quantity <= 5);
    }

    let position = scheduler
        .portfolio()
        .positions()
        .next()
        .expect("position should exist");
    assert_eq!(position.quantity, 50);
    assert!(scheduler.exec_stats().partial_fills > 0);

    // The engine's own fill log agrees and is time-ordered.
    let log = scheduler.fill_log();
    assert_eq!(log.iter().map(|f| f.quantity).sum::<u32>(), 50);
    assert!(log.windows(2).all(|w| w[0].ts <= w[1].ts));
    let jsonl = scheduler.fill_log_jsonl().unwrap();
    assert_eq!(jsonl.lines().count(), log.len());
}

#[test]
fn iron_condor_expires_worthless_and_leaves_the_book_clean() {
    let config = quiet_config();
    let expiry = Utc.with_ymd_and_hms(2025, 3, 21, 21, 0, 0).unwrap();
    let legs = vec![
        OrderRequest::market(
            OptionContract::new("SPY", 460.0, expiry, OptionType::Call),
            OrderSide::Sell,
            1,
        ),
        OrderRequest::market(
            OptionContract::new("SPY", 465.0, expiry, OptionType::Call),
            OrderSide::Buy,
            1,
        ),
        OrderRequest::market(
            OptionContract::new("SPY", 440.0, expiry, OptionType::Put),
            OrderSide::Sell,
            1,
        ),
        OrderRequest::market(
            OptionContract::new("SPY", 435.0, expiry, OptionType::Put),
            OrderSide::Buy,
            1,
        ),
    ];

    let entry = session_bar(0, 450.0, 2_000_000.0);
    let strategy = ScriptedStrategy::new("condor", vec![(entry.ts, legs)]);
    let mut scheduler = EventScheduler::new(config, vec![Box::new(strategy)]).unwrap();

    scheduler
        .enqueue(entry.ts, EventPayload::MarketData(entry.clone()))
        .unwrap();
    // Expiry Friday: a final in-session mark with the spot inside the wings,
    // then a scheduled trigger at the settlement cut.
    let friday_mark = bar_at(
        Utc.with_ymd_and_hms(2025, 3, 21, 20, 50, 0).unwrap(),
        450.5,
        2_000_000.0,
    );
    scheduler
        .enqueue(friday_mark.ts, EventPayload::MarketData(friday_mark))
        .unwrap();
    scheduler
        .enqueue(
            expiry,
            EventPayload::TimeTrigger(sigmasim_models::event::TimeTriggerNote {
                label: "settlement".to_string(),
            }),
        )
        .unwrap();

    let summary = scheduler.run();
    assert_eq!(summary.events_failed, 0);

    // All four legs opened on the entry tick.
    let entry_snapshot = summary
        .snapshots
        .iter()
        .find(|s| s.ts == entry.ts)
        .expect("entry tick snapshot");
    assert_eq!(entry_snapshot.open_positions, 4);

    // Every leg finished out of the money: settled at zero and removed.
    let final_snapshot = summary.final_snapshot().unwrap();
    assert_eq!(final_snapshot.open_positions, 0);
    assert!((final_snapshot.equity - final_snapshot.cash).abs() < 1e-9);
    assert_eq!(scheduler.portfolio().open_positions(), 0);
}

#[test]
fn limit_order_parks_then_fills_from_the_queue() {
    let mut config = quiet_config();
    // Force the queue model so a resting limit at the mid always fills.
    config.exec.queue.base_fill_prob = 1.0;

    let expiry = Utc.with_ymd_and_hms(2025, 4, 18, 21, 0, 0).unwrap();
    let contract = OptionContract::new("SPY", 450.0, expiry, OptionType::Call);

    let entry = session_bar(0, 450.0, 2_000_000.0);
    let days = contract.days_to_expiry(entry.ts);
    let vol = VolSurface::new(config.surface.clone()).adjust(
        entry.implied_vol,
        entry.last,
        contract.strike,
        days,
        contract.option_type,
    );
    let mid = sigmasim_pricing::price(&PricingInputs {
        spot: entry.last,
        strike: contract.strike,
        time_to_expiry: contract.time_to_expiry(entry.ts),
        volatility: vol,
        risk_free_rate: config.rate_for(days),
        dividend_yield: 0.0,
        option_type: contract.option_type,
    })
    .price;

    // A buy limit pinned at the mid never crosses the ask, so it parks on
    // the entry bar and fills from the queue model on a later bar.
    let (strategy, fills) = RecordingStrategy::new(
        "patient",
        vec![(
            entry.ts,
            vec![OrderRequest::limit(contract, OrderSide::Buy, 1, mid)],
        )],
    );

    let mut scheduler = EventScheduler::new(config, vec![Box::new(strategy)]).unwrap();
    for minute in 0..5 {
        let bar = session_bar(minute, 450.0, 2_000_000.0);
        scheduler.enqueue(bar.ts, EventPayload::MarketData(bar)).unwrap();
    }
    let summary = scheduler.run();
    assert_eq!(summary.events_failed, 0);

    let fills = fills.borrow();
    assert_eq!(fills.len(), 1);
    // Queue fills execute at the limit, never through it.
    assert!((fills[0].price - mid).abs() < 1e-9);
    assert_eq!(scheduler.portfolio().open_positions(), 1);
}
