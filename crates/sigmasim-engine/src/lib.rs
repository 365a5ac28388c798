//! # Simulation Engine
//!
//! Deterministic event-driven backtest core for options strategies.
//!
//! ## Description
//! Wires the pricing engine and the execution simulator behind one event
//! loop. Callers enqueue market-data bars (and any scheduled triggers),
//! register strategies, and drain the queue; the scheduler owns the order
//! lifecycle, the risk checks, and the portfolio ledger. Everything
//! randomized draws from PRNGs seeded by one configured seed, so a run is a
//! pure function of its inputs.
//!
//! ### Module Structure
//! - [`config`] - TOML-deserializable configuration with startup validation
//! - [`queue`] - bounded, stable time/priority event queue
//! - [`scheduler`] - the event loop and per-bar pipeline
//! - [`portfolio`] - cash/position ledger keyed by (symbol, strategy)
//! - [`risk`] - pre-trade limit checks
//! - [`strategy`] - the strategy seam and a scripted test strategy
//!
//! ## Example
//! ```no_run
//! use sigmasim_engine::config::SimConfig;
//! use sigmasim_engine::scheduler::EventScheduler;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = SimConfig::from_toml(&std::fs::read_to_string("sim.toml")?)?;
//! let mut scheduler = EventScheduler::new(config, Vec::new())?;
//! // ... enqueue market data ...
//! let summary = scheduler.run();
//! println!("final equity: {:?}", summary.final_snapshot());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod portfolio;
pub mod queue;
pub mod risk;
pub mod scheduler;
pub mod strategy;

pub use config::{RateTenor, SimConfig};
pub use error::EngineError;
pub use portfolio::{PortfolioSnapshot, PortfolioState, Position, PositionSummary};
pub use queue::{EventId, EventQueue};
pub use risk::{RiskConfig, RiskEngine, RiskViolation};
pub use scheduler::{EventScheduler, RunSummary};
pub use strategy::{OrderRequest, ScriptedStrategy, Strategy};
