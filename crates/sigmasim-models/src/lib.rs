//! # Sigmasim Data Model
//!
//! Shared types for the options backtest simulation core.
//!
//! ## Description
//! Leaf crate of the workspace: every other crate depends on these types and
//! none of them carries behavior beyond construction, accessors, and simple
//! derived quantities. The layering is models → pricing/exec → engine.
//!
//! ### Core Types
//! - **MarketSnapshot**: immutable per-bar observation of one underlying.
//! - **OptionContract**: immutable contract definition (strike/expiry/right).
//! - **Order / Fill**: trade intent and its realized execution.
//! - **EventPayload**: tagged event variants dispatched by the scheduler.

pub mod contract;
pub mod event;
pub mod greeks;
pub mod market;
pub mod order;

pub use contract::{monthly_expiry, next_weekly_expiry, OptionContract, OptionType};
pub use event::{EventKind, EventPayload, PriorityTable};
pub use greeks::OptionGreeks;
pub use market::{InstrumentClass, MarketSnapshot, TradingPhase};
pub use order::{Fill, Order, OrderSide, OrderStatus, OrderType, PositionKey, RejectReason};
