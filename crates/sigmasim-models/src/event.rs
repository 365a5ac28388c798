//! # Simulation Events
//!
//! Tagged event variants dispatched by the scheduler.
//!
//! ## Description
//! Each event kind carries its own payload type and the compiler verifies all
//! kinds are handled via exhaustive matching. Dispatch order within a
//! timestamp is decided by a configurable priority table; ties beyond that
//! are broken by enqueue sequence, so replay is fully deterministic.

use crate::market::MarketSnapshot;
use crate::order::{Fill, Order};
use serde::{Deserialize, Serialize};

/// Discriminant of an event, used for priority lookup and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    MarketData,
    StrategySignal,
    Order,
    Fill,
    Risk,
    TimeTrigger,
    CorporateAction,
}

impl EventKind {
    /// All kinds, in default priority order.
    pub const ALL: [EventKind; 7] = [
        EventKind::MarketData,
        EventKind::StrategySignal,
        EventKind::Order,
        EventKind::Fill,
        EventKind::Risk,
        EventKind::TimeTrigger,
        EventKind::CorporateAction,
    ];
}

/// A strategy-originated signal that has not yet become an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalNote {
    pub symbol: String,
    pub strategy: String,
    pub note: String,
}

/// A synthetic risk-violation notification emitted by the risk checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskNote {
    pub strategy: String,
    pub detail: String,
}

/// A scheduled time-based trigger (e.g., forced exit time).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeTriggerNote {
    pub label: String,
}

/// A corporate action affecting an underlying (splits, special dividends).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorporateActionNote {
    pub symbol: String,
    pub detail: String,
}

/// Payload per event kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    MarketData(MarketSnapshot),
    StrategySignal(SignalNote),
    Order(Order),
    Fill(Fill),
    Risk(RiskNote),
    TimeTrigger(TimeTriggerNote),
    CorporateAction(CorporateActionNote),
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::MarketData(_) => EventKind::MarketData,
            EventPayload::StrategySignal(_) => EventKind::StrategySignal,
            EventPayload::Order(_) => EventKind::Order,
            EventPayload::Fill(_) => EventKind::Fill,
            EventPayload::Risk(_) => EventKind::Risk,
            EventPayload::TimeTrigger(_) => EventKind::TimeTrigger,
            EventPayload::CorporateAction(_) => EventKind::CorporateAction,
        }
    }

}

/// Maps event kinds to dispatch priorities; lower dispatches first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityTable {
    priorities: Vec<(EventKind, u8)>,
}

impl Default for PriorityTable {
    fn default() -> Self {
        Self {
            priorities: EventKind::ALL
                .iter()
                .enumerate()
                .map(|(i, k)| (*k, i as u8))
                .collect(),
        }
    }
}

impl PriorityTable {
    /// Priority for a kind; unknown kinds sort last.
    pub fn priority(&self, kind: EventKind) -> u8 {
        self.priorities
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, p)| *p)
            .unwrap_or(u8::MAX)
    }

    /// Overrides the priority of one kind.
    pub fn set(&mut self, kind: EventKind, priority: u8) {
        if let Some(entry) = self.priorities.iter_mut().find(|(k, _)| *k == kind) {
            entry.1 = priority;
        } else {
            self.priorities.push((kind, priority));
        }
    }
}
