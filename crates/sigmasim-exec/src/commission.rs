//! # Commission and Fee Schedule
//!
//! Per-contract commissions and exchange/regulatory fees by instrument class.

use serde::{Deserialize, Serialize};
use sigmasim_models::InstrumentClass;

/// Commission schedule for one instrument class.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassSchedule {
    /// Fixed component per order.
    pub per_order: f64,
    /// Per-contract commission.
    pub per_contract: f64,
    /// Per-contract exchange + regulatory fees.
    pub fees_per_contract: f64,
    /// Cap on the commission component of one order (0 disables the cap).
    pub max_per_order: f64,
}

/// Full schedule keyed by instrument class.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommissionSchedule {
    pub equity_option: ClassSchedule,
    pub index_option: ClassSchedule,
    pub equity: ClassSchedule,
    pub future: ClassSchedule,
}

impl Default for CommissionSchedule {
    fn default() -> Self {
        Self {
            equity_option: ClassSchedule {
                per_order: 0.0,
                per_contract: 0.65,
                fees_per_contract: 0.055,
                max_per_order: 0.0,
            },
            index_option: ClassSchedule {
                per_order: 0.0,
                per_contract: 0.85,
                fees_per_contract: 0.075,
                max_per_order: 0.0,
            },
            equity: ClassSchedule {
                per_order: 0.0,
                per_contract: 0.005,
                fees_per_contract: 0.0001,
                max_per_order: 0.0,
            },
            future: ClassSchedule {
                per_order: 0.0,
                per_contract: 2.25,
                fees_per_contract: 0.35,
                max_per_order: 0.0,
            },
        }
    }
}

impl CommissionSchedule {
    fn for_class(&self, class: InstrumentClass) -> &ClassSchedule {
        match class {
            InstrumentClass::EquityOption => &self.equity_option,
            InstrumentClass::IndexOption => &self.index_option,
            InstrumentClass::Equity => &self.equity,
            InstrumentClass::Future => &self.future,
        }
    }

    /// (commission, fees) for a fill of `quantity` contracts.
    pub fn calculate(&self, class: InstrumentClass, quantity: u32) -> (f64, f64) {
        let schedule = self.for_class(class);
        let mut commission = schedule.per_order + schedule.per_contract * quantity as f64;
        if schedule.max_per_order > 0.0 {
            commission = commission.min(schedule.max_per_order);
        }
        let fees = schedule.fees_per_contract * quantity as f64;
        (commission, fees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_contract_scaling() {
        let schedule = CommissionSchedule::default();
        let (c1, f1) = schedule.calculate(InstrumentClass::EquityOption, 1);
        let (c10, f10) = schedule.calculate(InstrumentClass::EquityOption, 10);
        assert!((c1 - 0.65).abs() < 1e-12);
        assert!((c10 - 6.50).abs() < 1e-12);
        assert!((f10 - f1 * 10.0).abs() < 1e-12);
    }

    #[test]
    fn order_cap_applies() {
        let mut schedule = CommissionSchedule::default();
        schedule.equity_option.max_per_order = 5.0;
        let (c, _) = schedule.calculate(InstrumentClass::EquityOption, 100);
        assert_eq!(c, 5.0);
    }

    #[test]
    fn classes_are_distinct() {
        let schedule = CommissionSchedule::default();
        let (opt, _) = schedule.calculate(InstrumentClass::EquityOption, 1);
        let (fut, _) = schedule.calculate(InstrumentClass::Future, 1);
        assert!(fut > opt);
    }
}
