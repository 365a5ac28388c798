//! # Bounded Event Queue
//!
//! Deterministic time-ordered queue behind the scheduler.
//!
//! ## Ordering
//! Primary key: timestamp ascending. Tie-break: the configured priority
//! table (lower value first). Events with identical (timestamp, priority)
//! dispatch in enqueue order, so the queue is stable and replay is exactly
//! reproducible.

use crate::error::EngineError;
use chrono::{DateTime, Utc};
use sigmasim_models::{EventPayload, PriorityTable};
use std::collections::BTreeMap;

/// Opaque handle returned by enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(pub u64);

/// Composite ordering key; the sequence component makes ordering total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct QueueKey {
    ts: DateTime<Utc>,
    priority: u8,
    seq: u64,
}

/// Bounded, stable priority queue of simulation events.
pub struct EventQueue {
    events: BTreeMap<QueueKey, EventPayload>,
    priority: PriorityTable,
    capacity: usize,
    next_seq: u64,
}

impl EventQueue {
    pub fn new(capacity: usize, priority: PriorityTable) -> Self {
        Self {
            events: BTreeMap::new(),
            priority,
            capacity,
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Enqueues an event at a timestamp.
    ///
    /// # Errors
    /// [`EngineError::QueueFull`] when capacity is exceeded; the event is
    /// dropped and existing entries are untouched.
    pub fn enqueue(
        &mut self,
        ts: DateTime<Utc>,
        payload: EventPayload,
    ) -> Result<EventId, EngineError> {
        if self.events.len() >= self.capacity {
            return Err(EngineError::QueueFull {
                capacity: self.capacity,
            });
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        let key = QueueKey {
            ts,
            priority: self.priority.priority(payload.kind()),
            seq,
        };
        self.events.insert(key, payload);
        Ok(EventId(seq))
    }

    /// Removes and returns the next event in dispatch order.
    pub fn pop(&mut self) -> Option<(DateTime<Utc>, EventPayload)> {
        let key = *self.events.keys().next()?;
        let payload = self.events.remove(&key)?;
        Some((key.ts, payload))
    }

    /// Timestamp of the next event without consuming it.
    pub fn peek_ts(&self) -> Option<DateTime<Utc>> {
        self.events.keys().next().map(|k| k.ts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sigmasim_models::event::{RiskNote, SignalNote, TimeTriggerNote};

    fn ts(sec: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 3, 16, 0, sec).unwrap()
    }

    fn signal(note: &str) -> EventPayload {
        EventPayload::StrategySignal(SignalNote {
            symbol: "SPY".to_string(),
            strategy: "test".to_string(),
            note: note.to_string(),
        })
    }

    #[test]
    fn earlier_timestamp_dispatches_first_regardless_of_enqueue_order() {
        let mut queue = EventQueue::new(16, PriorityTable::default());
        queue.enqueue(ts(5), signal("late")).unwrap();
        queue.enqueue(ts(1), signal("early")).unwrap();

        let (first_ts, _) = queue.pop().unwrap();
        assert_eq!(first_ts, ts(1));
        let (second_ts, _) = queue.pop().unwrap();
        assert_eq!(second_ts, ts(5));
    }

    #[test]
    fn priority_table_breaks_timestamp_ties() {
        let mut queue = EventQueue::new(16, PriorityTable::default());
        // Enqueue in reverse priority order at the same timestamp.
        queue
            .enqueue(
                ts(1),
                EventPayload::TimeTrigger(TimeTriggerNote {
                    label: "trigger".to_string(),
                }),
            )
            .unwrap();
        queue
            .enqueue(
                ts(1),
                EventPayload::Risk(RiskNote {
                    strategy: "test".to_string(),
                    detail: "limit".to_string(),
                }),
            )
            .unwrap();
        queue.enqueue(ts(1), signal("sig")).unwrap();

        assert!(matches!(
            queue.pop().unwrap().1,
            EventPayload::StrategySignal(_)
        ));
        assert!(matches!(queue.pop().unwrap().1, EventPayload::Risk(_)));
        assert!(matches!(
            queue.pop().unwrap().1,
            EventPayload::TimeTrigger(_)
        ));
    }

    #[test]
    fn equal_key_events_are_stable() {
        let mut queue = EventQueue::new(16, PriorityTable::default());
        for i in 0..5 {
            queue.enqueue(ts(1), signal(&format!("s{}", i))).unwrap();
        }
        for i in 0..5 {
            match queue.pop().unwrap().1 {
                EventPayload::StrategySignal(note) => {
                    assert_eq!(note.note, format!("s{}", i));
                }
                other => panic!("unexpected payload {:?}", other),
            }
        }
    }

    #[test]
    fn capacity_one_rejects_second_enqueue_and_keeps_first() {
        let mut queue = EventQueue::new(1, PriorityTable::default());
        queue.enqueue(ts(1), signal("kept")).unwrap();

        let err = queue.enqueue(ts(2), signal("dropped")).unwrap_err();
        assert!(matches!(err, EngineError::QueueFull { capacity: 1 }));

        assert_eq!(queue.len(), 1);
        match queue.pop().unwrap().1 {
            EventPayload::StrategySignal(note) => assert_eq!(note.note, "kept"),
            other => panic!("unexpected payload {:?}", other),
        }
    }
}
