use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Simulated time. Advances only through [`SimClock::advance`], so everything
/// scheduled against it is deterministic under a fixed tick rate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimClock {
    tick: u64,
    elapsed_seconds: f64,
}

impl SimClock {
    pub fn advance(&mut self, fixed_dt_seconds: f32) {
        self.tick = self.tick.saturating_add(1);
        if fixed_dt_seconds.is_finite() && fixed_dt_seconds > 0.0 {
            self.elapsed_seconds += f64::from(fixed_dt_seconds);
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }
}

#[derive(Debug)]
struct ScheduledEntry<T> {
    due_seconds: f64,
    seq: u64,
    payload: T,
}

impl<T> PartialEq for ScheduledEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for ScheduledEntry<T> {}

impl<T> PartialOrd for ScheduledEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for ScheduledEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due_seconds
            .total_cmp(&other.due_seconds)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Min-heap of payloads keyed by simulated due time. Entries due at the same
/// instant come back in scheduling order.
#[derive(Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Reverse<ScheduledEntry<T>>>,
    next_seq: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<T> TimerQueue<T> {
    pub fn schedule_at(&mut self, due_seconds: f64, payload: T) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        self.heap.push(Reverse(ScheduledEntry {
            due_seconds,
            seq,
            payload,
        }));
    }

    pub fn schedule_after(&mut self, clock: &SimClock, delay_seconds: f64, payload: T) {
        let delay = if delay_seconds.is_finite() {
            delay_seconds.max(0.0)
        } else {
            0.0
        };
        self.schedule_at(clock.elapsed_seconds() + delay, payload);
    }

    pub fn drain_due(&mut self, now_seconds: f64) -> Vec<T> {
        let mut due = Vec::new();
        while let Some(Reverse(entry)) = self.heap.peek() {
            if entry.due_seconds > now_seconds {
                break;
            }
            if let Some(Reverse(entry)) = self.heap.pop() {
                due.push(entry.payload);
            }
        }
        due
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_counts_ticks_and_seconds() {
        let mut clock = SimClock::default();
        for _ in 0..30 {
            clock.advance(1.0 / 60.0);
        }
        assert_eq!(clock.tick(), 30);
        assert!((clock.elapsed_seconds() - 0.5).abs() < 0.0001);
    }

    #[test]
    fn clock_ignores_non_finite_dt_but_still_ticks() {
        let mut clock = SimClock::default();
        clock.advance(f32::NAN);
        clock.advance(-1.0);
        assert_eq!(clock.tick(), 2);
        assert_eq!(clock.elapsed_seconds(), 0.0);
    }

    #[test]
    fn drain_due_returns_only_elapsed_entries_in_order() {
        let mut queue = TimerQueue::default();
        queue.schedule_at(2.0, "late");
        queue.schedule_at(0.5, "early");
        queue.schedule_at(1.0, "middle");

        assert_eq!(queue.drain_due(1.0), vec!["early", "middle"]);
        assert_eq!(queue.len(), 1);
        assert!(queue.drain_due(1.5).is_empty());
        assert_eq!(queue.drain_due(2.0), vec!["late"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn same_due_time_is_fifo() {
        let mut queue = TimerQueue::default();
        queue.schedule_at(1.0, 1);
        queue.schedule_at(1.0, 2);
        queue.schedule_at(1.0, 3);
        assert_eq!(queue.drain_due(1.0), vec![1, 2, 3]);
    }

    #[test]
    fn schedule_after_is_relative_to_clock() {
        let mut clock = SimClock::default();
        clock.advance(1.0);
        let mut queue = TimerQueue::default();
        queue.schedule_after(&clock, 0.5, ());
        assert!(queue.drain_due(1.4).is_empty());
        assert_eq!(queue.drain_due(1.5).len(), 1);
    }
}
