use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::DesError;

/// An event waiting in the queue, due at `time`.
///
/// `seq` is handed out at scheduling time and breaks ties between events due
/// at the same instant, so equal-time events fire in the order they were
/// scheduled.
#[derive(Debug)]
pub struct Scheduled<T> {
    pub time: f64,
    pub seq: u64,
    pub data: T,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> Ord for Scheduled<T> {
    // Reversed so the BinaryHeap pops the earliest (time, seq) first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Simulation clock plus the pending events, ordered by `(time, seq)`.
pub struct EventQueue<T> {
    heap: BinaryHeap<Scheduled<T>>,
    now: f64,
    next_seq: u64,
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        EventQueue {
            heap: BinaryHeap::new(),
            now: 0.0,
            next_seq: 0,
        }
    }

    /// Current simulation time. Never decreases.
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Schedule `data` to fire `delay` time units from now.
    ///
    /// Returns the sequence number assigned to the event. A negative (or NaN)
    /// delay is rejected with [`DesError::InvalidDelay`].
    pub fn schedule(&mut self, delay: f64, data: T) -> Result<u64, DesError> {
        if delay.is_nan() || delay < 0.0 {
            return Err(DesError::InvalidDelay { delay });
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled {
            time: self.now + delay,
            seq,
            data,
        });
        Ok(seq)
    }

    /// Remove the earliest event and advance the clock to its due time.
    pub fn pop_next(&mut self) -> Option<Scheduled<T>> {
        let event = self.heap.pop()?;
        self.now = event.time;
        Some(event)
    }

    /// Due time of the earliest pending event, without removing it.
    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(|event| event.time)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
