//! Minimal discrete-event kernel.
//!
//! Agents react to events delivered by an [`EventLoop`] and answer with a
//! [`Response`] listing further events to schedule. The loop owns the clock
//! (through an [`EventQueue`]) and is the only place simulated time advances.

use tracing::{debug, trace};

mod error;
pub mod parallel;
pub mod queue;

pub use error::DesError;
pub use queue::{EventQueue, Scheduled};

/// Events an agent wants scheduled, as `(delay, data)` pairs relative to the
/// time of the event being handled.
pub struct Response<T> {
    pub events: Vec<(f64, T)>,
}

impl<T> Default for Response<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Response<T> {
    pub fn new() -> Response<T> {
        Response { events: Vec::new() }
    }

    pub fn event(delay: f64, data: T) -> Response<T> {
        Response {
            events: vec![(delay, data)],
        }
    }

    pub fn events(events: Vec<(f64, T)>) -> Response<T> {
        Response { events }
    }

    pub fn push(&mut self, delay: f64, data: T) {
        self.events.push((delay, data));
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

pub trait Agent<T, S> {
    /// React to an event fired at `current_t`.
    ///
    /// Returning an error aborts the run: agents use it to report broken
    /// invariants rather than carry on with corrupted state.
    fn act(&mut self, _current_t: f64, _data: &T) -> Result<Response<T>, DesError> {
        Ok(Response::new())
    }

    fn stats(&self) -> S;
}

pub struct EventLoop<T, S> {
    queue: EventQueue<T>,
    agents: Vec<Box<dyn Agent<T, S>>>,
    history: Option<Vec<(f64, u64)>>,
}

impl<T, S> EventLoop<T, S> {
    /// Build a loop with initial events, given as delays from time zero.
    pub fn new(
        events: Vec<(f64, T)>,
        agents: Vec<Box<dyn Agent<T, S>>>,
    ) -> Result<EventLoop<T, S>, DesError> {
        let mut queue = EventQueue::new();
        for (delay, data) in events {
            queue.schedule(delay, data)?;
        }
        Ok(EventLoop {
            queue,
            agents,
            history: None,
        })
    }

    /// Keep a log of every executed event's `(time, seq)`.
    pub fn record_history(&mut self) {
        self.history.get_or_insert_with(Vec::new);
    }

    pub fn history(&self) -> Option<&[(f64, u64)]> {
        self.history.as_deref()
    }

    pub fn current_t(&self) -> f64 {
        self.queue.now()
    }

    /// Number of events still waiting, including any left beyond the horizon.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    fn broadcast(&mut self, event: Scheduled<T>) -> Result<(), DesError> {
        let current_t = event.time;
        trace!(t = current_t, seq = event.seq, "dispatching event");
        if let Some(history) = self.history.as_mut() {
            history.push((current_t, event.seq));
        }
        for agent in &mut self.agents {
            let response = agent.act(current_t, &event.data)?;
            for (delay, data) in response.events {
                self.queue.schedule(delay, data)?;
            }
        }
        Ok(())
    }

    /// Run until the queue is exhausted or the next event is due after `until`.
    ///
    /// Events due exactly at `until` still fire; later ones stay pending and
    /// are never executed by this call.
    pub fn run(&mut self, until: f64) -> Result<(), DesError> {
        if until.is_nan() || until < 0.0 {
            return Err(DesError::InvalidHorizon { until });
        }
        while let Some(next_t) = self.queue.peek_time() {
            if next_t > until {
                debug!(next_t, until, pending = self.queue.len(), "horizon reached");
                break;
            }
            if let Some(event) = self.queue.pop_next() {
                self.broadcast(event)?;
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> Vec<S> {
        self.agents.iter().map(|agent| agent.stats()).collect()
    }
}
