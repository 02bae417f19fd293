use des::{Agent, DesError, Response};
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::debug;

use crate::config::{GenerationMode, Sampler};
use crate::{Event, JobId, Stats};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratorStats {
    pub generated: usize,
    pub mode: GenerationMode,
}

/// Emits job arrivals separated by random gaps, starting at the `Start` event.
pub struct JobGenerator {
    mode: GenerationMode,
    interarrival: Sampler,
    rng: StdRng,
    next_job_id: JobId,
}

impl JobGenerator {
    pub fn new(mode: GenerationMode, interarrival: Sampler, rng: StdRng) -> JobGenerator {
        JobGenerator {
            mode,
            interarrival,
            rng,
            next_job_id: 0,
        }
    }

    pub fn generated(&self) -> usize {
        self.next_job_id
    }

    fn may_emit(&self, generated: usize) -> bool {
        match self.mode {
            GenerationMode::Bounded { count } => generated < count,
            GenerationMode::Unbounded => true,
        }
    }

    fn arrival(&mut self, current_t: f64) -> Response<Event> {
        if !self.may_emit(self.next_job_id) {
            return Response::new();
        }
        let job_id = self.next_job_id;
        self.next_job_id += 1;
        debug!(t = current_t, job_id, "job arrival");

        let mut response = Response::event(0.0, Event::JobArrived { job_id });
        if self.may_emit(self.next_job_id) {
            let gap = self.interarrival.sample(&mut self.rng);
            response.push(gap, Event::ArrivalDue);
        }
        response
    }
}

impl Agent<Event, Stats> for JobGenerator {
    fn act(&mut self, current_t: f64, data: &Event) -> Result<Response<Event>, DesError> {
        match data {
            Event::Start | Event::ArrivalDue => Ok(self.arrival(current_t)),
            _ => Ok(Response::new()),
        }
    }

    fn stats(&self) -> Stats {
        Stats::Generator(GeneratorStats {
            generated: self.next_job_id,
            mode: self.mode,
        })
    }
}
