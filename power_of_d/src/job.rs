use des::DesError;

use crate::JobId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Arrived,
    Waiting,
    InService,
    Done,
}

/// Lifecycle of one job: Arrived -> (Waiting ->) InService -> Done.
///
/// Each transition is triggered by the bank while handling an event; calling
/// one from the wrong state is a bug in the engine and reported as such.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: JobId,
    pub arrival_time: f64,
    pub queue_id: Option<usize>,
    pub service_start: Option<f64>,
    state: JobState,
}

impl Job {
    pub fn new(id: JobId, arrival_time: f64) -> Job {
        Job {
            id,
            arrival_time,
            queue_id: None,
            service_start: None,
            state: JobState::Arrived,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Name used in trace output, e.g. `job07`.
    pub fn name(&self) -> String {
        format!("job{:02}", self.id)
    }

    fn transition(&mut self, from: &[JobState], to: JobState) -> Result<(), DesError> {
        if !from.contains(&self.state) {
            return Err(DesError::InvariantViolation(format!(
                "job {} cannot move from {:?} to {:?}",
                self.id, self.state, to
            )));
        }
        self.state = to;
        Ok(())
    }

    pub fn route(&mut self, queue_id: usize) -> Result<(), DesError> {
        if self.state != JobState::Arrived || self.queue_id.is_some() {
            return Err(DesError::InvariantViolation(format!(
                "job {} routed twice",
                self.id
            )));
        }
        self.queue_id = Some(queue_id);
        Ok(())
    }

    pub fn wait(&mut self) -> Result<(), DesError> {
        self.transition(&[JobState::Arrived], JobState::Waiting)
    }

    /// Enter service at `current_t`; returns how long the job waited.
    pub fn start_service(&mut self, current_t: f64) -> Result<f64, DesError> {
        self.transition(&[JobState::Arrived, JobState::Waiting], JobState::InService)?;
        self.service_start = Some(current_t);
        Ok(current_t - self.arrival_time)
    }

    pub fn finish(&mut self) -> Result<(), DesError> {
        self.transition(&[JobState::InService], JobState::Done)
    }
}
