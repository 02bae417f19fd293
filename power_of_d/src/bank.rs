use std::collections::HashMap;

use des::{Agent, DesError, Response};
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info, trace};

use crate::config::Sampler;
use crate::job::{Job, JobState};
use crate::resource::{Acquire, ResourceQueue, ResourceStats};
use crate::routing::RoutingPolicy;
use crate::statistics::{QueueSnapshot, SnapshotKind, StatisticsCollector};
use crate::{Event, JobId, Stats};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankStats {
    pub snapshots: Vec<QueueSnapshot>,
    pub resources: Vec<ResourceStats>,
    pub arrived: usize,
    pub completed: usize,
    pub in_system: usize,
    pub total_wait_time: f64,
    pub max_wait_time: f64,
    pub total_service_time: f64,
    /// Time of the last event the bank saw, i.e. where the run stopped.
    pub last_event_time: f64,
}

/// The parallel queues plus every job currently in the system.
///
/// Jobs are driven through their lifecycle here: routed on arrival, parked
/// while their queue is busy, resumed when the queue admits them, and retired
/// when service ends. All queue and snapshot mutations happen inside `act`.
pub struct Bank {
    queues: Vec<ResourceQueue>,
    routing: RoutingPolicy,
    service: Sampler,
    rng: StdRng,
    jobs: HashMap<JobId, Job>,
    collector: StatisticsCollector,
    verbose: bool,
    arrived: usize,
    completed: usize,
    in_system: usize,
    total_wait_time: f64,
    max_wait_time: f64,
    total_service_time: f64,
    last_event_time: f64,
}

impl Bank {
    pub fn new(
        queues: Vec<ResourceQueue>,
        routing: RoutingPolicy,
        service: Sampler,
        rng: StdRng,
        verbose: bool,
    ) -> Bank {
        Bank {
            queues,
            routing,
            service,
            rng,
            jobs: HashMap::new(),
            collector: StatisticsCollector::new(),
            verbose,
            arrived: 0,
            completed: 0,
            in_system: 0,
            total_wait_time: 0.0,
            max_wait_time: 0.0,
            total_service_time: 0.0,
            last_event_time: 0.0,
        }
    }

    pub fn queues(&self) -> &[ResourceQueue] {
        &self.queues
    }

    pub fn collector(&self) -> &StatisticsCollector {
        &self.collector
    }

    pub fn in_system(&self) -> usize {
        self.in_system
    }

    pub fn job_state(&self, job_id: JobId) -> Option<JobState> {
        self.jobs.get(&job_id).map(Job::state)
    }

    fn trace_line(&self, line: std::fmt::Arguments<'_>) {
        if self.verbose {
            info!("{}", line);
        } else {
            trace!("{}", line);
        }
    }

    fn check_accounting(&self) -> Result<(), DesError> {
        let total: usize = self.queues.iter().map(ResourceQueue::length).sum();
        if total != self.in_system {
            return Err(DesError::InvariantViolation(format!(
                "{} jobs in system but queues hold {}",
                self.in_system, total
            )));
        }
        Ok(())
    }

    fn job_mut(&mut self, job_id: JobId) -> Result<&mut Job, DesError> {
        self.jobs
            .get_mut(&job_id)
            .ok_or_else(|| DesError::InvariantViolation(format!("unknown job {job_id}")))
    }

    fn arrive(&mut self, current_t: f64, job_id: JobId) -> Result<Response<Event>, DesError> {
        if self.jobs.contains_key(&job_id) {
            return Err(DesError::InvariantViolation(format!("job {job_id} arrived twice")));
        }
        let mut job = Job::new(job_id, current_t);
        self.trace_line(format_args!("{:7.4} {}: Arrival", current_t, job.name()));

        self.collector
            .record(current_t, job_id, SnapshotKind::Decision, &self.queues);
        let queue_id = self.routing.select(&mut self.rng, &self.queues)?;
        job.route(queue_id)?;
        debug!(t = current_t, job_id, queue_id, "routed");

        self.arrived += 1;
        self.in_system += 1;
        let outcome = self.queues[queue_id].acquire(job_id, current_t);
        let response = match outcome {
            Acquire::Granted => self.start_service(current_t, &mut job, queue_id)?,
            Acquire::Queued { position } => {
                debug!(t = current_t, job_id, queue_id, position, "waiting");
                job.wait()?;
                Response::new()
            }
        };
        self.jobs.insert(job_id, job);
        self.check_accounting()?;
        Ok(response)
    }

    fn start_service(
        &mut self,
        current_t: f64,
        job: &mut Job,
        queue_id: usize,
    ) -> Result<Response<Event>, DesError> {
        let wait = job.start_service(current_t)?;
        self.total_wait_time += wait;
        self.max_wait_time = self.max_wait_time.max(wait);
        self.trace_line(format_args!(
            "{:7.4} {}: Waited {:6.3}",
            current_t,
            job.name(),
            wait
        ));

        let service_time = self.service.sample(&mut self.rng);
        self.total_service_time += service_time;
        Ok(Response::event(
            service_time,
            Event::ServiceCompleted {
                job_id: job.id,
                queue_id,
            },
        ))
    }

    fn granted(
        &mut self,
        current_t: f64,
        job_id: JobId,
        queue_id: usize,
    ) -> Result<Response<Event>, DesError> {
        if !self.queues[queue_id].holds(job_id) {
            return Err(DesError::InvariantViolation(format!(
                "job {job_id} resumed without holding queue {queue_id}"
            )));
        }
        let mut job = self
            .jobs
            .remove(&job_id)
            .ok_or_else(|| DesError::InvariantViolation(format!("unknown job {job_id}")))?;
        let response = self.start_service(current_t, &mut job, queue_id);
        self.jobs.insert(job_id, job);
        response
    }

    fn complete(
        &mut self,
        current_t: f64,
        job_id: JobId,
        queue_id: usize,
    ) -> Result<Response<Event>, DesError> {
        let mut response = Response::new();
        if let Some(next_id) = self.queues[queue_id].release(job_id, current_t)? {
            debug!(t = current_t, job_id = next_id, queue_id, "admitted from wait list");
            response.push(
                0.0,
                Event::ServiceGranted {
                    job_id: next_id,
                    queue_id,
                },
            );
        }

        let job = self.job_mut(job_id)?;
        job.finish()?;
        let name = job.name();
        self.jobs.remove(&job_id);
        self.in_system -= 1;
        self.completed += 1;

        self.collector
            .record(current_t, job_id, SnapshotKind::Completion, &self.queues);
        self.trace_line(format_args!("{:7.4} {}: Finished", current_t, name));
        self.check_accounting()?;
        Ok(response)
    }

    fn queue_in_range(&self, queue_id: usize) -> Result<(), DesError> {
        if queue_id >= self.queues.len() {
            return Err(DesError::InvariantViolation(format!("no queue {queue_id}")));
        }
        Ok(())
    }
}

impl Agent<Event, Stats> for Bank {
    fn act(&mut self, current_t: f64, data: &Event) -> Result<Response<Event>, DesError> {
        self.last_event_time = current_t;
        match data {
            Event::JobArrived { job_id } => self.arrive(current_t, *job_id),
            Event::ServiceGranted { job_id, queue_id } => {
                self.queue_in_range(*queue_id)?;
                self.granted(current_t, *job_id, *queue_id)
            }
            Event::ServiceCompleted { job_id, queue_id } => {
                self.queue_in_range(*queue_id)?;
                self.complete(current_t, *job_id, *queue_id)
            }
            _ => Ok(Response::new()),
        }
    }

    fn stats(&self) -> Stats {
        Stats::Bank(BankStats {
            snapshots: self.collector.snapshots().to_vec(),
            resources: self.queues.iter().map(|q| q.stats().clone()).collect(),
            arrived: self.arrived,
            completed: self.completed,
            in_system: self.in_system,
            total_wait_time: self.total_wait_time,
            max_wait_time: self.max_wait_time,
            total_service_time: self.total_service_time,
            last_event_time: self.last_event_time,
        })
    }
}
