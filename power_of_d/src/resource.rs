use std::collections::{HashSet, VecDeque};

use des::DesError;
use serde::Serialize;

use crate::JobId;

/// Outcome of asking a queue for a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    Granted,
    /// Parked at the tail of the wait list; `position` counts from 0 at the head.
    Queued { position: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceStats {
    pub resource_id: usize,
    pub capacity: usize,
    pub current_in_service: usize,
    pub current_queue_length: usize,
    pub total_arrivals: usize,
    pub total_acquired: usize,
    pub total_released: usize,
    /// Time spent by admitted jobs between their request and admission.
    pub total_wait_time: f64,
    pub max_length: usize,
}

impl ResourceStats {
    fn new(resource_id: usize, capacity: usize) -> Self {
        ResourceStats {
            resource_id,
            capacity,
            current_in_service: 0,
            current_queue_length: 0,
            total_arrivals: 0,
            total_acquired: 0,
            total_released: 0,
            total_wait_time: 0.0,
            max_length: 0,
        }
    }

    pub fn length(&self) -> usize {
        self.current_in_service + self.current_queue_length
    }

    pub fn is_at_capacity(&self) -> bool {
        self.current_in_service >= self.capacity
    }

    pub fn has_queue(&self) -> bool {
        self.current_queue_length > 0
    }

    /// Fraction of servers currently busy.
    pub fn utilization(&self) -> f64 {
        self.current_in_service as f64 / self.capacity as f64
    }

    /// Average wait of the jobs admitted so far.
    pub fn mean_wait_time(&self) -> f64 {
        if self.total_acquired == 0 {
            0.0
        } else {
            self.total_wait_time / self.total_acquired as f64
        }
    }
}

/// One service queue: `capacity` servers in front of a FIFO wait list.
#[derive(Debug, Clone)]
pub struct ResourceQueue {
    resource_id: usize,
    capacity: usize,
    wait_list: VecDeque<(JobId, f64)>,
    active: HashSet<JobId>,
    stats: ResourceStats,
}

impl ResourceQueue {
    pub fn new(resource_id: usize, capacity: usize) -> ResourceQueue {
        ResourceQueue {
            resource_id,
            capacity,
            wait_list: VecDeque::new(),
            active: HashSet::with_capacity(capacity),
            stats: ResourceStats::new(resource_id, capacity),
        }
    }

    pub fn id(&self) -> usize {
        self.resource_id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Jobs waiting plus jobs in service.
    pub fn length(&self) -> usize {
        self.wait_list.len() + self.active.len()
    }

    pub fn waiting(&self) -> usize {
        self.wait_list.len()
    }

    pub fn in_service(&self) -> usize {
        self.active.len()
    }

    pub fn holds(&self, job_id: JobId) -> bool {
        self.active.contains(&job_id)
    }

    pub fn stats(&self) -> &ResourceStats {
        &self.stats
    }

    /// Request a server for `job_id`.
    ///
    /// A queued job is only ever admitted by a later [`release`](Self::release).
    pub fn acquire(&mut self, job_id: JobId, current_t: f64) -> Acquire {
        self.stats.total_arrivals += 1;
        let outcome = if self.active.len() < self.capacity {
            self.active.insert(job_id);
            self.stats.total_acquired += 1;
            Acquire::Granted
        } else {
            self.wait_list.push_back((job_id, current_t));
            Acquire::Queued {
                position: self.wait_list.len() - 1,
            }
        };
        self.refresh_stats();
        outcome
    }

    /// Free the server held by `job_id` and admit the head of the wait list.
    ///
    /// Returns the admitted job, which the caller must resume at `current_t`.
    pub fn release(&mut self, job_id: JobId, current_t: f64) -> Result<Option<JobId>, DesError> {
        if !self.active.remove(&job_id) {
            return Err(DesError::InvariantViolation(format!(
                "job {} released queue {} without holding it",
                job_id, self.resource_id
            )));
        }
        self.stats.total_released += 1;

        let admitted = match self.wait_list.pop_front() {
            Some((next_id, requested_t)) => {
                self.active.insert(next_id);
                self.stats.total_acquired += 1;
                self.stats.total_wait_time += current_t - requested_t;
                Some(next_id)
            }
            None => None,
        };

        if self.active.len() > self.capacity {
            return Err(DesError::InvariantViolation(format!(
                "queue {} has {} holders for capacity {}",
                self.resource_id,
                self.active.len(),
                self.capacity
            )));
        }
        self.refresh_stats();
        Ok(admitted)
    }

    fn refresh_stats(&mut self) {
        self.stats.current_in_service = self.active.len();
        self.stats.current_queue_length = self.wait_list.len();
        self.stats.max_length = self.stats.max_length.max(self.length());
    }
}
