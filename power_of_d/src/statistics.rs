use serde::Serialize;

use crate::JobId;
use crate::resource::ResourceQueue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotKind {
    /// Taken as a job arrives, before it is routed.
    Decision,
    /// Taken after a job releases its queue.
    Completion,
}

/// Every queue's length (waiting + in service) at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueSnapshot {
    pub time: f64,
    pub job_id: JobId,
    pub kind: SnapshotKind,
    pub lengths: Vec<usize>,
}

impl QueueSnapshot {
    pub fn total(&self) -> usize {
        self.lengths.iter().sum()
    }
}

/// Per-queue aggregates over the snapshot log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotSummary {
    pub samples: usize,
    pub mean_length: Vec<f64>,
    pub max_length: Vec<usize>,
    pub mean_total: f64,
}

/// Append-only log of queue snapshots.
#[derive(Debug, Clone, Default)]
pub struct StatisticsCollector {
    snapshots: Vec<QueueSnapshot>,
}

impl StatisticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        time: f64,
        job_id: JobId,
        kind: SnapshotKind,
        queues: &[ResourceQueue],
    ) {
        self.snapshots.push(QueueSnapshot {
            time,
            job_id,
            kind,
            lengths: queues.iter().map(ResourceQueue::length).collect(),
        });
    }

    pub fn snapshots(&self) -> &[QueueSnapshot] {
        &self.snapshots
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn summary(&self) -> SnapshotSummary {
        summarize(&self.snapshots)
    }
}

pub fn summarize(snapshots: &[QueueSnapshot]) -> SnapshotSummary {
    let width = snapshots.first().map_or(0, |s| s.lengths.len());
    let mut sums = vec![0usize; width];
    let mut max_length = vec![0usize; width];
    for snapshot in snapshots {
        for (i, &len) in snapshot.lengths.iter().enumerate() {
            sums[i] += len;
            max_length[i] = max_length[i].max(len);
        }
    }

    let samples = snapshots.len();
    let mean_length: Vec<f64> = if samples == 0 {
        Vec::new()
    } else {
        sums.iter().map(|&s| s as f64 / samples as f64).collect()
    };
    let mean_total = mean_length.iter().sum();

    SnapshotSummary {
        samples,
        mean_length,
        max_length,
        mean_total,
    }
}
