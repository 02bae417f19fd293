//! Parallel execution of independent EventLoop replications
//!
//! Each replication is built from its index, run to the horizon on a rayon
//! worker, and reduced to the stats of its agents. Results come back in
//! replication order whatever the thread count, so a builder that derives its
//! seed from the index gives reproducible batches.
//!
//! # Example
//!
//! ```rust
//! use des::parallel::ParallelRunner;
//! # use des::{Agent, EventLoop};
//! # struct TestAgent;
//! # impl Agent<u8, usize> for TestAgent {
//! #     fn stats(&self) -> usize { 1 }
//! # }
//!
//! let results = ParallelRunner::new(8, |replication| {
//!     let agents: Vec<Box<dyn Agent<u8, usize>>> = vec![Box::new(TestAgent)];
//!     EventLoop::new(vec![(replication as f64, 1)], agents)
//! })
//! .num_threads(2)
//! .run(100.0);
//!
//! assert_eq!(results.len(), 8);
//! assert!(results.iter().all(|r| r.is_ok()));
//! ```
//!
//! # Error Handling
//!
//! Builder errors, run errors, and panics inside a replication are all
//! returned as `Err(String)` for that replication only.

use crate::{DesError, EventLoop};
use rayon::prelude::*;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Executes multiple EventLoop replications in parallel
///
/// The builder `F` is called once per replication with its index and must be
/// `Send + Sync` since it is shared by the worker threads.
pub struct ParallelRunner<T, S, F>
where
    F: Fn(usize) -> Result<EventLoop<T, S>, DesError> + Send + Sync,
    S: Send,
{
    num_replications: usize,
    builder: F,
    num_threads: Option<usize>,
    progress_callback: Option<ProgressCallback>,
    _marker: PhantomData<fn() -> (T, S)>,
}

impl<T, S, F> ParallelRunner<T, S, F>
where
    F: Fn(usize) -> Result<EventLoop<T, S>, DesError> + Send + Sync,
    S: Send,
{
    pub fn new(num_replications: usize, builder: F) -> Self {
        ParallelRunner {
            num_replications,
            builder,
            num_threads: None,
            progress_callback: None,
            _marker: PhantomData,
        }
    }

    /// Set number of threads (defaults to rayon's global pool)
    pub fn num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    /// Set progress callback, called with `(completed, total)` after each
    /// replication finishes.
    pub fn progress<P>(mut self, callback: P) -> Self
    where
        P: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    fn run_one(&self, replication: usize, run_until: f64) -> Result<Vec<S>, String> {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut event_loop = (self.builder)(replication)?;
            event_loop.run(run_until)?;
            Ok::<_, DesError>(event_loop.stats())
        }));

        match result {
            Ok(Ok(stats)) => Ok(stats),
            Ok(Err(e)) => Err(e.to_string()),
            Err(panic) => Err(if let Some(s) = panic.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            }),
        }
    }

    /// Execute all replications and return results in replication order.
    pub fn run(self, run_until: f64) -> Vec<Result<Vec<S>, String>> {
        let progress_counter = AtomicUsize::new(0);

        let execute = || {
            (0..self.num_replications)
                .into_par_iter()
                .map(|replication| {
                    let result = self.run_one(replication, run_until);

                    let completed = progress_counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback(completed, self.num_replications);
                    }
                    result
                })
                .collect()
        };

        let pool = self.num_threads.map(|n| {
            rayon::ThreadPoolBuilder::new().num_threads(n).build()
        });

        match pool {
            Some(Ok(pool)) => pool.install(execute),
            Some(Err(e)) => {
                info!(error = %e, "could not build thread pool, using global pool");
                execute()
            }
            None => execute(),
        }
    }
}

/// Progress callback that logs every `interval` completed replications.
pub fn simple_progress_reporter(interval: usize) -> impl Fn(usize, usize) + Send + Sync {
    let interval = interval.max(1);
    move |completed, total| {
        if completed % interval == 0 || completed == total {
            info!("completed {}/{} replications", completed, total);
        }
    }
}
