//! In-process execution scheduler.
//!
//! `schedule` spawns the job onto the tokio runtime and returns at once.
//! Nothing is queued outside this process: if the process stops before a
//! job finishes, the job stays in its last persisted state (`Pending` or
//! `Running`) and is not picked up again on restart.

use metrics::gauge;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::services::engine::{Execution, JobEngine};

#[derive(Clone)]
pub struct Scheduler {
    engine: Arc<JobEngine>,
    /// `None` means unbounded concurrency.
    permits: Option<Arc<Semaphore>>,
    max_concurrency: Option<usize>,
    in_flight: Arc<AtomicUsize>,
}

impl Scheduler {
    pub fn new(engine: Arc<JobEngine>, max_concurrency: Option<usize>) -> Self {
        let max_concurrency = max_concurrency.map(|n| n.max(1));
        Self {
            engine,
            permits: max_concurrency.map(|n| Arc::new(Semaphore::new(n))),
            max_concurrency,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn max_concurrency(&self) -> Option<usize> {
        self.max_concurrency
    }

    /// Jobs scheduled by this instance that have not finished, including
    /// those still waiting for a permit.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Run `engine.execute(job_id)` in the background.
    ///
    /// The returned handle resolves once the job task has ended, however it
    /// ended. Callers on the request path drop it; job outcomes are read
    /// from the store, never from here.
    pub fn schedule(&self, job_id: Uuid) -> JoinHandle<()> {
        let engine = self.engine.clone();
        let permits = self.permits.clone();
        let in_flight = self.in_flight.clone();

        let count = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        gauge!("jobs_in_flight").set(count as f64);

        let task = tokio::spawn(async move {
            let _permit = match permits {
                Some(semaphore) => match semaphore.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(e) => {
                        error!(job_id = %job_id, error = %e, "Concurrency limiter closed, job not executed");
                        return;
                    }
                },
                None => None,
            };

            match engine.execute(job_id).await {
                Ok(Execution::Completed(state)) => {
                    debug!(job_id = %job_id, state = %state, "Job task finished");
                }
                Ok(Execution::Skipped(state)) => {
                    debug!(job_id = %job_id, state = %state, "Job task skipped");
                }
                Err(e) => {
                    error!(job_id = %job_id, error = %e, "Job execution aborted, job left in last persisted state");
                }
            }
        });

        tokio::spawn(async move {
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!(job_id = %job_id, "Job task panicked, job left in last persisted state");
                } else {
                    warn!(job_id = %job_id, error = %e, "Job task cancelled");
                }
            }
            let remaining = in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
            gauge!("jobs_in_flight").set(remaining as f64);
        })
    }
}
