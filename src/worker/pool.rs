use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::Instrument;

use crate::scheduler::Job;
use crate::worker::executor::{ExecutionResult, JobExecutor};

/// Fixed-size set of workers draining a shared job list.
///
/// Each worker claims the next unclaimed index from an atomic counter, so
/// every job runs exactly once no matter how the workers interleave. The pool
/// must be consumed with [`WorkerPool::join`]; dropping it aborts the workers,
/// and their child processes are killed with them.
pub struct WorkerPool {
    workers: JoinSet<Vec<(usize, ExecutionResult)>>,
    size: usize,
    jobs: usize,
}

impl WorkerPool {
    /// Start `min(size, jobs.len())` workers over `jobs`.
    pub fn spawn(size: NonZeroUsize, jobs: Arc<[Job]>, executor: JobExecutor) -> Self {
        let total = jobs.len();
        let size = size.get().min(jobs.len());
        let next = Arc::new(AtomicUsize::new(0));
        let mut workers = JoinSet::new();

        for worker_id in 0..size {
            let jobs = Arc::clone(&jobs);
            let next = Arc::clone(&next);
            let executor = executor.clone();

            let worker = async move {
                let mut done = Vec::new();
                loop {
                    let index = next.fetch_add(1, Ordering::Relaxed);
                    let Some(job) = jobs.get(index) else {
                        break;
                    };
                    done.push((index, executor.execute(job).await));
                }
                tracing::debug!(executed = done.len(), "Worker drained");
                done
            };
            workers.spawn(worker.instrument(tracing::info_span!("worker", id = worker_id)));
        }

        tracing::debug!(workers = size, "Worker pool started");
        Self {
            workers,
            size,
            jobs: total,
        }
    }

    /// Number of workers actually started.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Wait for every worker to finish. Results come back in job-list order.
    ///
    /// A worker that panicked or was aborted takes the results of the jobs it
    /// had claimed with it; the shortfall is logged.
    pub async fn join(mut self) -> Vec<ExecutionResult> {
        let mut results = Vec::new();
        while let Some(joined) = self.workers.join_next().await {
            match joined {
                Ok(done) => results.extend(done),
                Err(e) => tracing::error!(error = %e, "Worker task failed"),
            }
        }

        if results.len() != self.jobs {
            tracing::warn!(
                expected = self.jobs,
                received = results.len(),
                "Worker pool returned fewer results than jobs"
            );
        }

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, result)| result).collect()
    }
}
