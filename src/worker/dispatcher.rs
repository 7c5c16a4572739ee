use std::sync::Arc;

use chrono::Local;

use crate::config::DispatchConfig;
use crate::logging::PROGRESS_TARGET;
use crate::scheduler::{Job, JobStatus};
use crate::worker::executor::{format_timestamp, ExecutionResult, JobExecutor};
use crate::worker::pool::WorkerPool;

/// Outcome of a whole batch run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    submitted: usize,
    results: Vec<ExecutionResult>,
}

impl RunSummary {
    pub fn new(submitted: usize, results: Vec<ExecutionResult>) -> Self {
        Self { submitted, results }
    }

    /// Per-job results, in job-list order.
    pub fn results(&self) -> &[ExecutionResult] {
        &self.results
    }

    /// Number of jobs handed to the dispatcher.
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Jobs that produced no result (their worker died).
    pub fn missing(&self) -> usize {
        self.submitted.saturating_sub(self.results.len())
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn count(&self, status: JobStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    pub fn completed(&self) -> usize {
        self.count(JobStatus::Completed)
    }

    pub fn failed(&self) -> usize {
        self.count(JobStatus::Failed)
    }

    pub fn timed_out(&self) -> usize {
        self.count(JobStatus::TimedOut)
    }
}

/// Runs a job list with bounded parallelism.
///
/// With a concurrency of 1 jobs run one after another in list order on the
/// calling task. Above 1 a [`WorkerPool`] is started for the duration of the
/// call and completion order is unspecified. Either way `run` returns only
/// once every job has finished, and a failing job never stops the others.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: DispatchConfig,
    executor: JobExecutor,
}

impl Dispatcher {
    pub fn new(config: DispatchConfig) -> Self {
        let executor = JobExecutor::with_timeout(config.job_timeout);
        Self { config, executor }
    }

    pub async fn run(&self, jobs: Vec<Job>) -> RunSummary {
        let submitted = jobs.len();
        let concurrency = self.config.concurrency;
        tracing::info!(
            jobs = jobs.len(),
            concurrency = concurrency.get(),
            timeout = ?self.config.job_timeout,
            "Dispatching jobs"
        );

        let results = if concurrency.get() == 1 {
            let mut results = Vec::with_capacity(jobs.len());
            for job in &jobs {
                results.push(self.executor.execute(job).await);
            }
            results
        } else {
            let jobs: Arc<[Job]> = jobs.into();
            WorkerPool::spawn(concurrency, jobs, self.executor.clone())
                .join()
                .await
        };

        let summary = RunSummary::new(submitted, results);
        if summary.missing() > 0 {
            tracing::warn!(
                submitted,
                missing = summary.missing(),
                "Some jobs produced no result"
            );
        }
        tracing::info!(
            total = summary.total(),
            completed = summary.completed(),
            failed = summary.failed(),
            timed_out = summary.timed_out(),
            "Batch finished"
        );
        tracing::info!(
            target: PROGRESS_TARGET,
            "[{}, Progress] Done",
            format_timestamp(&Local::now())
        );
        summary
    }
}
