use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::logging::PROGRESS_TARGET;
use crate::scheduler::{Job, JobStatus};

/// Format used for the timestamps of progress lines.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Result of job execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub job: Job,
    pub status: JobStatus,
    pub exit_code: Option<i32>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

enum RunOutcome {
    Exited(ExitStatus),
    SpawnFailed(std::io::Error),
    WaitFailed(std::io::Error),
    TimedOut(Duration),
}

/// Runs a single job's command as a child process.
///
/// The child inherits stdout/stderr so the tool's own output lands in the
/// batch log; stdin is closed. A non-zero exit is reported in the result,
/// never raised.
#[derive(Debug, Clone, Default)]
pub struct JobExecutor {
    timeout: Option<Duration>,
}

impl JobExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    /// Execute a job, logging its command line before and after.
    pub async fn execute(&self, job: &Job) -> ExecutionResult {
        let started_at = Local::now();
        tracing::info!(
            target: PROGRESS_TARGET,
            "[{}, CMD] {}",
            format_timestamp(&started_at),
            job.command()
        );

        let outcome = self.run(job).await;
        let finished_at = Local::now();
        let result = Self::process_outcome(job, outcome, started_at, finished_at);

        tracing::debug!(
            input = %job.input_path().display(),
            status = %result.status,
            exit_code = ?result.exit_code,
            "Job finished"
        );
        tracing::info!(
            target: PROGRESS_TARGET,
            "[{}, Progress] {} is done.",
            format_timestamp(&finished_at),
            job.command()
        );
        result
    }

    async fn run(&self, job: &Job) -> RunOutcome {
        let mut cmd = job.command().to_tokio();
        cmd.stdin(Stdio::null()).kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return RunOutcome::SpawnFailed(e),
        };

        let Some(limit) = self.timeout else {
            return match child.wait().await {
                Ok(status) => RunOutcome::Exited(status),
                Err(e) => RunOutcome::WaitFailed(e),
            };
        };

        match tokio::time::timeout(limit, child.wait()).await {
            Ok(Ok(status)) => RunOutcome::Exited(status),
            Ok(Err(e)) => RunOutcome::WaitFailed(e),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(
                        input = %job.input_path().display(),
                        error = %e,
                        "Failed to kill timed out job"
                    );
                }
                RunOutcome::TimedOut(limit)
            }
        }
    }

    fn process_outcome(
        job: &Job,
        outcome: RunOutcome,
        started_at: DateTime<Local>,
        finished_at: DateTime<Local>,
    ) -> ExecutionResult {
        let input = job.input_path().display();
        let (status, exit_code, error) = match outcome {
            RunOutcome::Exited(exit) if exit.success() => (JobStatus::Completed, exit.code(), None),
            RunOutcome::Exited(exit) => {
                tracing::warn!(input = %input, exit = %exit, "Job exited unsuccessfully");
                (JobStatus::Failed, exit.code(), Some(exit.to_string()))
            }
            RunOutcome::SpawnFailed(e) => {
                tracing::error!(
                    input = %input,
                    program = %job.command().program().display(),
                    error = %e,
                    "Job failed to start"
                );
                (JobStatus::Failed, None, Some(format!("spawn failed: {}", e)))
            }
            RunOutcome::WaitFailed(e) => {
                tracing::error!(input = %input, error = %e, "Failed waiting for job");
                (JobStatus::Failed, None, Some(e.to_string()))
            }
            RunOutcome::TimedOut(limit) => {
                tracing::warn!(input = %input, timeout = ?limit, "Job timed out and was killed");
                (
                    JobStatus::TimedOut,
                    None,
                    Some(format!("timed out after {:?}", limit)),
                )
            }
        };

        ExecutionResult {
            job: job.clone(),
            status,
            exit_code,
            started_at,
            finished_at,
            error,
        }
    }
}
