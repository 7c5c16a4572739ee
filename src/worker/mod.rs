//! Execution engine for batch jobs.
//!
//! - [`JobExecutor`]: spawns one job's command, logs start and finish, and
//!   reports exit status
//! - [`WorkerPool`]: a fixed number of workers pulling jobs from a shared list
//! - [`Dispatcher`]: picks sequential or pooled execution and summarises the run
//!
//! # Execution Flow
//!
//! 1. [`Dispatcher::run`] receives the windowed job list
//! 2. Each job is handed to [`JobExecutor::execute`], directly or via a worker
//! 3. The child process runs to completion (or until the optional timeout)
//! 4. Every job yields an [`ExecutionResult`]; a [`RunSummary`] collects them
//!
//! Jobs are never retried, and a failed job does not affect the rest.

pub mod dispatcher;
pub mod executor;
pub mod pool;

pub use dispatcher::{Dispatcher, RunSummary};
pub use executor::{ExecutionResult, JobExecutor};
pub use pool::WorkerPool;
