//! Job derivation: which external-tool invocations a batch run consists of.
//!
//! - [`JobSource`]: lists `*.vcf` inputs of a directory in a stable order
//! - [`JobBuilder`]: turns each input into a [`Job`] (output path + command)
//! - [`Window`]: restricts the job list to an index range
//!
//! Everything here is pure apart from the directory listing; nothing is run.

pub mod job;
pub mod source;
pub mod window;

pub use job::{Job, JobBuilder, JobCommand, JobStatus, JobTemplate, ToolMode};
pub use source::JobSource;
pub use window::Window;
