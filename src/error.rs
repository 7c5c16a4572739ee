use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Input directory not found or unreadable: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Input file name does not end with {expected:?}: {}", .path.display())]
    InvalidInputName { path: PathBuf, expected: String },

    #[error("Invalid job range: start={start}, end={end}")]
    InvalidRange { start: i64, end: i64 },

    #[error("Invalid command template: {0}")]
    InvalidTemplate(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DispatchError>;
