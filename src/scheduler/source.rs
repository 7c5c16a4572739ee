use std::path::PathBuf;

use crate::error::{DispatchError, Result};

/// Extension of the input files picked up by default.
pub const INPUT_EXTENSION: &str = ".vcf";

/// Lists the input files of a batch run.
///
/// Only the top level of `dir` is scanned. Hidden entries are skipped and
/// symlinks are followed, so the result matches what a shell `*.vcf` glob
/// would expand to.
#[derive(Debug, Clone)]
pub struct JobSource {
    dir: PathBuf,
    extension: String,
}

impl JobSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_extension(dir, INPUT_EXTENSION)
    }

    pub fn with_extension(dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.into(),
        }
    }

    /// Matching file paths, sorted by byte order of the full path.
    pub fn scan(&self) -> Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|_| DispatchError::DirectoryNotFound(self.dir.clone()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|_| DispatchError::DirectoryNotFound(self.dir.clone()))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                tracing::warn!(path = %entry.path().display(), "Skipping non UTF-8 file name");
                continue;
            };
            if name.starts_with('.') || !name.ends_with(&self.extension) {
                continue;
            }

            let path = entry.path();
            // metadata() follows symlinks; dangling links and directories are dropped
            if std::fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false) {
                paths.push(path);
            }
        }

        paths.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
        tracing::debug!(dir = %self.dir.display(), count = paths.len(), "Scanned input directory");
        Ok(paths)
    }
}
