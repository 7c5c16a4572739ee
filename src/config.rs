use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{DispatchError, Result};

/// Location of the paths file relative to the project directory.
pub const PATHS_CONFIG_RELATIVE: &str = "conf/cwas_paths.yaml";

/// Configuration for the job dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Number of jobs allowed to run at once. 1 runs jobs in list order.
    pub concurrency: NonZeroUsize,
    /// Kill a job's process if it runs longer than this. `None` waits forever.
    pub job_timeout: Option<Duration>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            concurrency: NonZeroUsize::MIN,
            job_timeout: None,
        }
    }
}

impl DispatchConfig {
    pub fn new(concurrency: NonZeroUsize) -> Self {
        Self {
            concurrency,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = Some(timeout);
        self
    }
}

/// Executable paths of the external CWAS tools, read from `cwas_paths.yaml`.
///
/// The file is a flat mapping; only the `annotate` and `categorize` keys are
/// consumed here, other keys belong to the rest of the pipeline and are kept
/// untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    pub annotate: Option<PathBuf>,
    pub categorize: Option<PathBuf>,
    #[serde(flatten)]
    pub other: HashMap<String, serde_yaml::Value>,
}

impl PathsConfig {
    /// Default paths file: `<parent of cwd>/conf/cwas_paths.yaml`.
    pub fn default_path() -> Result<PathBuf> {
        let cwd = std::env::current_dir()?;
        let project_dir = cwd.parent().unwrap_or(&cwd);
        Ok(project_dir.join(PATHS_CONFIG_RELATIVE))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DispatchError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&contents)
            .map_err(|e| DispatchError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents).map_err(|e| DispatchError::Config(e.to_string()))
    }

    /// Look up a tool path by key, failing if it is absent.
    pub fn tool(&self, key: &str) -> Result<&Path> {
        let path = match key {
            "annotate" => self.annotate.as_deref(),
            "categorize" => self.categorize.as_deref(),
            _ => None,
        };
        path.ok_or_else(|| DispatchError::Config(format!("missing key '{}' in paths file", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_config_default() {
        let cfg = DispatchConfig::default();
        assert_eq!(cfg.concurrency.get(), 1);
        assert!(cfg.job_timeout.is_none());
    }

    #[test]
    fn dispatch_config_with_timeout() {
        let cfg = DispatchConfig::new(NonZeroUsize::new(4).unwrap())
            .with_timeout(Duration::from_secs(30));
        assert_eq!(cfg.concurrency.get(), 4);
        assert_eq!(cfg.job_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn paths_config_parses_tool_keys() {
        let cfg = PathsConfig::from_yaml(
            "annotate: /opt/cwas/annotate.sh\ncategorize: /opt/cwas/categorize.py\nvep_dir: /data/vep\n",
        )
        .unwrap();
        assert_eq!(cfg.tool("annotate").unwrap(), Path::new("/opt/cwas/annotate.sh"));
        assert_eq!(
            cfg.tool("categorize").unwrap(),
            Path::new("/opt/cwas/categorize.py")
        );
        assert!(cfg.other.contains_key("vep_dir"));
    }

    #[test]
    fn paths_config_missing_key_is_config_error() {
        let cfg = PathsConfig::from_yaml("annotate: /opt/cwas/annotate.sh\n").unwrap();
        let err = cfg.tool("categorize").unwrap_err();
        assert!(matches!(err, DispatchError::Config(_)));
        assert!(err.to_string().contains("categorize"));
    }

    #[test]
    fn paths_config_rejects_malformed_yaml() {
        let err = PathsConfig::from_yaml("annotate: [unterminated").unwrap_err();
        assert!(matches!(err, DispatchError::Config(_)));
    }

    #[test]
    fn paths_config_load_missing_file() {
        let err = PathsConfig::load(Path::new("/nonexistent/cwas_paths.yaml")).unwrap_err();
        assert!(matches!(err, DispatchError::Config(_)));
    }

    #[test]
    fn paths_config_default_path_ends_with_conf_file() {
        let path = PathsConfig::default_path().unwrap();
        assert!(path.ends_with(PATHS_CONFIG_RELATIVE));
    }
}
