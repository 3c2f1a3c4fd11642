use crate::event::S_TO_NS;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Monitor configuration, loaded from `gcpause.toml`.
///
/// Every field defaults to the fixed value the process-wide monitor uses,
/// so an absent or empty file reproduces the standard behavior.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// GC log to tail, relative to the working directory.
    pub log_file: PathBuf,
    pub poll_interval_ms: u64,
    pub retention_window_secs: u64,
    /// Reference origin (ns since the Unix epoch) for relative times.
    /// Defaults to the start time of the current process.
    pub process_start_ns: Option<i64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("gclog.txt"),
            poll_interval_ms: 200,
            retention_window_secs: 30,
            process_start_ns: None,
        }
    }
}

impl MonitorConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retention_window_ns(&self) -> i64 {
        i64::try_from(self.retention_window_secs)
            .unwrap_or(i64::MAX)
            .saturating_mul(S_TO_NS)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(f, "failed to read config {}: {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "invalid config {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}
