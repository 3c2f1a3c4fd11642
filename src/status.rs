/// Monitor status: a point-in-time summary of retained pauses and ingestion
/// health, printed by the CLI and optionally mirrored to a JSON file.
use crate::event::PauseEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Point-in-time summary of the monitor.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorStatus {
    pub captured_at: DateTime<Utc>,
    pub process_start_ns: i64,
    pub retained_events: usize,
    pub retained_pause_ns: i64,
    pub oldest: Option<PauseEvent>,
    pub newest: Option<PauseEvent>,
    /// Why ingestion stopped, if it has.
    pub fault: Option<String>,
}

impl MonitorStatus {
    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }
}

impl std::fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} pauses retained, {:.3}ms total",
            self.retained_events,
            self.retained_pause_ns as f64 / 1e6
        )?;
        if let Some(newest) = self.newest {
            write!(
                f,
                ", newest at {:.3}s ({:.3}ms)",
                newest.time() as f64 / 1e9,
                newest.duration() as f64 / 1e6
            )?;
        }
        if let Some(fault) = &self.fault {
            write!(f, ", FAULTED: {fault}")?;
        }
        Ok(())
    }
}

/// JSON status file refreshed on every report tick of `gcpause`.
///
/// External dashboards poll this file, so each write goes to a hidden
/// sibling first and is renamed over the target.
pub struct StatusFile {
    path: PathBuf,
}

impl StatusFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Replace the file contents with `status`.
    pub fn write(&self, status: &MonitorStatus) -> Result<(), StatusError> {
        let json = serde_json::to_vec_pretty(status).map_err(StatusError::Encode)?;

        let staging = self.staging_path();
        std::fs::write(&staging, &json).map_err(|e| StatusError::Stage {
            path: staging.clone(),
            source: e,
        })?;

        if let Err(e) = std::fs::rename(&staging, &self.path) {
            let _ = std::fs::remove_file(&staging);
            return Err(StatusError::Publish {
                path: self.path.clone(),
                source: e,
            });
        }
        Ok(())
    }

    /// Delete the file after a clean exit so stale pause data is not read.
    pub fn remove(&self) {
        let _ = std::fs::remove_file(&self.path);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `.<name>.<pid>.tmp` next to the target, on the same filesystem.
    fn staging_path(&self) -> PathBuf {
        let dir = self.path.parent().unwrap_or(Path::new("."));
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "gcpause-status".to_string());
        dir.join(format!(".{name}.{}.tmp", std::process::id()))
    }
}

#[derive(Debug)]
pub enum StatusError {
    /// The status could not be encoded as JSON.
    Encode(serde_json::Error),
    /// The staging copy could not be written.
    Stage {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The staging copy could not be moved over the status file.
    Publish {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for StatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusError::Encode(source) => write!(f, "cannot encode pause status: {}", source),
            StatusError::Stage { path, source } => {
                write!(f, "cannot stage pause status at {}: {}", path.display(), source)
            }
            StatusError::Publish { path, source } => {
                write!(f, "cannot publish pause status to {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for StatusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StatusError::Encode(source) => Some(source),
            StatusError::Stage { source, .. } => Some(source),
            StatusError::Publish { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample(fault: Option<&str>) -> MonitorStatus {
        MonitorStatus {
            captured_at: Utc::now(),
            process_start_ns: 42,
            retained_events: 2,
            retained_pause_ns: 25_000_000,
            oldest: Some(PauseEvent::new(1_000_000_000, 10_000_000)),
            newest: Some(PauseEvent::new(2_000_000_000, 15_000_000)),
            fault: fault.map(str::to_string),
        }
    }

    #[test]
    fn test_write_creates_valid_json() {
        let dir = tempdir().unwrap();
        let status_file = StatusFile::new(dir.path().join("gcpause.status"));

        status_file.write(&sample(None)).unwrap();

        let contents = std::fs::read_to_string(status_file.path()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(v["retained_events"], 2);
        assert_eq!(v["process_start_ns"], 42);
        assert_eq!(v["newest"]["time"], 2_000_000_000i64);
        assert_eq!(v["newest"]["duration"], 15_000_000);
        assert!(v["fault"].is_null());
    }

    #[test]
    fn test_write_overwrites_and_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let status_file = StatusFile::new(dir.path().join("gcpause.status"));

        status_file.write(&sample(None)).unwrap();
        status_file.write(&sample(Some("boom"))).unwrap();

        let contents = std::fs::read_to_string(status_file.path()).unwrap();
        assert!(contents.contains("boom"));

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_failed_publish_cleans_up_staging_copy() {
        let dir = tempdir().unwrap();
        // A non-empty directory at the target path makes the rename fail.
        let target = dir.path().join("status");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("occupied"), "x").unwrap();

        let status_file = StatusFile::new(target);
        let err = status_file.write(&sample(None)).unwrap_err();
        assert!(matches!(err, StatusError::Publish { .. }));

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_remove() {
        let dir = tempdir().unwrap();
        let status_file = StatusFile::new(dir.path().join("gcpause.status"));
        status_file.write(&sample(None)).unwrap();
        status_file.remove();
        assert!(!status_file.path().exists());
        // Removing again is harmless.
        status_file.remove();
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let status_file = StatusFile::new(PathBuf::from("/nonexistent-dir/impossible/status"));
        let err = status_file.write(&sample(None)).unwrap_err();
        assert!(matches!(err, StatusError::Stage { .. }));
        assert!(err.to_string().starts_with("cannot stage pause status"));
    }

    #[test]
    fn test_display_summary() {
        let text = sample(None).to_string();
        assert!(text.starts_with("2 pauses retained, 25.000ms total"));
        assert!(text.contains("newest at 2.000s (15.000ms)"));
        assert!(!sample(None).is_faulted());

        let faulted = sample(Some("gc log ingestion aborted"));
        assert!(faulted.is_faulted());
        assert!(faulted.to_string().contains("FAULTED: gc log ingestion aborted"));
    }
}
