/// Offline scan of a complete GC log: every pause record, in file order.
use crate::event::PauseEvent;
use crate::parser::parse_line;
use crate::store::StoreError;
use serde::Serialize;
use std::io::BufRead;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize)]
pub struct ScanReport {
    pub lines: u64,
    pub events: Vec<PauseEvent>,
    pub total_pause_ns: i64,
}

impl ScanReport {
    /// Largest single pause, if any.
    pub fn longest(&self) -> Option<PauseEvent> {
        self.events.iter().copied().max_by_key(PauseEvent::duration)
    }
}

/// Parse every line of `path`.
///
/// Applies the same ordering rule as live ingestion: an event older than
/// its predecessor ends the scan with an error.
pub fn scan_file(path: &Path) -> Result<ScanReport, ScanError> {
    let file = std::fs::File::open(path).map_err(|e| ScanError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let reader = std::io::BufReader::new(file);

    let mut report = ScanReport::default();
    for line in reader.split(b'\n') {
        let line = line.map_err(|e| ScanError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        report.lines += 1;

        let text = String::from_utf8_lossy(&line);
        let Some(event) = parse_line(text.trim_end_matches('\r')) else {
            continue;
        };

        if let Some(prev) = report.events.last() {
            if event.time() < prev.time() {
                return Err(ScanError::Ingest {
                    line: report.lines,
                    source: StoreError::TimeInconsistency {
                        newest: prev.time(),
                        attempted: event.time(),
                    },
                });
            }
        }
        report.total_pause_ns = report.total_pause_ns.saturating_add(event.duration());
        report.events.push(event);
    }

    tracing::debug!(
        path = %path.display(),
        lines = report.lines,
        events = report.events.len(),
        "scanned gc log"
    );
    Ok(report)
}

#[derive(Debug)]
pub enum ScanError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Ingest {
        line: u64,
        source: StoreError,
    },
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            ScanError::Ingest { line, source } => write!(f, "line {}: {}", line, source),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Io { source, .. } => Some(source),
            ScanError::Ingest { source, .. } => Some(source),
        }
    }
}
