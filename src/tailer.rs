/// GC log tailer: polls the log file for appended lines and feeds parsed
/// pause events into the store.
///
/// Only content appended after the tailer opens the file is observed.
/// A vanished file, a truncated file, or (on unix) a file replaced by
/// rotation is picked up again from its start on a later tick. The open
/// handle is kept across ticks, so whatever was appended to a rotated or
/// removed file before the switch is still read.
use crate::parser::parse_line;
use crate::store::{SlidingWindowStore, StoreError};
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::time::MissedTickBehavior;

/// Longest unterminated line held while waiting for its newline. Anything
/// longer is dropped up to the next newline; pause records are far shorter.
const MAX_PENDING_BYTES: usize = 16 * 1024;

/// Errors that stop the tailer.
#[derive(Debug)]
pub enum TailError {
    /// The log file could not be created at startup.
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The runtime or thread driving the tailer could not be started.
    Spawn { source: std::io::Error },
    /// A parsed event violated time ordering; the log is inconsistent.
    Ingest { source: StoreError },
}

impl std::fmt::Display for TailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TailError::Create { path, source } => {
                write!(f, "failed to create gc log {}: {}", path.display(), source)
            }
            TailError::Spawn { source } => {
                write!(f, "failed to start gc log tailer: {}", source)
            }
            TailError::Ingest { source } => write!(f, "gc log ingestion aborted: {}", source),
        }
    }
}

impl std::error::Error for TailError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TailError::Create { source, .. } => Some(source),
            TailError::Spawn { source } => Some(source),
            TailError::Ingest { source } => Some(source),
        }
    }
}

pub struct LogTailer {
    path: PathBuf,
    poll_interval: Duration,
    store: Arc<SlidingWindowStore>,
    /// Handle on the file currently being followed.
    file: Option<File>,
    file_id: Option<u64>,
    /// Byte offset up to which `file` has been read.
    position: u64,
    /// Bytes after the last newline seen, waiting for the rest of their line.
    pending: Vec<u8>,
    /// Set after an overlong line was dropped; skip to the next newline.
    discarding: bool,
}

impl LogTailer {
    /// Create the log file if it does not exist and position at its end.
    pub fn open(
        path: impl Into<PathBuf>,
        poll_interval: Duration,
        store: Arc<SlidingWindowStore>,
    ) -> Result<Self, TailError> {
        let path = path.into();
        let create_err = |e| TailError::Create {
            path: path.clone(),
            source: e,
        };
        std::fs::OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(create_err)?;
        let file = std::fs::File::open(&path).map_err(create_err)?;
        let meta = file.metadata().map_err(create_err)?;

        tracing::info!(
            path = %path.display(),
            offset = meta.len(),
            poll_ms = poll_interval.as_millis() as u64,
            "tailing gc log"
        );

        Ok(Self {
            path,
            poll_interval,
            store,
            file: Some(File::from_std(file)),
            file_id: file_id(&meta),
            position: meta.len(),
            pending: Vec::new(),
            discarding: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Poll forever. Returns only when ingestion hits a fatal fault.
    pub async fn run(mut self) -> Result<(), TailError> {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.poll_once().await?;
        }
    }

    /// Read whatever has been appended since the last poll and ingest every
    /// complete line. Returns the number of pause events stored.
    ///
    /// When the path now names a different file (rotation) or no file at
    /// all, the rest of the old file is read through the held handle before
    /// switching. Its final line is dropped if it never got a newline.
    ///
    /// I/O problems are not errors: the tick is skipped and retried later.
    pub async fn poll_once(&mut self) -> Result<usize, TailError> {
        let meta = match tokio::fs::metadata(&self.path).await {
            Ok(m) => m,
            Err(e) => {
                if self.file.is_none() {
                    return Ok(0);
                }
                tracing::debug!(path = %self.path.display(), error = %e, "gc log unavailable");
                let stored = self.read_and_ingest().await?;
                self.close();
                return Ok(stored);
            }
        };

        let mut stored = 0;
        let id = file_id(&meta);
        if self.file.is_some() && self.file_id.is_some() && id != self.file_id {
            stored += self.read_and_ingest().await?;
            tracing::info!(path = %self.path.display(), "gc log rotated, reading new file from start");
            self.close();
        } else if meta.len() < self.position {
            tracing::info!(
                path = %self.path.display(),
                len = meta.len(),
                position = self.position,
                "gc log truncated, reading from start"
            );
            self.close();
        }

        if self.file.is_none() {
            match File::open(&self.path).await {
                Ok(file) => {
                    self.file = Some(file);
                    self.file_id = id;
                }
                Err(e) => {
                    tracing::debug!(path = %self.path.display(), error = %e, "gc log open failed");
                    return Ok(stored);
                }
            }
        }

        if meta.len() > self.position {
            stored += self.read_and_ingest().await?;
        }
        Ok(stored)
    }

    /// Read the held file from `position` to its current end and ingest.
    async fn read_and_ingest(&mut self) -> Result<usize, TailError> {
        let Some(file) = self.file.as_mut() else {
            return Ok(0);
        };
        let position = self.position;
        let mut chunk = Vec::new();
        let read = async {
            file.seek(SeekFrom::Start(position)).await?;
            file.read_to_end(&mut chunk).await
        };
        if let Err(e) = read.await {
            tracing::debug!(path = %self.path.display(), error = %e, "gc log read failed");
            return Ok(0);
        }
        self.position += chunk.len() as u64;
        self.pending.extend_from_slice(&chunk);

        self.drain_complete_lines()
    }

    fn drain_complete_lines(&mut self) -> Result<usize, TailError> {
        let mut stored = 0;
        while let Some(end) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=end).collect();
            if self.discarding {
                self.discarding = false;
                continue;
            }
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            let Some(event) = parse_line(line) else {
                continue;
            };
            if let Err(e) = self.store.append(event) {
                tracing::error!(error = %e, line, "gc log time inconsistency, stopping ingestion");
                return Err(TailError::Ingest { source: e });
            }
            stored += 1;
        }

        if self.pending.len() > MAX_PENDING_BYTES {
            tracing::debug!(
                path = %self.path.display(),
                bytes = self.pending.len(),
                "dropping overlong gc log line"
            );
            self.pending.clear();
            self.discarding = true;
        }
        Ok(stored)
    }

    /// Forget the current file; the next tick reopens the path from offset 0.
    fn close(&mut self) {
        self.file = None;
        self.file_id = None;
        self.position = 0;
        self.pending.clear();
        self.discarding = false;
    }
}

#[cfg(unix)]
fn file_id(meta: &std::fs::Metadata) -> Option<u64> {
    use std::os::unix::fs::MetadataExt;
    Some(meta.ino())
}

#[cfg(not(unix))]
fn file_id(_meta: &std::fs::Metadata) -> Option<u64> {
    None
}
