/// Process-wide GC pause monitor.
///
/// Owns the sliding-window store and the background tailer that fills it,
/// and answers queries in absolute wall-clock nanoseconds. Pause events are
/// stored relative to the monitored process's start, so every query first
/// subtracts `process_start_ns`.
use crate::config::MonitorConfig;
use crate::origin;
use crate::status::MonitorStatus;
use crate::store::SlidingWindowStore;
use crate::tailer::{LogTailer, TailError};
use std::sync::{Arc, OnceLock};

static INSTANCE: OnceLock<Monitor> = OnceLock::new();

/// Current wall-clock time in nanoseconds since the Unix epoch.
///
/// Query timestamps should come from this clock.
pub fn wall_clock_ns() -> i64 {
    chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or(i64::MAX)
}

/// The configured origin, else the real process start, else now.
fn resolve_origin(config: &MonitorConfig) -> i64 {
    if let Some(ns) = config.process_start_ns {
        return ns;
    }
    origin::process_start_ns().unwrap_or_else(|| {
        tracing::warn!("process start time unavailable, measuring from monitor construction");
        wall_clock_ns()
    })
}

#[derive(Debug)]
pub struct Monitor {
    store: Arc<SlidingWindowStore>,
    process_start_ns: i64,
    /// Set once if the tailer stops; it never restarts.
    fault: Arc<OnceLock<TailError>>,
}

impl Monitor {
    /// The process-wide monitor, created and started on first access with
    /// the default configuration.
    ///
    /// If the tailer cannot be started, the returned monitor is faulted:
    /// its store stays empty and queries report no pauses.
    pub fn global() -> &'static Monitor {
        INSTANCE.get_or_init(|| {
            let config = MonitorConfig::default();
            Monitor::start(config.clone()).unwrap_or_else(|e| {
                tracing::error!(error = %e, "gc pause monitor failed to start");
                let origin = resolve_origin(&config);
                let monitor = Monitor::from_store(SlidingWindowStore::new(), origin);
                let _ = monitor.fault.set(e);
                monitor
            })
        })
    }

    /// Start a monitor with its own tailer thread.
    ///
    /// The tailer runs on a dedicated thread with a single-threaded tokio
    /// runtime, so callers need not be inside a runtime themselves.
    ///
    /// Relative log times are converted against `config.process_start_ns`
    /// when set, otherwise against the real start of this process.
    pub fn start(config: MonitorConfig) -> Result<Monitor, TailError> {
        let process_start_ns = resolve_origin(&config);
        let store = Arc::new(SlidingWindowStore::with_retention(
            config.retention_window_ns(),
        ));
        let tailer = LogTailer::open(
            config.log_file.clone(),
            config.poll_interval(),
            Arc::clone(&store),
        )?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| TailError::Spawn { source: e })?;

        let fault = Arc::new(OnceLock::new());
        let thread_fault = Arc::clone(&fault);
        std::thread::Builder::new()
            .name("gc-log-tailer".to_string())
            .spawn(move || {
                if let Err(e) = runtime.block_on(tailer.run()) {
                    tracing::error!(error = %e, "gc log tailer stopped");
                    let _ = thread_fault.set(e);
                }
            })
            .map_err(|e| TailError::Spawn { source: e })?;

        tracing::info!(
            process_start_ns,
            log_file = %config.log_file.display(),
            "gc pause monitor started"
        );

        Ok(Monitor {
            store,
            process_start_ns,
            fault,
        })
    }

    /// A monitor over an existing store with no tailer attached.
    pub fn from_store(store: SlidingWindowStore, process_start_ns: i64) -> Monitor {
        Monitor {
            store: Arc::new(store),
            process_start_ns,
            fault: Arc::new(OnceLock::new()),
        }
    }

    pub fn store(&self) -> &SlidingWindowStore {
        &self.store
    }

    pub fn process_start_ns(&self) -> i64 {
        self.process_start_ns
    }

    /// The fault that stopped ingestion, if any.
    pub fn fault(&self) -> Option<&TailError> {
        self.fault.get()
    }

    /// Whether a pause has been logged after the wall-clock instant `time_ns`.
    pub fn has_surpassed(&self, time_ns: i64) -> bool {
        let relative = time_ns.saturating_sub(self.process_start_ns);
        self.store
            .peek_newest()
            .is_some_and(|newest| newest.time() > relative)
    }

    /// Pause time attributed to the interval bounded by `ts1` and `ts2`.
    ///
    /// Walks events oldest to newest. The walk stops at the first event
    /// logged before `ts2`; until then, every event logged before `ts1`
    /// contributes its duration. With `ts1 <= ts2` this counts nothing
    /// unless `ts2` precedes the oldest retained event.
    ///
    /// Never negative: the parser rejects negative durations, and a total
    /// dragged below zero by events appended directly to the store is
    /// clamped to 0.
    pub fn pause_time_in_interval(&self, ts1: i64, ts2: i64) -> i64 {
        let vmt1 = ts1.saturating_sub(self.process_start_ns);
        let vmt2 = ts2.saturating_sub(self.process_start_ns);

        let mut total = 0i64;
        for event in &self.store.snapshot() {
            if vmt2 > event.time() {
                break;
            }
            if vmt1 > event.time() {
                total = total.saturating_add(event.duration());
            }
        }
        total.max(0)
    }

    pub fn status(&self) -> MonitorStatus {
        let snapshot = self.store.snapshot();
        MonitorStatus {
            captured_at: chrono::Utc::now(),
            process_start_ns: self.process_start_ns,
            retained_events: snapshot.len(),
            retained_pause_ns: snapshot.total_duration(),
            oldest: snapshot.oldest(),
            newest: snapshot.newest(),
            fault: self.fault().map(|e| e.to_string()),
        }
    }
}
