/// A single stop-the-world pause recorded in the GC log.
use serde::Serialize;

/// Nanoseconds per second.
pub const S_TO_NS: i64 = 1_000_000_000;

/// How far behind the newest event a retained event may lag (30 seconds).
pub const RETENTION_WINDOW_NS: i64 = 30 * S_TO_NS;

/// One GC pause, in nanoseconds relative to the start of the monitored process.
///
/// Ordering is lexicographic on `(time, duration)`. Events arrive already
/// ordered, so this is only used to state ordering guarantees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PauseEvent {
    time: i64,
    duration: i64,
}

impl PauseEvent {
    pub fn new(time: i64, duration: i64) -> Self {
        Self { time, duration }
    }

    /// Offset from process start at which the pause was logged.
    pub fn time(&self) -> i64 {
        self.time
    }

    /// Length of the pause.
    pub fn duration(&self) -> i64 {
        self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_by_time_then_duration() {
        let a = PauseEvent::new(1, 50);
        let b = PauseEvent::new(2, 10);
        let c = PauseEvent::new(2, 20);
        assert!(a < b);
        assert!(b < c);

        let mut events = vec![c, a, b];
        events.sort();
        assert_eq!(events, vec![a, b, c]);
    }

    #[test]
    fn test_retention_window_is_thirty_seconds() {
        assert_eq!(RETENTION_WINDOW_NS, 30_000_000_000);
    }
}
