//! Runtime monitor for stop-the-world GC pauses.
//!
//! A background tailer follows the GC log (`gclog.txt` by default), extracts
//! safepoint pause records, and keeps the last 30 seconds of them in a
//! sliding window. Time-sensitive callers ask the [`Monitor`] whether a
//! pause has been logged since some instant, and how much pause time falls
//! in an interval.
//!
//! ```no_run
//! let monitor = gcpause::Monitor::global();
//! let before = gcpause::wall_clock_ns();
//! // ... timed work ...
//! if monitor.has_surpassed(before) {
//!     let lost = monitor.pause_time_in_interval(gcpause::wall_clock_ns(), before);
//!     println!("lost {lost}ns to gc");
//! }
//! ```

pub mod config;
pub mod event;
pub mod monitor;
pub mod origin;
pub mod parser;
pub mod scan;
pub mod status;
pub mod store;
pub mod tailer;

pub use config::MonitorConfig;
pub use event::PauseEvent;
pub use monitor::{wall_clock_ns, Monitor};
pub use origin::process_start_ns;
pub use store::{SlidingWindowStore, Snapshot, StoreError};
pub use tailer::TailError;
