/// Start time of the current process, in nanoseconds since the Unix epoch.
///
/// GC log offsets count from process start, so this is the origin every
/// query is converted against. On Linux the age of the process is read from
/// procfs with clock-tick resolution; elsewhere `sysinfo` reports the start
/// time to the second. Both round toward an earlier start, never a later one.
use crate::event::S_TO_NS;

/// Resolution of `/proc` tick counters (USER_HZ), fixed by the kernel ABI.
#[cfg(target_os = "linux")]
const TICKS_PER_SEC: i64 = 100;

/// Look up the real start time of this process.
pub fn process_start_ns() -> Option<i64> {
    #[cfg(target_os = "linux")]
    let procfs = procfs_start_ns();
    #[cfg(not(target_os = "linux"))]
    let procfs = None;
    procfs.or_else(sysinfo_start_ns)
}

#[cfg(target_os = "linux")]
fn procfs_start_ns() -> Option<i64> {
    let stat = std::fs::read_to_string("/proc/self/stat").ok()?;
    let uptime = std::fs::read_to_string("/proc/uptime").ok()?;
    let now = crate::monitor::wall_clock_ns();

    let started_ticks = parse_start_ticks(&stat)?;
    let uptime_ns = parse_uptime_ns(&uptime)?;
    // /proc/uptime is truncated to one tick; add it back so the age is an upper bound.
    let tick_ns = S_TO_NS / TICKS_PER_SEC;
    let started_ns = i64::try_from(started_ticks).ok()?.checked_mul(tick_ns)?;
    let age_ns = uptime_ns + tick_ns - started_ns;
    if age_ns < 0 {
        return None;
    }
    Some(now - age_ns)
}

fn sysinfo_start_ns() -> Option<i64> {
    use sysinfo::{ProcessesToUpdate, System};

    let pid = sysinfo::get_current_pid().ok()?;
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), false);
    let secs = system.process(pid)?.start_time();
    i64::try_from(secs).ok()?.checked_mul(S_TO_NS)
}

/// Field 22 of `/proc/<pid>/stat`: start time in ticks after boot.
///
/// The command name (field 2) may contain spaces and parentheses, so fields
/// are counted from the last `)`.
fn parse_start_ticks(stat: &str) -> Option<u64> {
    let after_comm = &stat[stat.rfind(')')? + 1..];
    after_comm.split_whitespace().nth(19)?.parse().ok()
}

/// First field of `/proc/uptime`, e.g. `"12345.67 54321.00"`.
fn parse_uptime_ns(uptime: &str) -> Option<i64> {
    let secs: f64 = uptime.split_whitespace().next()?.parse().ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some((secs * S_TO_NS as f64) as i64)
}
