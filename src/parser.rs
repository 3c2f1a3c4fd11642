/// GC log line parsing.
///
/// Recognizes safepoint pause records of the form:
///
/// ```text
/// 12.345: [GC pause] Total time for which application threads were stopped: 0.0210000 seconds
/// ```
///
/// Field 0 is the seconds offset since process start; field 2 is the pause
/// length in seconds followed by the unit suffix.
use crate::event::{PauseEvent, S_TO_NS};

/// Phrase that marks a line as a stop-the-world pause record.
pub const RECOGNITION_PHRASE: &str = "Total time for which application threads were stopped";

/// Field separator within a pause record.
const FIELD_SEPARATOR: &str = ": ";

/// Length of the `" seconds"` unit suffix trailing the duration field.
const UNIT_SUFFIX_LEN: usize = 8;

/// Parse one log line into a pause event.
///
/// Returns `None` for lines without the recognition phrase and for pause
/// records whose numeric fields do not parse or whose duration is negative.
/// Neither case is an error.
pub fn parse_line(line: &str) -> Option<PauseEvent> {
    if !line.contains(RECOGNITION_PHRASE) {
        return None;
    }

    let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();

    let time = seconds_to_ns(parse_seconds(fields.first()?)?);

    let raw_duration = fields.get(2)?;
    let cut = raw_duration.len().checked_sub(UNIT_SUFFIX_LEN)?;
    let duration = parse_seconds(raw_duration.get(..cut)?).filter(|d| *d >= 0.0)?;
    let duration = seconds_to_ns(duration);

    Some(PauseEvent::new(time, duration))
}

fn parse_seconds(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|s| s.is_finite())
}

/// Truncating conversion; out-of-range values saturate.
fn seconds_to_ns(seconds: f64) -> i64 {
    (S_TO_NS as f64 * seconds) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(time: &str, duration: &str) -> String {
        format!("{time}: [GC pause] {RECOGNITION_PHRASE}: {duration} seconds")
    }

    #[test]
    fn test_parse_pause_record() {
        let line = "12.345: [GC pause] Total time for which application threads were stopped: 0.0210000 seconds";
        let event = parse_line(line).unwrap();
        assert_eq!(event, PauseEvent::new(12_345_000_000, 21_000_000));
    }

    #[test]
    fn test_parse_whole_seconds() {
        let event = parse_line(&record("3", "1.5")).unwrap();
        assert_eq!(event.time(), 3 * S_TO_NS);
        assert_eq!(event.duration(), 1_500_000_000);
    }

    #[test]
    fn test_parse_truncates_sub_nanosecond() {
        let event = parse_line(&record("0.0000000019", "0.0000000001")).unwrap();
        assert_eq!(event.time(), 1);
        assert_eq!(event.duration(), 0);
    }

    #[test]
    fn test_ignore_unrelated_line() {
        assert!(parse_line("0.512: [GC (Allocation Failure) 8192K->1024K(31744K), 0.0031 secs]").is_none());
        assert!(parse_line("").is_none());
    }

    #[test]
    fn test_non_numeric_time_discarded() {
        assert!(parse_line(&record("abc", "0.0210000")).is_none());
    }

    #[test]
    fn test_non_numeric_duration_discarded() {
        assert!(parse_line(&record("12.345", "fast")).is_none());
    }

    #[test]
    fn test_missing_duration_field_discarded() {
        assert!(parse_line(&format!("12.345: {RECOGNITION_PHRASE}")).is_none());
    }

    #[test]
    fn test_duration_shorter_than_suffix_discarded() {
        assert!(parse_line(&format!("12.345: x {RECOGNITION_PHRASE}: 0.1s")).is_none());
    }

    #[test]
    fn test_non_finite_values_discarded() {
        assert!(parse_line(&record("NaN", "0.01")).is_none());
        assert!(parse_line(&record("1.0", "inf")).is_none());
    }

    #[test]
    fn test_negative_duration_discarded() {
        assert!(parse_line(&record("1.0", "-0.0050000")).is_none());
        assert_eq!(parse_line(&record("1.0", "0.0")).unwrap().duration(), 0);
    }

    #[test]
    fn test_multibyte_suffix_does_not_panic() {
        // Cut point lands inside the two-byte character.
        let line = format!("1.0: {RECOGNITION_PHRASE}: 0.5é1234567");
        assert!(parse_line(&line).is_none());
    }
}
