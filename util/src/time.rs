//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Convert a number of milliseconds into a `std::time::Duration`.
///
/// Negative or non-finite values give a zero duration.
pub fn millis_to_duration(millis: f64) -> std::time::Duration {
    if millis.is_finite() && millis > 0.0 {
        std::time::Duration::from_nanos((millis * 1e6).round() as u64)
    }
    else {
        std::time::Duration::from_secs(0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(
            duration_to_seconds(chrono::Duration::milliseconds(1500)),
            Some(1.5)
        );
    }

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(40.0), std::time::Duration::from_millis(40));
        assert_eq!(millis_to_duration(-5.0), std::time::Duration::from_secs(0));
        assert_eq!(millis_to_duration(f64::NAN), std::time::Duration::from_secs(0));
    }
}
