/// Time utilities for record timestamps.
///
/// Timestamps are Unix epoch integers because that is what the record
/// columns store; `chrono` provides the clock.

/// Returns the current Unix timestamp in seconds.
pub fn now_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Returns the current Unix timestamp in milliseconds.
pub fn now_timestamp_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_timestamp_is_reasonable() {
        let ts = now_timestamp();
        // Should be after 2024-01-01 (1704067200)
        assert!(ts > 1704067200, "Timestamp {} is too old", ts);
        // Should be before 2100-01-01 (4102444800)
        assert!(ts < 4102444800, "Timestamp {} is too far in future", ts);
    }

    #[test]
    fn test_now_timestamp_millis_is_reasonable() {
        let ts = now_timestamp_millis();
        assert!(ts > 1704067200_000, "Timestamp {} is too old", ts);
    }
}
