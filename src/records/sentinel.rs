//! # Sentinel Codec
//!
//! Record columns are non-optional scalars, so optional domain fields
//! are stored with reserved in-range values: `-1` for "absent" integers
//! and the empty string for "absent" strings. Every mapper goes through
//! this module instead of re-deriving the convention at call sites.
//!
//! Valid value ranges must not overlap the sentinel: an integer field
//! that uses the sentinel must only hold values `>= 0` when present
//! (limits, counts, epoch timestamps). `0` is always a meaningful
//! value; a zero limit is a real limit, not "absent".

/// The reserved integer meaning "absent"
pub const ABSENT_INT: i64 = -1;

/// Encode an optional integer for a non-optional column
pub fn encode_optional_int(value: Option<i64>) -> i64 {
    value.unwrap_or(ABSENT_INT)
}

/// Decode a sentinel-encoded integer column
pub fn decode_optional_int(stored: i64) -> Option<i64> {
    if stored == ABSENT_INT {
        None
    } else {
        Some(stored)
    }
}

/// Encode an optional string for a non-optional column
pub fn encode_optional_string(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

/// Decode a sentinel-encoded string column
pub fn decode_optional_string(stored: &str) -> Option<String> {
    if stored.is_empty() {
        None
    } else {
        Some(stored.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
