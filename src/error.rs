//! # Error Handling
//!
//! This module provides the error types for Sanctum Core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                      │
//! │  │                                                                      │
//! │  ├── Lifecycle Errors                                                   │
//! │  │   └── NotInitialized        - Store used before set_up()             │
//! │  │                                                                      │
//! │  ├── Crypto Errors                                                      │
//! │  │   ├── EncryptionFailed      - Sealing a record payload failed        │
//! │  │   ├── DecryptionFailed      - Wrong key or tampered payload          │
//! │  │   └── KeyDerivationFailed   - Storage-key derivation failed          │
//! │  │                                                                      │
//! │  ├── Mapping Errors                                                     │
//! │  │   ├── Corrupted             - Required record field missing/empty    │
//! │  │   ├── SerializationError    - Encoding a domain value failed         │
//! │  │   └── DeserializationFailed - Decoded payload has the wrong shape    │
//! │  │                                                                      │
//! │  ├── Storage Errors                                                     │
//! │  │   └── DatabaseError         - SQLite-level failure                   │
//! │  │                                                                      │
//! │  └── Account Errors                                                     │
//! │      ├── AccountNotFound                - Unknown user id               │
//! │      ├── ActiveAccountDataNotFound      - Stale active pointer          │
//! │      └── AccountsAvailableButNoActiveId - Sessions but no pointer       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `Corrupted` and `DecryptionFailed` are deliberately distinct kinds: a
//! corrupted row means the local store lost a column and the single row
//! can be skipped or reported, while a decryption failure usually means
//! the wrong key and warrants re-authentication rather than data repair.

use thiserror::Error;

/// Result type alias for Sanctum Core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Sanctum Core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Lifecycle Errors
    // ========================================================================

    /// A store was used before its `set_up()` completed
    #[error("Store has not been set up. Call set_up() before any other operation.")]
    NotInitialized,

    // ========================================================================
    // Crypto Errors
    // ========================================================================

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed (wrong key, tampered data, or truncated frame)
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Key derivation failed
    #[error("Failed to derive storage key: {0}")]
    KeyDerivationFailed(String),

    // ========================================================================
    // Mapping Errors
    // ========================================================================

    /// A persisted record is missing a field the domain model requires
    #[error("Corrupted {entity} record: required field `{field}` is missing or empty")]
    Corrupted {
        /// Record kind, e.g. `"item"`
        entity: &'static str,
        /// The offending column
        field: &'static str,
    },

    /// Encoding a domain value for storage failed
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A decrypted payload did not decode into the expected domain shape
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    // ========================================================================
    // Storage Errors
    // ========================================================================

    /// Database error
    #[error("Database error: {0}")]
    DatabaseError(String),

    // ========================================================================
    // Account Errors
    // ========================================================================

    /// The given user id is not among the locally stored sessions
    #[error("No stored account for user id {0}")]
    AccountNotFound(String),

    /// An active user id is recorded but no matching session exists.
    /// Stale pointer: surfaced, never silently repaired.
    #[error("Active account data not found")]
    ActiveAccountDataNotFound,

    /// Sessions exist locally but none is marked active
    #[error("Accounts are available but no active user id is recorded")]
    AccountsAvailableButNoActiveId,
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::SerializationError(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupted_names_entity_and_field() {
        let err = Error::Corrupted {
            entity: "item",
            field: "encrypted_content",
        };
        let msg = err.to_string();
        assert!(msg.contains("item"));
        assert!(msg.contains("encrypted_content"));
    }

    #[test]
    fn test_decryption_and_corruption_are_distinct() {
        let bad_key = Error::DecryptionFailed("auth tag mismatch".into());
        let bad_row = Error::Corrupted {
            entity: "share",
            field: "vault_id",
        };
        assert!(!matches!(bad_key, Error::Corrupted { .. }));
        assert!(!matches!(bad_row, Error::DecryptionFailed(_)));
    }
}
