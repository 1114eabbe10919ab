//! # Storage Module
//!
//! Local persistence for Sanctum records.
//!
//! ## Storage Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         STORAGE SYSTEM                                  │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │  Platform Secure Storage (Keys Only)                            │    │
//! │  │  ───────────────────────────────────                            │    │
//! │  │                                                                 │    │
//! │  │  iOS: Keychain         Android: Keystore                        │    │
//! │  │  Desktop: OS keyring                                            │    │
//! │  │                                                                 │    │
//! │  │  Stored: the master seed the storage key derives from.          │    │
//! │  │  Owned by the host app; this crate receives the seed.           │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │  SQLite Database                                                │    │
//! │  │  ───────────────                                                │    │
//! │  │                                                                 │    │
//! │  │  Tables:                                                        │    │
//! │  │  • item_records / share_records / access_records /              │    │
//! │  │    invite_records - flat sentinel-encoded rows                  │    │
//! │  │  • account_records / auth_credential_records /                  │    │
//! │  │    user_preference_records / shared_preference_record -         │    │
//! │  │    sealed AES-256-GCM blobs                                     │    │
//! │  │  • settings - plain app-scope key/value cells                   │    │
//! │  │  • share_event_records - remote event-stream cursors            │    │
//! │  │                                                                 │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod database;
pub mod schema;

pub use database::{Database, DatabaseConfig};

use crate::error::Result;

/// Open the storage system
pub async fn init(config: DatabaseConfig) -> Result<Database> {
    Database::open(config.path.as_deref()).await
}
