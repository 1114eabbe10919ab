//! # Database Schema
//!
//! SQL schema definitions for the Sanctum database.
//!
//! ## Schema Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         DATABASE SCHEMA                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐     │
//! │  │   item_records   │   │  share_records   │   │  access_records  │     │
//! │  ├──────────────────┤   ├──────────────────┤   ├──────────────────┤     │
//! │  │ user_id          │   │ user_id          │   │ user_id          │     │
//! │  │ share_id/item_id │──►│ share_id         │   │ plan + limits    │     │
//! │  │ flat item fields │   │ flat share fields│   │ (sentinel -1)    │     │
//! │  │ encrypted_content│   │ sentinel fields  │   │ monitor flags    │     │
//! │  └──────────────────┘   └──────────────────┘   └──────────────────┘     │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────────┐   ┌────────────────┐   │
//! │  │ account_records  │   │ auth_credential_     │   │ invite_records │   │
//! │  ├──────────────────┤   │ records              │   ├────────────────┤   │
//! │  │ user_id          │   ├──────────────────────┤   │ user_id        │   │
//! │  │ encrypted_data   │   │ user_id + module     │   │ invite_token   │   │
//! │  │ is_active        │   │ encrypted_data       │   │ flat fields    │   │
//! │  │ update_time      │   └──────────────────────┘   └────────────────┘   │
//! │  └──────────────────┘                                                   │
//! │                                                                         │
//! │  ┌──────────────────────┐  ┌───────────────────────┐  ┌─────────────┐   │
//! │  │ user_preference_     │  │ shared_preference_    │  │  settings   │   │
//! │  │ records              │  │ record (singleton)    │  ├─────────────┤   │
//! │  ├──────────────────────┤  ├───────────────────────┤  │ key         │   │
//! │  │ user_id              │  │ id = 1                │  │ value       │   │
//! │  │ encrypted_content    │  │ encrypted_content     │  │ updated_at  │   │
//! │  └──────────────────────┘  └───────────────────────┘  └─────────────┘   │
//! │                                                                         │
//! │  ┌──────────────────────┐                                               │
//! │  │ share_event_records  │  remote event-stream cursor per share         │
//! │  └──────────────────────┘                                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL to create all tables
pub const CREATE_TABLES: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY
);

-- Item records
-- Flat item rows; optional domain fields use sentinels (-1 / '')
CREATE TABLE IF NOT EXISTS item_records (
    user_id TEXT NOT NULL,
    share_id TEXT NOT NULL,
    item_id TEXT NOT NULL,
    revision INTEGER NOT NULL,
    content_format_version INTEGER NOT NULL,
    key_rotation INTEGER NOT NULL,
    -- Item payload as received from the server (base64 ciphertext)
    content TEXT NOT NULL,
    -- Per-item key for shared items; '' when absent
    item_key TEXT NOT NULL DEFAULT '',
    state INTEGER NOT NULL,
    pinned INTEGER NOT NULL DEFAULT 0,
    -- -1 when the item was never pinned
    pin_time INTEGER NOT NULL DEFAULT -1,
    -- '' for non-alias items
    alias_email TEXT NOT NULL DEFAULT '',
    create_time INTEGER NOT NULL,
    modify_time INTEGER NOT NULL,
    -- -1 when the item was never autofilled
    last_use_time INTEGER NOT NULL DEFAULT -1,
    revision_time INTEGER NOT NULL,
    -- Content re-encrypted under the local storage key; required
    encrypted_content TEXT NOT NULL,
    is_login_item INTEGER NOT NULL DEFAULT 0,
    flags INTEGER NOT NULL DEFAULT 0,
    share_count INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (share_id, item_id)
);
CREATE INDEX IF NOT EXISTS idx_item_records_user ON item_records(user_id);
CREATE INDEX IF NOT EXISTS idx_item_records_user_state ON item_records(user_id, state);
CREATE INDEX IF NOT EXISTS idx_item_records_pinned ON item_records(user_id, pinned) WHERE pinned = 1;

-- Share records
CREATE TABLE IF NOT EXISTS share_records (
    user_id TEXT NOT NULL,
    share_id TEXT PRIMARY KEY,
    vault_id TEXT NOT NULL,
    address_id TEXT NOT NULL,
    -- 1 = vault, 2 = item
    target_type INTEGER NOT NULL,
    target_id TEXT NOT NULL,
    permission INTEGER NOT NULL,
    share_role_id TEXT NOT NULL,
    owner INTEGER NOT NULL DEFAULT 0,
    shared INTEGER NOT NULL DEFAULT 0,
    -- '' for item shares
    content TEXT NOT NULL DEFAULT '',
    -- -1 when no content is attached
    content_key_rotation INTEGER NOT NULL DEFAULT -1,
    content_format_version INTEGER NOT NULL DEFAULT -1,
    -- -1 when the share never expires
    expire_time INTEGER NOT NULL DEFAULT -1,
    create_time INTEGER NOT NULL,
    can_auto_fill INTEGER NOT NULL DEFAULT 1
);
CREATE INDEX IF NOT EXISTS idx_share_records_user ON share_records(user_id);

-- Access records, one per user
CREATE TABLE IF NOT EXISTS access_records (
    user_id TEXT PRIMARY KEY,
    plan_type TEXT NOT NULL,
    internal_name TEXT NOT NULL,
    display_name TEXT NOT NULL,
    hide_upgrade INTEGER NOT NULL DEFAULT 0,
    -- limit columns: -1 = unlimited/absent, 0 is a real limit
    trial_end INTEGER NOT NULL DEFAULT -1,
    vault_limit INTEGER NOT NULL DEFAULT -1,
    alias_limit INTEGER NOT NULL DEFAULT -1,
    totp_limit INTEGER NOT NULL DEFAULT -1,
    monitor_addresses INTEGER NOT NULL DEFAULT 1,
    monitor_aliases INTEGER NOT NULL DEFAULT 1,
    pending_invites INTEGER NOT NULL DEFAULT 0,
    waiting_new_user_invites INTEGER NOT NULL DEFAULT 0,
    min_version_upgrade TEXT NOT NULL DEFAULT '',
    default_share_id TEXT NOT NULL DEFAULT '',
    alias_sync_enabled INTEGER NOT NULL DEFAULT 0,
    pending_alias_to_sync INTEGER NOT NULL DEFAULT 0
);

-- Pending share invites
CREATE TABLE IF NOT EXISTS invite_records (
    user_id TEXT NOT NULL,
    invite_token TEXT PRIMARY KEY,
    inviter_email TEXT NOT NULL,
    invited_email TEXT NOT NULL,
    target_type INTEGER NOT NULL,
    vault_name TEXT NOT NULL DEFAULT '',
    item_count INTEGER NOT NULL DEFAULT 0,
    member_count INTEGER NOT NULL DEFAULT 0,
    remind_count INTEGER NOT NULL DEFAULT 0,
    create_time INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_invite_records_user ON invite_records(user_id);

-- Account sessions; at most one row has is_active = 1
CREATE TABLE IF NOT EXISTS account_records (
    user_id TEXT PRIMARY KEY,
    -- Sealed UserAccount payload
    encrypted_data BLOB NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 0,
    update_time INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_account_records_active ON account_records(is_active) WHERE is_active = 1;

-- Auth credentials, one per (user, app module)
CREATE TABLE IF NOT EXISTS auth_credential_records (
    user_id TEXT NOT NULL,
    module TEXT NOT NULL,
    -- Sealed AuthCredential payload
    encrypted_data BLOB NOT NULL,
    PRIMARY KEY (user_id, module)
);

-- Per-user preferences
CREATE TABLE IF NOT EXISTS user_preference_records (
    user_id TEXT PRIMARY KEY,
    -- Sealed UserPreferences payload
    encrypted_content BLOB NOT NULL
);

-- Device-wide shared preferences, a single sealed row
CREATE TABLE IF NOT EXISTS shared_preference_record (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    -- Sealed SharedPreferences payload
    encrypted_content BLOB NOT NULL
);

-- Settings table
-- Key-value store for plain app-scope state (app preferences JSON,
-- migration bitmask)
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    -- JSON-encoded or plain text value
    value TEXT NOT NULL,
    -- Last update timestamp
    updated_at INTEGER NOT NULL
);

-- Remote event-stream cursor per share
CREATE TABLE IF NOT EXISTS share_event_records (
    user_id TEXT NOT NULL,
    share_id TEXT NOT NULL,
    last_event_id TEXT NOT NULL,
    PRIMARY KEY (user_id, share_id)
);
"#;

/// Migration SQL from schema version 1 → 2
///
/// Adds the server-side `flags` bitfield and the `share_count` column
/// to item rows, mirroring the fields the item list gained.
pub const MIGRATE_V1_TO_V2: &str = r#"
ALTER TABLE item_records ADD COLUMN flags INTEGER NOT NULL DEFAULT 0;
ALTER TABLE item_records ADD COLUMN share_count INTEGER NOT NULL DEFAULT 0;

-- Update schema version
UPDATE schema_version SET version = 2;
"#;

/// SQL to drop all tables (for testing/reset)
pub const DROP_TABLES: &str = r#"
DROP TABLE IF EXISTS share_event_records;
DROP TABLE IF EXISTS settings;
DROP TABLE IF EXISTS shared_preference_record;
DROP TABLE IF EXISTS user_preference_records;
DROP TABLE IF EXISTS auth_credential_records;
DROP TABLE IF EXISTS account_records;
DROP TABLE IF EXISTS invite_records;
DROP TABLE IF EXISTS access_records;
DROP TABLE IF EXISTS share_records;
DROP TABLE IF EXISTS item_records;
DROP TABLE IF EXISTS schema_version;
"#;
