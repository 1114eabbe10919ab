//! # Database
//!
//! SQLite database wrapper for record storage.
//!
//! ## Database Operations
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      DATABASE OPERATIONS                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐                                                    │
//! │  │  Stores/Mappers │                                                    │
//! │  └────────┬────────┘                                                    │
//! │           │  record structs in, record structs out                      │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                    │
//! │  │    Database     │  Row-level CRUD keyed by                           │
//! │  │   (this file)   │  (user_id, record kind) or singleton keys          │
//! │  └────────┬────────┘                                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                    │
//! │  │    rusqlite     │  SQLite wrapper                                    │
//! │  └────────┬────────┘                                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                    │
//! │  │   SQLite DB     │  In-memory for tests, file for production          │
//! │  └─────────────────┘                                                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The database never interprets sealed blobs or sentinel values; that
//! is the mappers' job. It only moves record structs in and out.

use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::records::{AccessRecord, AccountRecord, AuthCredentialRecord, InviteRecord,
                     ItemRecord, ShareRecord, SharedPreferencesRecord, UserPreferencesRecord};

use super::schema;

/// Database configuration
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    /// Path to the database file
    pub path: Option<String>,
}

/// The main database handle
///
/// Wraps a SQLite connection and provides row-level methods for every
/// record table.
pub struct Database {
    /// The underlying SQLite connection
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create a database
    ///
    /// If path is None, creates an in-memory database (useful for testing).
    pub async fn open(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(p) => Connection::open(p)
                .map_err(|e| Error::DatabaseError(format!("Failed to open database: {}", e)))?,
            None => Connection::open_in_memory().map_err(|e| {
                Error::DatabaseError(format!("Failed to create in-memory database: {}", e))
            })?,
        };

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema()?;

        Ok(db)
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        let version: Option<i32> = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .ok();

        match version {
            None => {
                conn.execute_batch(schema::CREATE_TABLES)
                    .map_err(|e| Error::DatabaseError(format!("Failed to create tables: {}", e)))?;

                conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?)",
                    params![schema::SCHEMA_VERSION],
                )
                .map_err(|e| {
                    Error::DatabaseError(format!("Failed to set schema version: {}", e))
                })?;

                tracing::info!("Database schema created (version {})", schema::SCHEMA_VERSION);
            }
            Some(v) if v < schema::SCHEMA_VERSION => {
                tracing::info!(
                    "Database schema version {} is older than current {}, running migrations",
                    v,
                    schema::SCHEMA_VERSION
                );

                if v < 2 {
                    tracing::info!("Running migration v1 → v2 (item flags, share_count)");
                    conn.execute_batch(schema::MIGRATE_V1_TO_V2)
                        .map_err(|e| {
                            Error::DatabaseError(format!("Migration v1→v2 failed: {}", e))
                        })?;
                }

                tracing::info!(
                    "All migrations complete (now at version {})",
                    schema::SCHEMA_VERSION
                );
            }
            Some(v) => {
                tracing::debug!("Database schema version: {}", v);
            }
        }

        Ok(())
    }

    // ========================================================================
    // ITEM OPERATIONS
    // ========================================================================

    /// Insert or replace a batch of item rows
    pub fn upsert_items(&self, records: &[ItemRecord]) -> Result<()> {
        let conn = self.conn.lock();

        for record in records {
            conn.execute(
                "INSERT OR REPLACE INTO item_records (
                     user_id, share_id, item_id, revision, content_format_version,
                     key_rotation, content, item_key, state, pinned, pin_time,
                     alias_email, create_time, modify_time, last_use_time,
                     revision_time, encrypted_content, is_login_item, flags, share_count)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    record.user_id,
                    record.share_id,
                    record.item_id,
                    record.revision,
                    record.content_format_version,
                    record.key_rotation,
                    record.content,
                    record.item_key,
                    record.state,
                    record.pinned,
                    record.pin_time,
                    record.alias_email,
                    record.create_time,
                    record.modify_time,
                    record.last_use_time,
                    record.revision_time,
                    record.encrypted_content,
                    record.is_login_item,
                    record.flags,
                    record.share_count,
                ],
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to upsert item: {}", e)))?;
        }

        Ok(())
    }

    /// Get all item rows of a user
    pub fn get_items(&self, user_id: &str) -> Result<Vec<ItemRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM item_records WHERE user_id = ? ORDER BY modify_time DESC",
                ITEM_COLUMNS
            ))
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![user_id], item_from_row)
            .map_err(|e| Error::DatabaseError(format!("Failed to query items: {}", e)))?;

        collect_rows(rows, "item")
    }

    /// Get all item rows of a share
    pub fn get_items_for_share(&self, share_id: &str) -> Result<Vec<ItemRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM item_records WHERE share_id = ? ORDER BY modify_time DESC",
                ITEM_COLUMNS
            ))
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![share_id], item_from_row)
            .map_err(|e| Error::DatabaseError(format!("Failed to query items: {}", e)))?;

        collect_rows(rows, "item")
    }

    /// Get a single item row
    pub fn get_item(&self, share_id: &str, item_id: &str) -> Result<Option<ItemRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            &format!(
                "SELECT {} FROM item_records WHERE share_id = ? AND item_id = ?",
                ITEM_COLUMNS
            ),
            params![share_id, item_id],
            item_from_row,
        );

        optional_row(result, "item")
    }

    /// Remove a single item row
    pub fn remove_item(&self, share_id: &str, item_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "DELETE FROM item_records WHERE share_id = ? AND item_id = ?",
                params![share_id, item_id],
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to remove item: {}", e)))?;

        Ok(rows > 0)
    }

    /// Remove all item rows of a user
    pub fn remove_items_for_user(&self, user_id: &str) -> Result<usize> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM item_records WHERE user_id = ?", params![user_id])
            .map_err(|e| Error::DatabaseError(format!("Failed to remove items: {}", e)))
    }

    // ========================================================================
    // SHARE OPERATIONS
    // ========================================================================

    /// Insert or replace a batch of share rows
    pub fn upsert_shares(&self, records: &[ShareRecord]) -> Result<()> {
        let conn = self.conn.lock();

        for record in records {
            conn.execute(
                "INSERT OR REPLACE INTO share_records (
                     user_id, share_id, vault_id, address_id, target_type, target_id,
                     permission, share_role_id, owner, shared, content,
                     content_key_rotation, content_format_version, expire_time,
                     create_time, can_auto_fill)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    record.user_id,
                    record.share_id,
                    record.vault_id,
                    record.address_id,
                    record.target_type,
                    record.target_id,
                    record.permission,
                    record.share_role_id,
                    record.owner,
                    record.shared,
                    record.content,
                    record.content_key_rotation,
                    record.content_format_version,
                    record.expire_time,
                    record.create_time,
                    record.can_auto_fill,
                ],
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to upsert share: {}", e)))?;
        }

        Ok(())
    }

    /// Get all share rows of a user
    pub fn get_shares(&self, user_id: &str) -> Result<Vec<ShareRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM share_records WHERE user_id = ? ORDER BY create_time",
                SHARE_COLUMNS
            ))
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![user_id], share_from_row)
            .map_err(|e| Error::DatabaseError(format!("Failed to query shares: {}", e)))?;

        collect_rows(rows, "share")
    }

    /// Get a single share row
    pub fn get_share(&self, share_id: &str) -> Result<Option<ShareRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            &format!("SELECT {} FROM share_records WHERE share_id = ?", SHARE_COLUMNS),
            params![share_id],
            share_from_row,
        );

        optional_row(result, "share")
    }

    /// Remove a single share row
    pub fn remove_share(&self, share_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM share_records WHERE share_id = ?", params![share_id])
            .map_err(|e| Error::DatabaseError(format!("Failed to remove share: {}", e)))?;

        Ok(rows > 0)
    }

    /// Remove all share rows of a user
    pub fn remove_shares_for_user(&self, user_id: &str) -> Result<usize> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM share_records WHERE user_id = ?", params![user_id])
            .map_err(|e| Error::DatabaseError(format!("Failed to remove shares: {}", e)))
    }

    // ========================================================================
    // ACCESS OPERATIONS
    // ========================================================================

    /// Insert or replace a user's access row
    pub fn upsert_access(&self, record: &AccessRecord) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT OR REPLACE INTO access_records (
                 user_id, plan_type, internal_name, display_name, hide_upgrade,
                 trial_end, vault_limit, alias_limit, totp_limit,
                 monitor_addresses, monitor_aliases, pending_invites,
                 waiting_new_user_invites, min_version_upgrade, default_share_id,
                 alias_sync_enabled, pending_alias_to_sync)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                record.user_id,
                record.plan_type,
                record.internal_name,
                record.display_name,
                record.hide_upgrade,
                record.trial_end,
                record.vault_limit,
                record.alias_limit,
                record.totp_limit,
                record.monitor_addresses,
                record.monitor_aliases,
                record.pending_invites,
                record.waiting_new_user_invites,
                record.min_version_upgrade,
                record.default_share_id,
                record.alias_sync_enabled,
                record.pending_alias_to_sync,
            ],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to upsert access: {}", e)))?;

        Ok(())
    }

    /// Get a user's access row
    pub fn get_access(&self, user_id: &str) -> Result<Option<AccessRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT user_id, plan_type, internal_name, display_name, hide_upgrade,
                    trial_end, vault_limit, alias_limit, totp_limit,
                    monitor_addresses, monitor_aliases, pending_invites,
                    waiting_new_user_invites, min_version_upgrade, default_share_id,
                    alias_sync_enabled, pending_alias_to_sync
             FROM access_records WHERE user_id = ?",
            params![user_id],
            |row| {
                Ok(AccessRecord {
                    user_id: row.get(0)?,
                    plan_type: row.get(1)?,
                    internal_name: row.get(2)?,
                    display_name: row.get(3)?,
                    hide_upgrade: row.get(4)?,
                    trial_end: row.get(5)?,
                    vault_limit: row.get(6)?,
                    alias_limit: row.get(7)?,
                    totp_limit: row.get(8)?,
                    monitor_addresses: row.get(9)?,
                    monitor_aliases: row.get(10)?,
                    pending_invites: row.get(11)?,
                    waiting_new_user_invites: row.get(12)?,
                    min_version_upgrade: row.get(13)?,
                    default_share_id: row.get(14)?,
                    alias_sync_enabled: row.get(15)?,
                    pending_alias_to_sync: row.get(16)?,
                })
            },
        );

        optional_row(result, "access")
    }

    /// Remove a user's access row
    pub fn remove_access(&self, user_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM access_records WHERE user_id = ?", params![user_id])
            .map_err(|e| Error::DatabaseError(format!("Failed to remove access: {}", e)))?;

        Ok(rows > 0)
    }

    // ========================================================================
    // INVITE OPERATIONS
    // ========================================================================

    /// Insert or replace a batch of invite rows
    pub fn upsert_invites(&self, records: &[InviteRecord]) -> Result<()> {
        let conn = self.conn.lock();

        for record in records {
            conn.execute(
                "INSERT OR REPLACE INTO invite_records (
                     user_id, invite_token, inviter_email, invited_email, target_type,
                     vault_name, item_count, member_count, remind_count, create_time)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    record.user_id,
                    record.invite_token,
                    record.inviter_email,
                    record.invited_email,
                    record.target_type,
                    record.vault_name,
                    record.item_count,
                    record.member_count,
                    record.remind_count,
                    record.create_time,
                ],
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to upsert invite: {}", e)))?;
        }

        Ok(())
    }

    /// Get all invite rows of a user, most recent first
    pub fn get_invites(&self, user_id: &str) -> Result<Vec<InviteRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT user_id, invite_token, inviter_email, invited_email, target_type,
                        vault_name, item_count, member_count, remind_count, create_time
                 FROM invite_records WHERE user_id = ? ORDER BY create_time DESC",
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(InviteRecord {
                    user_id: row.get(0)?,
                    invite_token: row.get(1)?,
                    inviter_email: row.get(2)?,
                    invited_email: row.get(3)?,
                    target_type: row.get(4)?,
                    vault_name: row.get(5)?,
                    item_count: row.get(6)?,
                    member_count: row.get(7)?,
                    remind_count: row.get(8)?,
                    create_time: row.get(9)?,
                })
            })
            .map_err(|e| Error::DatabaseError(format!("Failed to query invites: {}", e)))?;

        collect_rows(rows, "invite")
    }

    /// Remove an invite row by token
    pub fn remove_invite(&self, invite_token: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "DELETE FROM invite_records WHERE invite_token = ?",
                params![invite_token],
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to remove invite: {}", e)))?;

        Ok(rows > 0)
    }

    /// Remove all invite rows of a user
    pub fn remove_invites_for_user(&self, user_id: &str) -> Result<usize> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM invite_records WHERE user_id = ?", params![user_id])
            .map_err(|e| Error::DatabaseError(format!("Failed to remove invites: {}", e)))
    }

    // ========================================================================
    // ACCOUNT OPERATIONS
    // ========================================================================

    /// Insert or replace an account row
    pub fn upsert_account(&self, record: &AccountRecord) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT OR REPLACE INTO account_records (user_id, encrypted_data, is_active, update_time)
             VALUES (?, ?, ?, ?)",
            params![
                record.user_id,
                record.encrypted_data,
                record.is_active,
                record.update_time,
            ],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to upsert account: {}", e)))?;

        Ok(())
    }

    /// Get all account rows sorted by `update_time` from least to most
    /// recent (the last one is the latest)
    pub fn get_accounts(&self) -> Result<Vec<AccountRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare(
                "SELECT user_id, encrypted_data, is_active, update_time
                 FROM account_records ORDER BY update_time",
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(AccountRecord {
                    user_id: row.get(0)?,
                    encrypted_data: row.get(1)?,
                    is_active: row.get(2)?,
                    update_time: row.get(3)?,
                })
            })
            .map_err(|e| Error::DatabaseError(format!("Failed to query accounts: {}", e)))?;

        collect_rows(rows, "account")
    }

    /// Mark one account active and every other account inactive, in a
    /// single transaction
    pub fn set_active_account(&self, user_id: &str) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn
            .transaction()
            .map_err(|e| Error::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

        tx.execute("UPDATE account_records SET is_active = 0 WHERE is_active = 1", [])
            .map_err(|e| Error::DatabaseError(format!("Failed to clear active flag: {}", e)))?;
        tx.execute(
            "UPDATE account_records SET is_active = 1 WHERE user_id = ?",
            params![user_id],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to set active flag: {}", e)))?;

        tx.commit()
            .map_err(|e| Error::DatabaseError(format!("Failed to commit transaction: {}", e)))?;

        Ok(())
    }

    /// Remove an account row
    pub fn remove_account(&self, user_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM account_records WHERE user_id = ?", params![user_id])
            .map_err(|e| Error::DatabaseError(format!("Failed to remove account: {}", e)))?;

        Ok(rows > 0)
    }

    /// Remove every account row
    pub fn remove_all_accounts(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM account_records", [])
            .map_err(|e| Error::DatabaseError(format!("Failed to remove accounts: {}", e)))?;

        Ok(())
    }

    // ========================================================================
    // AUTH CREDENTIAL OPERATIONS
    // ========================================================================

    /// Insert or replace an auth credential row
    pub fn upsert_auth_credential(&self, record: &AuthCredentialRecord) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT OR REPLACE INTO auth_credential_records (user_id, module, encrypted_data)
             VALUES (?, ?, ?)",
            params![record.user_id, record.module, record.encrypted_data],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to upsert credential: {}", e)))?;

        Ok(())
    }

    /// Get the auth credential row of a user and module
    pub fn get_auth_credential(
        &self,
        user_id: &str,
        module: &str,
    ) -> Result<Option<AuthCredentialRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT user_id, module, encrypted_data
             FROM auth_credential_records WHERE user_id = ? AND module = ?",
            params![user_id, module],
            |row| {
                Ok(AuthCredentialRecord {
                    user_id: row.get(0)?,
                    module: row.get(1)?,
                    encrypted_data: row.get(2)?,
                })
            },
        );

        optional_row(result, "credential")
    }

    /// Remove the auth credential row of a user and module
    pub fn remove_auth_credential(&self, user_id: &str, module: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "DELETE FROM auth_credential_records WHERE user_id = ? AND module = ?",
                params![user_id, module],
            )
            .map_err(|e| Error::DatabaseError(format!("Failed to remove credential: {}", e)))?;

        Ok(rows > 0)
    }

    /// Remove every auth credential row of a user
    pub fn remove_auth_credentials_for_user(&self, user_id: &str) -> Result<usize> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM auth_credential_records WHERE user_id = ?",
            params![user_id],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to remove credentials: {}", e)))
    }

    // ========================================================================
    // PREFERENCE OPERATIONS
    // ========================================================================

    /// Insert or replace a user's preference row
    pub fn upsert_user_preferences(&self, record: &UserPreferencesRecord) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT OR REPLACE INTO user_preference_records (user_id, encrypted_content)
             VALUES (?, ?)",
            params![record.user_id, record.encrypted_content],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to upsert user preferences: {}", e)))?;

        Ok(())
    }

    /// Get a user's preference row
    pub fn get_user_preferences(&self, user_id: &str) -> Result<Option<UserPreferencesRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT user_id, encrypted_content FROM user_preference_records WHERE user_id = ?",
            params![user_id],
            |row| {
                Ok(UserPreferencesRecord {
                    user_id: row.get(0)?,
                    encrypted_content: row.get(1)?,
                })
            },
        );

        optional_row(result, "user preferences")
    }

    /// Remove a user's preference row
    pub fn remove_user_preferences(&self, user_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute(
                "DELETE FROM user_preference_records WHERE user_id = ?",
                params![user_id],
            )
            .map_err(|e| {
                Error::DatabaseError(format!("Failed to remove user preferences: {}", e))
            })?;

        Ok(rows > 0)
    }

    /// Remove every user preference row
    pub fn remove_all_user_preferences(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute("DELETE FROM user_preference_records", [])
            .map_err(|e| {
                Error::DatabaseError(format!("Failed to remove user preferences: {}", e))
            })?;

        Ok(())
    }

    /// Insert or replace the shared-preference singleton row
    pub fn set_shared_preferences(&self, record: &SharedPreferencesRecord) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT OR REPLACE INTO shared_preference_record (id, encrypted_content)
             VALUES (1, ?)",
            params![record.encrypted_content],
        )
        .map_err(|e| {
            Error::DatabaseError(format!("Failed to set shared preferences: {}", e))
        })?;

        Ok(())
    }

    /// Get the shared-preference singleton row
    pub fn get_shared_preferences(&self) -> Result<Option<SharedPreferencesRecord>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT encrypted_content FROM shared_preference_record WHERE id = 1",
            [],
            |row| {
                Ok(SharedPreferencesRecord {
                    encrypted_content: row.get(0)?,
                })
            },
        );

        optional_row(result, "shared preferences")
    }

    /// Remove the shared-preference singleton row
    pub fn remove_shared_preferences(&self) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM shared_preference_record WHERE id = 1", [])
            .map_err(|e| {
                Error::DatabaseError(format!("Failed to remove shared preferences: {}", e))
            })?;

        Ok(rows > 0)
    }

    // ========================================================================
    // SETTINGS OPERATIONS
    // ========================================================================

    /// Get a setting value
    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT value FROM settings WHERE key = ?",
            params![key],
            |row| row.get(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::DatabaseError(format!("Failed to get setting: {}", e))),
        }
    }

    /// Set a setting value
    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        let now = crate::time::now_timestamp();

        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?, ?, ?)",
            params![key, value, now],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to set setting: {}", e)))?;

        Ok(())
    }

    /// Delete a setting
    pub fn delete_setting(&self, key: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn
            .execute("DELETE FROM settings WHERE key = ?", params![key])
            .map_err(|e| Error::DatabaseError(format!("Failed to delete setting: {}", e)))?;

        Ok(rows > 0)
    }

    // ========================================================================
    // SHARE EVENT CURSOR OPERATIONS
    // ========================================================================

    /// Record the latest processed remote event id for a share
    pub fn upsert_share_event(
        &self,
        user_id: &str,
        share_id: &str,
        last_event_id: &str,
    ) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            "INSERT OR REPLACE INTO share_event_records (user_id, share_id, last_event_id)
             VALUES (?, ?, ?)",
            params![user_id, share_id, last_event_id],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to upsert event cursor: {}", e)))?;

        Ok(())
    }

    /// Get the latest processed remote event id for a share
    pub fn get_share_event(&self, user_id: &str, share_id: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();

        let result = conn.query_row(
            "SELECT last_event_id FROM share_event_records WHERE user_id = ? AND share_id = ?",
            params![user_id, share_id],
            |row| row.get(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::DatabaseError(format!("Failed to get event cursor: {}", e))),
        }
    }

    /// Remove every event cursor of a user
    pub fn remove_share_events_for_user(&self, user_id: &str) -> Result<usize> {
        let conn = self.conn.lock();
        conn.execute(
            "DELETE FROM share_event_records WHERE user_id = ?",
            params![user_id],
        )
        .map_err(|e| Error::DatabaseError(format!("Failed to remove event cursors: {}", e)))
    }
}

// ============================================================================
// ROW MAPPING
// ============================================================================

const ITEM_COLUMNS: &str = "user_id, share_id, item_id, revision, content_format_version, \
                            key_rotation, content, item_key, state, pinned, pin_time, \
                            alias_email, create_time, modify_time, last_use_time, \
                            revision_time, encrypted_content, is_login_item, flags, share_count";

fn item_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ItemRecord> {
    Ok(ItemRecord {
        user_id: row.get(0)?,
        share_id: row.get(1)?,
        item_id: row.get(2)?,
        revision: row.get(3)?,
        content_format_version: row.get(4)?,
        key_rotation: row.get(5)?,
        content: row.get(6)?,
        item_key: row.get(7)?,
        state: row.get(8)?,
        pinned: row.get(9)?,
        pin_time: row.get(10)?,
        alias_email: row.get(11)?,
        create_time: row.get(12)?,
        modify_time: row.get(13)?,
        last_use_time: row.get(14)?,
        revision_time: row.get(15)?,
        encrypted_content: row.get(16)?,
        is_login_item: row.get(17)?,
        flags: row.get(18)?,
        share_count: row.get(19)?,
    })
}

const SHARE_COLUMNS: &str = "user_id, share_id, vault_id, address_id, target_type, target_id, \
                             permission, share_role_id, owner, shared, content, \
                             content_key_rotation, content_format_version, expire_time, \
                             create_time, can_auto_fill";

fn share_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ShareRecord> {
    Ok(ShareRecord {
        user_id: row.get(0)?,
        share_id: row.get(1)?,
        vault_id: row.get(2)?,
        address_id: row.get(3)?,
        target_type: row.get(4)?,
        target_id: row.get(5)?,
        permission: row.get(6)?,
        share_role_id: row.get(7)?,
        owner: row.get(8)?,
        shared: row.get(9)?,
        content: row.get(10)?,
        content_key_rotation: row.get(11)?,
        content_format_version: row.get(12)?,
        expire_time: row.get(13)?,
        create_time: row.get(14)?,
        can_auto_fill: row.get(15)?,
    })
}

fn collect_rows<T>(
    rows: rusqlite::MappedRows<'_, impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>>,
    what: &str,
) -> Result<Vec<T>> {
    let mut records = Vec::new();
    for row in rows {
        records
            .push(row.map_err(|e| Error::DatabaseError(format!("Failed to read {}: {}", what, e)))?);
    }
    Ok(records)
}

fn optional_row<T>(result: rusqlite::Result<T>, what: &str) -> Result<Option<T>> {
    match result {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::DatabaseError(format!("Failed to get {}: {}", what, e))),
    }
}

// ============================================================================
// TESTS
// ============================================================================
