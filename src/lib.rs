//! # Sanctum Core
//!
//! The storage and state core of the Sanctum password manager:
//! encrypted local persistence of items, shares, accounts, and
//! preferences, plus the bookkeeping stores the mobile and desktop
//! shells build their UI on.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        SANCTUM CORE MODULES                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────┐  ┌──────────────┐  ┌──────────────┐                    │
//! │  │  Accounts   │  │ Preferences  │  │  Migrations  │                    │
//! │  │             │  │              │  │              │                    │
//! │  │ - Sessions  │  │ - App scope  │  │ - Bitmask    │                    │
//! │  │ - Active    │  │ - Shared     │  │   ledger     │                    │
//! │  │   pointer   │  │ - Per-user   │  │ - At most    │                    │
//! │  │ - Streams   │  │ - Streams    │  │   once       │                    │
//! │  └──────┬──────┘  └──────┬───────┘  └──────┬───────┘                    │
//! │         │                │                 │                            │
//! │         └────────────────┴────────┬────────┘                            │
//! │                                   │                                     │
//! │  ┌─────────────┐  ┌───────────────▼──────────────────────────────────┐  │
//! │  │   Crypto    │  │                 Storage                          │  │
//! │  │             │  │                                                  │  │
//! │  │ - AES-GCM   │◄─┤  Records (mappers) ⇄ Database (SQLite rows)      │  │
//! │  │ - HKDF      │  │  sentinel scalars  |  sealed blobs               │  │
//! │  │ - Codec     │  │                                                  │  │
//! │  └─────────────┘  └──────────────────────────────────────────────────┘  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`crypto`] - Storage-key derivation and the symmetric record codec
//! - [`records`] - Entity mappers between rows and domain structs
//! - [`storage`] - SQLite persistence of record rows
//! - [`migrations`] - One-time data migration ledger
//! - [`accounts`] - Stored sessions and the active-account pointer
//! - [`preferences`] - App / shared / user preference scopes
//!
//! ## Security Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          SECURITY LAYERS                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Layer 1: Server-Side Encryption (out of scope here)                    │
//! │  ───────────────────────────────────────────────────                    │
//! │  Item and vault payloads arrive already encrypted under vault keys      │
//! │  managed by the sharing layer; this crate stores them opaquely.         │
//! │                                                                         │
//! │  Layer 2: Local Storage Encryption (AES-256-GCM)                        │
//! │  ───────────────────────────────────────────────                        │
//! │  Sessions, credentials, and sensitive preferences are sealed under      │
//! │  a storage key derived from the master seed in the platform             │
//! │  keystore. Decrypting with the wrong key fails closed.                  │
//! │                                                                         │
//! │  Layer 3: Row Binding (AAD)                                             │
//! │  ──────────────────────────                                             │
//! │  Every sealed blob authenticates its owning row, so ciphertext          │
//! │  moved between rows or users fails authentication.                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod accounts;
pub mod crypto;
pub mod error;
pub mod migrations;
pub mod preferences;
pub mod records;
pub mod storage;
/// Time utilities for record timestamps.
pub mod time;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use accounts::{AccountManager, ActiveUserIdProvider};
pub use crypto::SymmetricCodec;
pub use error::{Error, Result};
pub use migrations::{DataMigration, MigrationLedger};
pub use preferences::PreferencesManager;
pub use storage::{Database, DatabaseConfig};

// ============================================================================
// CORE FACADE
// ============================================================================

use std::sync::Arc;

/// Configuration for bootstrapping Sanctum Core
#[derive(Clone)]
pub struct CoreConfig {
    /// Master seed from the platform keystore; the storage key derives
    /// from it
    pub master_seed: [u8; 32],
    /// Path to the database file (None for in-memory)
    pub database_path: Option<String>,
}

/// The assembled core: database, codec, and the three stores.
///
/// ## Lifecycle
///
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       SANCTUM CORE LIFECYCLE                            │
/// ├─────────────────────────────────────────────────────────────────────────┤
/// │                                                                         │
/// │  1. bootstrap(config)   derive storage key, open database,             │
/// │                         wire the managers                              │
/// │            │                                                            │
/// │            ▼                                                            │
/// │  2. set_up()            load sessions, load-or-create preference       │
/// │                         scopes, report pending data migrations         │
/// │            │                                                            │
/// │            ▼                                                            │
/// │  3. Ready               UI layers subscribe to the managers'           │
/// │                         streams and drive their operations             │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub struct SanctumCore {
    db: Arc<Database>,
    accounts: Arc<AccountManager>,
    preferences: Arc<PreferencesManager>,
    migrations: Arc<MigrationLedger>,
}

impl SanctumCore {
    /// Derive the storage key, open the database, and wire the stores.
    ///
    /// Nothing is loaded yet; call [`set_up`](Self::set_up) next.
    pub async fn bootstrap(config: CoreConfig) -> Result<Self> {
        tracing::info!("Bootstrapping Sanctum Core v{}", env!("CARGO_PKG_VERSION"));

        let codec = Arc::new(SymmetricCodec::from_master_seed(&config.master_seed)?);
        let db = Arc::new(
            storage::init(DatabaseConfig {
                path: config.database_path.clone(),
            })
            .await?,
        );

        let accounts = Arc::new(AccountManager::new(Arc::clone(&db), Arc::clone(&codec)));
        let preferences = Arc::new(PreferencesManager::new(
            Arc::clone(&db),
            Arc::clone(&codec),
            Arc::clone(&accounts) as Arc<dyn ActiveUserIdProvider>,
        ));
        let migrations = Arc::new(MigrationLedger::new(Arc::clone(&db)));

        Ok(Self {
            db,
            accounts,
            preferences,
            migrations,
        })
    }

    /// Run the stores' `set_up` in dependency order and report pending
    /// data migrations.
    pub async fn set_up(&self) -> Result<()> {
        self.accounts.set_up().await?;
        self.preferences.set_up().await?;

        let missing = self.migrations.missing_migrations(DataMigration::ALL).await?;
        if missing.is_empty() {
            tracing::debug!("no pending data migrations");
        } else {
            tracing::info!(?missing, "pending data migrations");
        }

        tracing::info!("Sanctum Core ready");
        Ok(())
    }

    /// Log an account out: wipe its local records and credentials, drop
    /// its session, and fall back to the next stored account.
    ///
    /// Returns `true` when this was the last account, so the shell can
    /// route back to its welcome flow.
    pub async fn log_out_account(&self, user_id: &str) -> Result<bool> {
        let known = self.accounts.get_all_accounts().await?;
        if !known.iter().any(|account| account.user_id == user_id) {
            return Err(Error::AccountNotFound(user_id.to_string()));
        }
        tracing::info!(user_id, "logging out account");

        self.db.remove_items_for_user(user_id)?;
        self.db.remove_shares_for_user(user_id)?;
        self.db.remove_access(user_id)?;
        self.db.remove_invites_for_user(user_id)?;
        self.db.remove_share_events_for_user(user_id)?;
        self.db.remove_user_preferences(user_id)?;
        self.accounts.remove_credentials(user_id).await?;

        // The account manager repoints the active session; the user
        // preference scope follows it.
        self.accounts.remove_account(user_id).await?;
        self.preferences.reload_user_preferences().await?;

        Ok(self.accounts.get_all_accounts().await?.is_empty())
    }

    /// The account store
    pub fn accounts(&self) -> &Arc<AccountManager> {
        &self.accounts
    }

    /// The preferences store
    pub fn preferences(&self) -> &Arc<PreferencesManager> {
        &self.preferences
    }

    /// The migration ledger
    pub fn migrations(&self) -> &Arc<MigrationLedger> {
        &self.migrations
    }

    /// The underlying database handle
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }
}

// ============================================================================
// VERSION INFO
// ============================================================================

/// Returns the version of Sanctum Core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{AppModule, AppPreferencesUpdate, AuthCredential, EncryptedItem, Item,
                         ItemRecord, UserAccount, UserPreferencesUpdate};

    fn config() -> CoreConfig {
        CoreConfig {
            master_seed: [77u8; 32],
            database_path: None,
        }
    }

    fn account(user_id: &str) -> UserAccount {
        UserAccount {
            user_id: user_id.to_string(),
            email: format!("{}@example.com", user_id),
            display_name: user_id.to_string(),
            recovery_email: None,
        }
    }

    fn item_record(user_id: &str, share_id: &str, item_id: &str) -> ItemRecord {
        ItemRecord::hydrate(&EncryptedItem {
            share_id: share_id.into(),
            user_id: user_id.into(),
            item: Item {
                item_id: item_id.into(),
                revision: 1,
                content_format_version: 1,
                key_rotation: 1,
                content: "c2VydmVy".into(),
                item_key: None,
                state: 0,
                pinned: false,
                pin_time: None,
                alias_email: None,
                create_time: 1700000000,
                modify_time: 1700000000,
                last_use_time: None,
                revision_time: 1700000000,
                flags: 0,
                share_count: 0,
            },
            encrypted_content: "bG9jYWw=".into(),
            is_login_item: true,
        })
    }

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[tokio::test]
    async fn test_bootstrap_and_set_up() {
        let core = SanctumCore::bootstrap(config()).await.unwrap();
        core.set_up().await.unwrap();

        assert_eq!(core.accounts().get_active_account().await.unwrap(), None);
        assert!(core.preferences().app_preferences().borrow().is_some());
        assert!(!core
            .migrations()
            .has_migration_occurred(DataMigration::UserAppDataSeparation)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_login_flow_wires_user_scope() {
        let core = SanctumCore::bootstrap(config()).await.unwrap();
        core.set_up().await.unwrap();

        // No user scope while logged out.
        assert!(core.preferences().user_preferences().borrow().is_none());

        core.accounts()
            .upsert_and_mark_active(account("user-1"))
            .await
            .unwrap();
        core.preferences().reload_user_preferences().await.unwrap();

        assert!(core.preferences().user_preferences().borrow().is_some());
        core.preferences()
            .update_app_preferences(AppPreferencesUpdate::Onboarded(true))
            .await
            .unwrap();
        assert!(core
            .preferences()
            .app_preferences()
            .borrow()
            .as_ref()
            .unwrap()
            .onboarded);
    }

    #[tokio::test]
    async fn test_log_out_account_wipes_local_data() {
        let core = SanctumCore::bootstrap(config()).await.unwrap();
        core.set_up().await.unwrap();

        core.accounts().upsert_and_mark_active(account("user-1")).await.unwrap();
        core.accounts().upsert_and_mark_active(account("user-2")).await.unwrap();
        core.accounts().switch_active_account("user-1", false).await.unwrap();
        core.preferences().reload_user_preferences().await.unwrap();

        core.database()
            .upsert_items(&[item_record("user-1", "share-1", "item-1")])
            .unwrap();
        core.database()
            .upsert_share_event("user-1", "share-1", "evt-5")
            .unwrap();
        core.accounts()
            .upsert_credential(
                "user-1",
                AppModule::HostApp,
                &AuthCredential {
                    session_id: "sess-1".into(),
                    access_token: "at".into(),
                    refresh_token: "rt".into(),
                    expires_at: None,
                },
            )
            .await
            .unwrap();
        core.preferences()
            .update_user_preferences(UserPreferencesUpdate::SpotlightEnabled(true))
            .await
            .unwrap();

        let last = core.log_out_account("user-1").await.unwrap();
        assert!(!last);

        // Every user-1 record is gone and user-2 took over.
        assert!(core.database().get_items("user-1").unwrap().is_empty());
        assert!(core.database().get_share_event("user-1", "share-1").unwrap().is_none());
        assert!(core
            .database()
            .get_auth_credential("user-1", AppModule::HostApp.as_str())
            .unwrap()
            .is_none());
        assert!(core.database().get_user_preferences("user-1").unwrap().is_none());
        assert_eq!(
            core.accounts().get_active_account().await.unwrap().unwrap().user_id,
            "user-2"
        );
        // The user scope now tracks user-2, back at defaults.
        assert!(!core
            .preferences()
            .user_preferences()
            .borrow()
            .as_ref()
            .unwrap()
            .spotlight_enabled);

        // Logging out the last account reports it.
        assert!(core.log_out_account("user-2").await.unwrap());
        assert_eq!(core.accounts().get_active_account().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_log_out_unknown_account_fails() {
        let core = SanctumCore::bootstrap(config()).await.unwrap();
        core.set_up().await.unwrap();

        assert!(matches!(
            core.log_out_account("ghost").await,
            Err(Error::AccountNotFound(_))
        ));
    }
}
