//! # Data Migrations
//!
//! One-time data-shape migrations are tracked in a single integer
//! bitmask so each runs at most once per installation.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       MIGRATION BITMASK                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   settings["migration_state"] = "...0  1  0  1  1"                      │
//! │                                     │  │  │  │  │                       │
//! │                                     │  │  │  │  └─ bit 0: ran           │
//! │                                     │  │  │  └──── bit 1: ran           │
//! │                                     │  │  └─────── bit 2: not yet       │
//! │                                     │  └────────── bit 3: ran           │
//! │                                     └───────────── bit 4: not yet       │
//! │                                                                         │
//! │   Bits are assigned append-only and never reused for a different        │
//! │   meaning, so an app update can never misread an old installation       │
//! │   as already migrated.                                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Read-modify-write on the mask is not atomic at the storage level, so
//! every mutation goes through one ledger-owned lock: at most one RMW
//! cycle is in flight at any time.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::storage::Database;

/// Settings key holding the bitmask
pub const MIGRATION_STATE_KEY: &str = "migration_state";

/// One-time data migrations.
///
/// Bit values are append-only. A retired migration keeps its bit
/// reserved forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum DataMigration {
    /// Split device-level state out of the per-user store
    UserAppDataSeparation = 1 << 0,
    /// Re-seal autofill credentials under the per-module AAD
    CredentialsForAutoFill = 1 << 1,
    /// Re-seal share-extension credentials under the per-module AAD
    CredentialsForShareExtension = 1 << 2,
    /// Re-pull item flags after the v2 schema migration
    ItemFlagsResync = 1 << 3,
    /// Rebuild the OS search index from local items
    SearchIndexRebuild = 1 << 4,
}

impl DataMigration {
    /// Every known migration, in bit order
    pub const ALL: &'static [DataMigration] = &[
        DataMigration::UserAppDataSeparation,
        DataMigration::CredentialsForAutoFill,
        DataMigration::CredentialsForShareExtension,
        DataMigration::ItemFlagsResync,
        DataMigration::SearchIndexRebuild,
    ];

    /// The migration's bit in the mask
    pub fn bit(self) -> u64 {
        self as u64
    }
}

/// Tracks which one-time migrations have run.
///
/// All mutations are serialized through a single owner lock so two
/// concurrent `add_migration` calls cannot lose each other's bit.
pub struct MigrationLedger {
    db: Arc<Database>,
    /// Guards the load-modify-store cycle on the mask
    lock: Mutex<()>,
}

impl MigrationLedger {
    /// Create a ledger over the given database
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            lock: Mutex::new(()),
        }
    }

    /// Mark a migration as having run
    pub async fn add_migration(&self, migration: DataMigration) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mask = self.load_mask()?;
        self.store_mask(mask | migration.bit())?;
        tracing::info!(?migration, "migration recorded");
        Ok(())
    }

    /// Whether a migration has run
    pub async fn has_migration_occurred(&self, migration: DataMigration) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mask = self.load_mask()?;
        Ok(mask & migration.bit() == migration.bit())
    }

    /// Filter candidates down to those that have not run, preserving
    /// input order
    pub async fn missing_migrations(
        &self,
        candidates: &[DataMigration],
    ) -> Result<Vec<DataMigration>> {
        let _guard = self.lock.lock().await;
        let mask = self.load_mask()?;
        Ok(candidates
            .iter()
            .copied()
            .filter(|migration| mask & migration.bit() != migration.bit())
            .collect())
    }

    /// Clear a migration's bit. QA rollback only, not part of normal
    /// operation.
    pub async fn revert_migration(&self, migration: DataMigration) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mask = self.load_mask()?;
        self.store_mask(mask & !migration.bit())?;
        tracing::warn!(?migration, "migration reverted");
        Ok(())
    }

    fn load_mask(&self) -> Result<u64> {
        match self.db.get_setting(MIGRATION_STATE_KEY)? {
            Some(value) => value.parse::<u64>().map_err(|_| Error::Corrupted {
                entity: "settings",
                field: MIGRATION_STATE_KEY,
            }),
            None => Ok(0),
        }
    }

    fn store_mask(&self, mask: u64) -> Result<()> {
        self.db.set_setting(MIGRATION_STATE_KEY, &mask.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn ledger() -> MigrationLedger {
        let db = Arc::new(Database::open(None).await.unwrap());
        MigrationLedger::new(db)
    }

    #[tokio::test]
    async fn test_add_and_check() {
        let ledger = ledger().await;

        assert!(!ledger
            .has_migration_occurred(DataMigration::UserAppDataSeparation)
            .await
            .unwrap());

        ledger
            .add_migration(DataMigration::UserAppDataSeparation)
            .await
            .unwrap();

        assert!(ledger
            .has_migration_occurred(DataMigration::UserAppDataSeparation)
            .await
            .unwrap());
        assert!(!ledger
            .has_migration_occurred(DataMigration::CredentialsForAutoFill)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_add_is_idempotent() {
        let ledger = ledger().await;

        ledger.add_migration(DataMigration::ItemFlagsResync).await.unwrap();
        ledger.add_migration(DataMigration::ItemFlagsResync).await.unwrap();

        assert!(ledger
            .has_migration_occurred(DataMigration::ItemFlagsResync)
            .await
            .unwrap());
        // No other bit was touched.
        assert!(!ledger
            .has_migration_occurred(DataMigration::SearchIndexRebuild)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_revert_leaves_other_bits() {
        let ledger = ledger().await;

        ledger.add_migration(DataMigration::CredentialsForAutoFill).await.unwrap();
        ledger
            .add_migration(DataMigration::CredentialsForShareExtension)
            .await
            .unwrap();

        ledger
            .revert_migration(DataMigration::CredentialsForAutoFill)
            .await
            .unwrap();

        assert!(!ledger
            .has_migration_occurred(DataMigration::CredentialsForAutoFill)
            .await
            .unwrap());
        assert!(ledger
            .has_migration_occurred(DataMigration::CredentialsForShareExtension)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_missing_migrations_preserves_order() {
        let ledger = ledger().await;

        ledger
            .add_migration(DataMigration::UserAppDataSeparation)
            .await
            .unwrap();

        let missing = ledger
            .missing_migrations(&[
                DataMigration::UserAppDataSeparation,
                DataMigration::CredentialsForAutoFill,
                DataMigration::SearchIndexRebuild,
            ])
            .await
            .unwrap();

        assert_eq!(
            missing,
            vec![
                DataMigration::CredentialsForAutoFill,
                DataMigration::SearchIndexRebuild,
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_adds_do_not_lose_bits() {
        let ledger = Arc::new(ledger().await);

        let a = {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move {
                ledger.add_migration(DataMigration::ItemFlagsResync).await
            })
        };
        let b = {
            let ledger = Arc::clone(&ledger);
            tokio::spawn(async move {
                ledger.add_migration(DataMigration::SearchIndexRebuild).await
            })
        };

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        assert!(ledger
            .has_migration_occurred(DataMigration::ItemFlagsResync)
            .await
            .unwrap());
        assert!(ledger
            .has_migration_occurred(DataMigration::SearchIndexRebuild)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_malformed_mask_is_corrupted() {
        let db = Arc::new(Database::open(None).await.unwrap());
        db.set_setting(MIGRATION_STATE_KEY, "not a number").unwrap();

        let ledger = MigrationLedger::new(db);
        assert!(matches!(
            ledger
                .has_migration_occurred(DataMigration::UserAppDataSeparation)
                .await,
            Err(Error::Corrupted { field: MIGRATION_STATE_KEY, .. })
        ));
    }
}
