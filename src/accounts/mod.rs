//! # Account Manager
//!
//! Tracks the locally stored user sessions and which of them is the
//! active one.
//!
//! ## Active-Account Bookkeeping
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ACCOUNT MANAGER                                    │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   account_records                    in-memory state                    │
//! │  ┌───────────────────────┐          ┌─────────────────────────┐         │
//! │  │ user-1  [active]      │  set_up  │ profiles: Vec<Profile>  │         │
//! │  │ user-2                │ ───────► │ did_set_up: bool        │         │
//! │  │ user-3                │          └───────────┬─────────────┘         │
//! │  └───────────────────────┘                      │                       │
//! │                                                 ▼                       │
//! │                                      watch streams                      │
//! │                                      • current account (Option)         │
//! │                                      • all accounts (active first)      │
//! │                                                                         │
//! │   Invariant: when any session exists, exactly one row is active;        │
//! │   zero sessions means no pointer. Inconsistencies are surfaced as       │
//! │   typed errors, never silently repaired.                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The manager is a single-owner actor: every operation takes the one
//! state lock for its whole read-modify-persist-publish cycle, so calls
//! against one manager are processed in arrival order. Persistence
//! always completes before the new value is published.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use crate::crypto::SymmetricCodec;
use crate::error::{Error, Result};
use crate::records::{AccountProfile, AccountRecord, AppModule, AuthCredential,
                     AuthCredentialRecord, UserAccount};
use crate::storage::Database;

/// Read-only access to the currently active user id.
///
/// Implemented by [`AccountManager`]; the preferences manager resolves
/// the user scope through this seam instead of holding the whole
/// manager.
pub trait ActiveUserIdProvider: Send + Sync {
    /// The active user id, if any account is active
    fn active_user_id(&self) -> Option<String>;
}

struct State {
    profiles: Vec<AccountProfile>,
    did_set_up: bool,
}

/// Store for local user sessions and the active-account pointer
pub struct AccountManager {
    db: Arc<Database>,
    codec: Arc<SymmetricCodec>,
    /// Single-owner actor state; held across full mutation cycles
    state: Mutex<State>,
    active_tx: watch::Sender<Option<UserAccount>>,
    accounts_tx: watch::Sender<Vec<UserAccount>>,
}

impl AccountManager {
    /// Create a manager over the given database and codec.
    ///
    /// No data is loaded until [`set_up`](Self::set_up) runs.
    pub fn new(db: Arc<Database>, codec: Arc<SymmetricCodec>) -> Self {
        let (active_tx, _) = watch::channel(None);
        let (accounts_tx, _) = watch::channel(Vec::new());
        Self {
            db,
            codec,
            state: Mutex::new(State {
                profiles: Vec::new(),
                did_set_up: false,
            }),
            active_tx,
            accounts_tx,
        }
    }

    /// Load stored sessions and publish the initial values.
    ///
    /// Must run before any other operation.
    pub async fn set_up(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.profiles = self.load_profiles()?;
        state.did_set_up = true;
        self.publish(&state);
        tracing::info!(accounts = state.profiles.len(), "account manager ready");
        Ok(())
    }

    /// Stream of the currently active account
    pub fn current_account(&self) -> watch::Receiver<Option<UserAccount>> {
        self.active_tx.subscribe()
    }

    /// Stream of all stored accounts, active first, then most recent
    pub fn all_accounts(&self) -> watch::Receiver<Vec<UserAccount>> {
        self.accounts_tx.subscribe()
    }

    /// The active account, or `None` when no session is stored.
    ///
    /// Sessions without an active pointer are an invariant violation
    /// and surface as [`Error::AccountsAvailableButNoActiveId`].
    pub async fn get_active_account(&self) -> Result<Option<UserAccount>> {
        let state = self.state.lock().await;
        self.ensure_set_up(&state)?;

        if state.profiles.is_empty() {
            return Ok(None);
        }

        match state.profiles.iter().find(|profile| profile.is_active) {
            Some(profile) => Ok(Some(profile.account.clone())),
            None => Err(Error::AccountsAvailableButNoActiveId),
        }
    }

    /// The active account, required to exist
    pub async fn require_active_account(&self) -> Result<UserAccount> {
        self.get_active_account()
            .await?
            .ok_or(Error::ActiveAccountDataNotFound)
    }

    /// All stored accounts, active first, then most recent
    pub async fn get_all_accounts(&self) -> Result<Vec<UserAccount>> {
        let state = self.state.lock().await;
        self.ensure_set_up(&state)?;
        Ok(ordered_accounts(&state.profiles))
    }

    /// Store (or refresh) a session and make it the active one
    pub async fn upsert_and_mark_active(&self, account: UserAccount) -> Result<()> {
        let mut state = self.state.lock().await;
        self.ensure_set_up(&state)?;

        // Strictly monotonic update times keep the recency order (and
        // the removal fallback) deterministic even when two upserts
        // land in the same clock tick.
        let now = crate::time::now_timestamp_millis();
        let update_time = state
            .profiles
            .iter()
            .map(|profile| profile.update_time)
            .max()
            .map_or(now, |latest| now.max(latest + 1));

        let record = AccountRecord::hydrate(&account, false, update_time, &self.codec)?;
        self.db.upsert_account(&record)?;
        self.db.set_active_account(&account.user_id)?;

        state.profiles = self.load_profiles()?;
        self.publish(&state);
        Ok(())
    }

    /// Switch the active account.
    ///
    /// With `in_memory`, only the published value changes; the stored
    /// pointer stays untouched. Extensions use this to act on behalf of
    /// another account without affecting the host app.
    pub async fn switch_active_account(&self, user_id: &str, in_memory: bool) -> Result<()> {
        let mut state = self.state.lock().await;
        self.ensure_set_up(&state)?;

        if !state.profiles.iter().any(|p| p.account.user_id == user_id) {
            return Err(Error::AccountNotFound(user_id.to_string()));
        }

        if in_memory {
            for profile in &mut state.profiles {
                profile.is_active = profile.account.user_id == user_id;
            }
            self.publish(&state);
            return Ok(());
        }

        self.db.set_active_account(user_id)?;
        state.profiles = self.load_profiles()?;

        if !state.profiles.iter().any(|profile| profile.is_active) {
            return Err(Error::ActiveAccountDataNotFound);
        }

        self.publish(&state);
        Ok(())
    }

    /// Remove a stored session.
    ///
    /// When the active account is removed, the most recently updated
    /// remaining session becomes active; with no sessions left the
    /// pointer clears.
    pub async fn remove_account(&self, user_id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        self.ensure_set_up(&state)?;

        self.db.remove_account(user_id)?;
        state.profiles = self.load_profiles()?;

        if !state.profiles.iter().any(|profile| profile.is_active) {
            // get_accounts returns least recent first, so the last
            // profile is the most recently updated one.
            if let Some(fallback) = state.profiles.last() {
                let fallback_id = fallback.account.user_id.clone();
                tracing::info!(user_id = %fallback_id, "active account removed, switching fallback");
                self.db.set_active_account(&fallback_id)?;
                state.profiles = self.load_profiles()?;
            }
        }

        self.publish(&state);
        Ok(())
    }

    /// Remove every stored session and clear the pointer
    pub async fn clean_all_accounts(&self) -> Result<()> {
        let mut state = self.state.lock().await;

        self.db.remove_all_accounts()?;
        state.profiles.clear();
        self.publish(&state);
        Ok(())
    }

    // ========================================================================
    // AUTH CREDENTIALS
    // ========================================================================

    /// Store or refresh a user's session tokens for one app module.
    ///
    /// Each module keeps its own sealed credential row, so revoking the
    /// autofill extension's session leaves the host app logged in.
    pub async fn upsert_credential(
        &self,
        user_id: &str,
        module: AppModule,
        credential: &AuthCredential,
    ) -> Result<()> {
        let state = self.state.lock().await;
        self.ensure_set_up(&state)?;

        let record = AuthCredentialRecord::hydrate(credential, user_id, module, &self.codec)?;
        self.db.upsert_auth_credential(&record)
    }

    /// The stored session tokens of a user for one app module
    pub async fn get_credential(
        &self,
        user_id: &str,
        module: AppModule,
    ) -> Result<Option<AuthCredential>> {
        let state = self.state.lock().await;
        self.ensure_set_up(&state)?;

        match self.db.get_auth_credential(user_id, module.as_str())? {
            Some(record) => Ok(Some(record.to_domain(module, &self.codec)?)),
            None => Ok(None),
        }
    }

    /// Remove every stored credential of a user, across all modules
    pub async fn remove_credentials(&self, user_id: &str) -> Result<()> {
        let _state = self.state.lock().await;
        let removed = self.db.remove_auth_credentials_for_user(user_id)?;
        tracing::debug!(user_id, removed, "credentials removed");
        Ok(())
    }

    fn load_profiles(&self) -> Result<Vec<AccountProfile>> {
        self.db
            .get_accounts()?
            .iter()
            .map(|record| record.to_domain(&self.codec))
            .collect()
    }

    fn publish(&self, state: &State) {
        let active = state
            .profiles
            .iter()
            .find(|profile| profile.is_active)
            .map(|profile| profile.account.clone());
        self.active_tx.send_replace(active);
        self.accounts_tx.send_replace(ordered_accounts(&state.profiles));
    }

    fn ensure_set_up(&self, state: &State) -> Result<()> {
        if !state.did_set_up {
            tracing::error!("account manager used before set_up()");
            return Err(Error::NotInitialized);
        }
        Ok(())
    }
}

impl ActiveUserIdProvider for AccountManager {
    fn active_user_id(&self) -> Option<String> {
        self.active_tx
            .borrow()
            .as_ref()
            .map(|account| account.user_id.clone())
    }
}

/// Active account first, then by recency of their last update
fn ordered_accounts(profiles: &[AccountProfile]) -> Vec<UserAccount> {
    let mut sorted: Vec<&AccountProfile> = profiles.iter().collect();
    sorted.sort_by(|a, b| {
        b.is_active
            .cmp(&a.is_active)
            .then(b.update_time.cmp(&a.update_time))
    });
    sorted.into_iter().map(|profile| profile.account.clone()).collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn account(user_id: &str) -> UserAccount {
        UserAccount {
            user_id: user_id.to_string(),
            email: format!("{}@example.com", user_id),
            display_name: user_id.to_string(),
            recovery_email: None,
        }
    }

    async fn manager() -> AccountManager {
        let db = Arc::new(Database::open(None).await.unwrap());
        let codec = Arc::new(SymmetricCodec::from_master_seed(&[44u8; 32]).unwrap());
        AccountManager::new(db, codec)
    }

    #[tokio::test]
    async fn test_set_up_with_empty_store() {
        let manager = manager().await;
        manager.set_up().await.unwrap();

        assert_eq!(manager.get_active_account().await.unwrap(), None);
        assert!(manager.get_all_accounts().await.unwrap().is_empty());
        assert_eq!(manager.active_user_id(), None);
        assert!(matches!(
            manager.require_active_account().await,
            Err(Error::ActiveAccountDataNotFound)
        ));
    }

    #[tokio::test]
    async fn test_use_before_set_up_errors() {
        let manager = manager().await;
        assert!(matches!(
            manager.get_active_account().await,
            Err(Error::NotInitialized)
        ));
        assert!(matches!(
            manager.switch_active_account("user-1", false).await,
            Err(Error::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_upsert_and_mark_active_publishes() {
        let manager = manager().await;
        manager.set_up().await.unwrap();

        let current = manager.current_account();
        manager.upsert_and_mark_active(account("user-1")).await.unwrap();

        assert_eq!(manager.active_user_id(), Some("user-1".to_string()));
        assert_eq!(current.borrow().as_ref().unwrap().user_id, "user-1");
        assert_eq!(
            manager.get_active_account().await.unwrap().unwrap().user_id,
            "user-1"
        );
    }

    #[tokio::test]
    async fn test_switch_to_unknown_account_fails() {
        let manager = manager().await;
        manager.set_up().await.unwrap();
        manager.upsert_and_mark_active(account("user-1")).await.unwrap();

        match manager.switch_active_account("ghost", false).await {
            Err(Error::AccountNotFound(id)) => assert_eq!(id, "ghost"),
            other => panic!("expected AccountNotFound, got {:?}", other),
        }
        // The pointer is untouched.
        assert_eq!(manager.active_user_id(), Some("user-1".to_string()));
    }

    #[tokio::test]
    async fn test_in_memory_switch_does_not_persist() {
        let db = Arc::new(Database::open(None).await.unwrap());
        let codec = Arc::new(SymmetricCodec::from_master_seed(&[44u8; 32]).unwrap());
        let manager = AccountManager::new(Arc::clone(&db), codec);
        manager.set_up().await.unwrap();

        manager.upsert_and_mark_active(account("user-1")).await.unwrap();
        manager.upsert_and_mark_active(account("user-2")).await.unwrap();

        manager.switch_active_account("user-1", true).await.unwrap();
        assert_eq!(manager.active_user_id(), Some("user-1".to_string()));

        // The database still has user-2 active.
        let stored_active: Vec<String> = db
            .get_accounts()
            .unwrap()
            .into_iter()
            .filter(|record| record.is_active)
            .map(|record| record.user_id)
            .collect();
        assert_eq!(stored_active, vec!["user-2".to_string()]);
    }

    #[tokio::test]
    async fn test_remove_active_account_falls_back() {
        let manager = manager().await;
        manager.set_up().await.unwrap();

        manager.upsert_and_mark_active(account("user-1")).await.unwrap();
        manager.upsert_and_mark_active(account("user-2")).await.unwrap();
        manager.switch_active_account("user-1", false).await.unwrap();

        manager.remove_account("user-1").await.unwrap();

        // The most recently updated remaining session becomes active.
        assert_eq!(manager.active_user_id(), Some("user-2".to_string()));
    }

    #[tokio::test]
    async fn test_remove_non_active_account_keeps_pointer() {
        let manager = manager().await;
        manager.set_up().await.unwrap();

        manager.upsert_and_mark_active(account("user-1")).await.unwrap();
        manager.upsert_and_mark_active(account("user-2")).await.unwrap();

        manager.remove_account("user-1").await.unwrap();
        assert_eq!(manager.active_user_id(), Some("user-2".to_string()));
    }

    #[tokio::test]
    async fn test_remove_last_account_clears_pointer() {
        let manager = manager().await;
        manager.set_up().await.unwrap();

        manager.upsert_and_mark_active(account("user-1")).await.unwrap();
        manager.remove_account("user-1").await.unwrap();

        assert_eq!(manager.active_user_id(), None);
        assert_eq!(manager.get_active_account().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sessions_without_pointer_surface_inconsistency() {
        let db = Arc::new(Database::open(None).await.unwrap());
        let codec = Arc::new(SymmetricCodec::from_master_seed(&[44u8; 32]).unwrap());

        // Seed a session row with no active flag, bypassing the manager.
        let record = AccountRecord::hydrate(&account("user-1"), false, 1700000000, &codec).unwrap();
        db.upsert_account(&record).unwrap();

        let manager = AccountManager::new(db, codec);
        manager.set_up().await.unwrap();

        assert!(matches!(
            manager.get_active_account().await,
            Err(Error::AccountsAvailableButNoActiveId)
        ));
    }

    #[tokio::test]
    async fn test_clean_all_accounts() {
        let manager = manager().await;
        manager.set_up().await.unwrap();

        manager.upsert_and_mark_active(account("user-1")).await.unwrap();
        manager.clean_all_accounts().await.unwrap();

        assert_eq!(manager.active_user_id(), None);
        assert!(manager.get_all_accounts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_credentials_per_module() {
        let manager = manager().await;
        manager.set_up().await.unwrap();
        manager.upsert_and_mark_active(account("user-1")).await.unwrap();

        let credential = AuthCredential {
            session_id: "sess-1".into(),
            access_token: "at".into(),
            refresh_token: "rt".into(),
            expires_at: None,
        };
        manager
            .upsert_credential("user-1", AppModule::HostApp, &credential)
            .await
            .unwrap();

        assert_eq!(
            manager
                .get_credential("user-1", AppModule::HostApp)
                .await
                .unwrap(),
            Some(credential)
        );
        // The autofill module has its own session slot.
        assert_eq!(
            manager
                .get_credential("user-1", AppModule::AutoFill)
                .await
                .unwrap(),
            None
        );

        manager.remove_credentials("user-1").await.unwrap();
        assert_eq!(
            manager
                .get_credential("user-1", AppModule::HostApp)
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_credential_refresh_replaces_row() {
        let manager = manager().await;
        manager.set_up().await.unwrap();

        let mut credential = AuthCredential {
            session_id: "sess-1".into(),
            access_token: "old".into(),
            refresh_token: "rt".into(),
            expires_at: Some(1700000000),
        };
        manager
            .upsert_credential("user-1", AppModule::ShareExtension, &credential)
            .await
            .unwrap();

        credential.access_token = "new".into();
        credential.expires_at = Some(1700003600);
        manager
            .upsert_credential("user-1", AppModule::ShareExtension, &credential)
            .await
            .unwrap();

        assert_eq!(
            manager
                .get_credential("user-1", AppModule::ShareExtension)
                .await
                .unwrap(),
            Some(credential)
        );
    }

    #[tokio::test]
    async fn test_all_accounts_ordering() {
        let manager = manager().await;
        manager.set_up().await.unwrap();

        manager.upsert_and_mark_active(account("user-1")).await.unwrap();
        manager.upsert_and_mark_active(account("user-2")).await.unwrap();
        manager.upsert_and_mark_active(account("user-3")).await.unwrap();
        manager.switch_active_account("user-1", false).await.unwrap();

        let ids: Vec<String> = manager
            .get_all_accounts()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.user_id)
            .collect();

        // Active first, then most recently updated.
        assert_eq!(ids, vec!["user-1", "user-3", "user-2"]);
    }
}
