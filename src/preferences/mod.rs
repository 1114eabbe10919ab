//! # Preferences Manager
//!
//! One manager, three preference scopes with independent lifecycles.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      PREFERENCES MANAGER                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   Scope     Backing                            Contents                 │
//! │  ───────────────────────────────────────────────────────────────        │
//! │   app       settings KV cell (plain JSON)      onboarding, counters     │
//! │   shared    sealed singleton row               lock method, PIN, theme  │
//! │   user      sealed row per user id             spotlight, extra pwd     │
//! │                                                                         │
//! │   Per scope:                                                            │
//! │   • set_up()   load persisted value, or write + publish the default     │
//! │   • update(u)  copy, persist, publish value, publish field event        │
//! │   • remove()   delete persisted value (in-memory value stays until      │
//! │                a fresh set_up)                                          │
//! │                                                                         │
//! │   Streams per scope:                                                    │
//! │   • watch     current full value (None before set_up)                   │
//! │   • broadcast field-level change events                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! State machine per scope: `Uninitialized → set_up → Ready`. Every
//! `update` against an uninitialized scope fails with `NotInitialized`
//! and writes nothing; there is no way back to `Uninitialized` short of
//! a process restart.
//!
//! The manager is a single-owner actor: one state lock held across each
//! full copy-persist-publish cycle, so updates are applied in arrival
//! order and persistence always precedes publication.

use std::sync::Arc;

use tokio::sync::{broadcast, watch, Mutex};

use crate::accounts::ActiveUserIdProvider;
use crate::crypto::SymmetricCodec;
use crate::error::{Error, Result};
use crate::records::{AppPreferences, AppPreferencesUpdate, SharedPreferences,
                     SharedPreferencesRecord, SharedPreferencesUpdate, UserPreferences,
                     UserPreferencesRecord, UserPreferencesUpdate};
use crate::storage::Database;

/// Settings key holding the app-scope preferences JSON
pub const APP_PREFERENCES_KEY: &str = "app_preferences";

/// Capacity of the field-event broadcast channels
const EVENT_CHANNEL_SIZE: usize = 256;

struct State {
    app: Option<AppPreferences>,
    shared: Option<SharedPreferences>,
    /// The loaded user scope and the user id it belongs to
    user: Option<(String, UserPreferences)>,
}

/// Store for the three preference scopes
pub struct PreferencesManager {
    db: Arc<Database>,
    codec: Arc<SymmetricCodec>,
    user_id_provider: Arc<dyn ActiveUserIdProvider>,
    /// Single-owner actor state; held across full mutation cycles
    state: Mutex<State>,

    app_tx: watch::Sender<Option<AppPreferences>>,
    app_events: broadcast::Sender<AppPreferencesUpdate>,
    shared_tx: watch::Sender<Option<SharedPreferences>>,
    shared_events: broadcast::Sender<SharedPreferencesUpdate>,
    user_tx: watch::Sender<Option<UserPreferences>>,
    user_events: broadcast::Sender<UserPreferencesUpdate>,
}

impl PreferencesManager {
    /// Create a manager over the given database and codec.
    ///
    /// No scope is loaded until [`set_up`](Self::set_up) runs.
    pub fn new(
        db: Arc<Database>,
        codec: Arc<SymmetricCodec>,
        user_id_provider: Arc<dyn ActiveUserIdProvider>,
    ) -> Self {
        let (app_tx, _) = watch::channel(None);
        let (shared_tx, _) = watch::channel(None);
        let (user_tx, _) = watch::channel(None);
        let (app_events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (shared_events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        let (user_events, _) = broadcast::channel(EVENT_CHANNEL_SIZE);

        Self {
            db,
            codec,
            user_id_provider,
            state: Mutex::new(State {
                app: None,
                shared: None,
                user: None,
            }),
            app_tx,
            app_events,
            shared_tx,
            shared_events,
            user_tx,
            user_events,
        }
    }

    /// Load every scope, creating persisted defaults on first access.
    ///
    /// The user scope is only loaded when an active user id exists;
    /// after a login or account switch, call
    /// [`reload_user_preferences`](Self::reload_user_preferences).
    pub async fn set_up(&self) -> Result<()> {
        let mut state = self.state.lock().await;

        state.app = Some(self.load_or_create_app()?);
        self.app_tx.send_replace(state.app.clone());

        state.shared = Some(self.load_or_create_shared()?);
        self.shared_tx.send_replace(state.shared.clone());

        if let Some(user_id) = self.user_id_provider.active_user_id() {
            let preferences = self.load_or_create_user(&user_id)?;
            state.user = Some((user_id, preferences));
        }
        self.user_tx.send_replace(state.user.as_ref().map(|(_, p)| p.clone()));

        tracing::info!("preferences manager ready");
        Ok(())
    }

    // ========================================================================
    // APP SCOPE
    // ========================================================================

    /// Stream of the current app preferences
    pub fn app_preferences(&self) -> watch::Receiver<Option<AppPreferences>> {
        self.app_tx.subscribe()
    }

    /// Stream of app-scope field changes
    pub fn app_preference_events(&self) -> broadcast::Receiver<AppPreferencesUpdate> {
        self.app_events.subscribe()
    }

    /// Apply a field update to the app scope
    pub async fn update_app_preferences(&self, update: AppPreferencesUpdate) -> Result<()> {
        let mut state = self.state.lock().await;
        let mut preferences = match &state.app {
            Some(preferences) => preferences.clone(),
            None => {
                tracing::error!("app preferences updated before set_up()");
                return Err(Error::NotInitialized);
            }
        };

        update.apply(&mut preferences);
        self.db
            .set_setting(APP_PREFERENCES_KEY, &serde_json::to_string(&preferences)?)?;

        state.app = Some(preferences);
        self.app_tx.send_replace(state.app.clone());
        let _ = self.app_events.send(update);
        Ok(())
    }

    /// Delete the persisted app scope.
    ///
    /// The published in-memory value intentionally keeps its last state
    /// until a fresh `set_up`.
    pub async fn remove_app_preferences(&self) -> Result<()> {
        let _state = self.state.lock().await;
        self.db.delete_setting(APP_PREFERENCES_KEY)?;
        Ok(())
    }

    // ========================================================================
    // SHARED SCOPE
    // ========================================================================

    /// Stream of the current shared preferences
    pub fn shared_preferences(&self) -> watch::Receiver<Option<SharedPreferences>> {
        self.shared_tx.subscribe()
    }

    /// Stream of shared-scope field changes
    pub fn shared_preference_events(&self) -> broadcast::Receiver<SharedPreferencesUpdate> {
        self.shared_events.subscribe()
    }

    /// Apply a field update to the shared scope
    pub async fn update_shared_preferences(&self, update: SharedPreferencesUpdate) -> Result<()> {
        let mut state = self.state.lock().await;
        let mut preferences = match &state.shared {
            Some(preferences) => preferences.clone(),
            None => {
                tracing::error!("shared preferences updated before set_up()");
                return Err(Error::NotInitialized);
            }
        };

        update.apply(&mut preferences);
        let record = SharedPreferencesRecord::hydrate(&preferences, &self.codec)?;
        self.db.set_shared_preferences(&record)?;

        state.shared = Some(preferences);
        self.shared_tx.send_replace(state.shared.clone());
        let _ = self.shared_events.send(update);
        Ok(())
    }

    /// Delete the persisted shared scope, keeping the published value
    pub async fn remove_shared_preferences(&self) -> Result<()> {
        let _state = self.state.lock().await;
        self.db.remove_shared_preferences()?;
        Ok(())
    }

    // ========================================================================
    // USER SCOPE
    // ========================================================================

    /// Stream of the active user's preferences
    pub fn user_preferences(&self) -> watch::Receiver<Option<UserPreferences>> {
        self.user_tx.subscribe()
    }

    /// Stream of user-scope field changes
    pub fn user_preference_events(&self) -> broadcast::Receiver<UserPreferencesUpdate> {
        self.user_events.subscribe()
    }

    /// Apply a field update to the active user's scope
    pub async fn update_user_preferences(&self, update: UserPreferencesUpdate) -> Result<()> {
        let mut state = self.state.lock().await;
        let (user_id, mut preferences) = match &state.user {
            Some((user_id, preferences)) => (user_id.clone(), preferences.clone()),
            None => {
                tracing::error!("user preferences updated before set_up()");
                return Err(Error::NotInitialized);
            }
        };

        update.apply(&mut preferences);
        let record = UserPreferencesRecord::hydrate(&preferences, &user_id, &self.codec)?;
        self.db.upsert_user_preferences(&record)?;

        state.user = Some((user_id, preferences.clone()));
        self.user_tx.send_replace(Some(preferences));
        let _ = self.user_events.send(update);
        Ok(())
    }

    /// Delete the active user's persisted scope, keeping the published
    /// value
    pub async fn remove_user_preferences(&self) -> Result<()> {
        let state = self.state.lock().await;
        if let Some((user_id, _)) = &state.user {
            self.db.remove_user_preferences(user_id)?;
        }
        Ok(())
    }

    /// Reload the user scope for the current active user.
    ///
    /// Call after login, logout, or an account switch. With no active
    /// user the scope unloads and publishes `None`.
    pub async fn reload_user_preferences(&self) -> Result<()> {
        let mut state = self.state.lock().await;

        state.user = match self.user_id_provider.active_user_id() {
            Some(user_id) => {
                let preferences = self.load_or_create_user(&user_id)?;
                Some((user_id, preferences))
            }
            None => None,
        };

        self.user_tx.send_replace(state.user.as_ref().map(|(_, p)| p.clone()));
        Ok(())
    }

    // ========================================================================
    // LOAD-OR-CREATE
    // ========================================================================

    fn load_or_create_app(&self) -> Result<AppPreferences> {
        match self.db.get_setting(APP_PREFERENCES_KEY)? {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| Error::DeserializationFailed(e.to_string())),
            None => {
                let defaults = AppPreferences::default();
                self.db
                    .set_setting(APP_PREFERENCES_KEY, &serde_json::to_string(&defaults)?)?;
                tracing::debug!("created default app preferences");
                Ok(defaults)
            }
        }
    }

    fn load_or_create_shared(&self) -> Result<SharedPreferences> {
        match self.db.get_shared_preferences()? {
            Some(record) => record.to_domain(&self.codec),
            None => {
                let defaults = SharedPreferences::default();
                let record = SharedPreferencesRecord::hydrate(&defaults, &self.codec)?;
                self.db.set_shared_preferences(&record)?;
                tracing::debug!("created default shared preferences");
                Ok(defaults)
            }
        }
    }

    fn load_or_create_user(&self, user_id: &str) -> Result<UserPreferences> {
        match self.db.get_user_preferences(user_id)? {
            Some(record) => record.to_domain(&self.codec),
            None => {
                let defaults = UserPreferences::default();
                let record = UserPreferencesRecord::hydrate(&defaults, user_id, &self.codec)?;
                self.db.upsert_user_preferences(&record)?;
                tracing::debug!(user_id, "created default user preferences");
                Ok(defaults)
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{LocalAuthMethod, SpotlightContent, Theme};
    use parking_lot::Mutex as SyncMutex;

    /// Switchable stand-in for the account manager
    struct StubUserId(SyncMutex<Option<String>>);

    impl StubUserId {
        fn new(user_id: Option<&str>) -> Arc<Self> {
            Arc::new(Self(SyncMutex::new(user_id.map(str::to_string))))
        }

        fn switch(&self, user_id: Option<&str>) {
            *self.0.lock() = user_id.map(str::to_string);
        }
    }

    impl ActiveUserIdProvider for StubUserId {
        fn active_user_id(&self) -> Option<String> {
            self.0.lock().clone()
        }
    }

    async fn manager_with(user_id: Option<&str>) -> (PreferencesManager, Arc<Database>, Arc<StubUserId>) {
        let db = Arc::new(Database::open(None).await.unwrap());
        let codec = Arc::new(SymmetricCodec::from_master_seed(&[55u8; 32]).unwrap());
        let provider = StubUserId::new(user_id);
        let manager = PreferencesManager::new(
            Arc::clone(&db),
            codec,
            Arc::clone(&provider) as Arc<dyn ActiveUserIdProvider>,
        );
        (manager, db, provider)
    }

    #[tokio::test]
    async fn test_defaults_are_created_and_persisted() {
        let (manager, db, _) = manager_with(Some("user-1")).await;
        manager.set_up().await.unwrap();

        assert_eq!(
            *manager.app_preferences().borrow(),
            Some(AppPreferences::default())
        );
        assert_eq!(
            *manager.shared_preferences().borrow(),
            Some(SharedPreferences::default())
        );
        assert_eq!(
            *manager.user_preferences().borrow(),
            Some(UserPreferences::default())
        );

        // Defaults hit the backing store, not just memory.
        assert!(db.get_setting(APP_PREFERENCES_KEY).unwrap().is_some());
        assert!(db.get_shared_preferences().unwrap().is_some());
        assert!(db.get_user_preferences("user-1").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_before_set_up_fails_and_writes_nothing() {
        let (manager, db, _) = manager_with(Some("user-1")).await;

        assert!(matches!(
            manager
                .update_app_preferences(AppPreferencesUpdate::CreatedItemsCount(3))
                .await,
            Err(Error::NotInitialized)
        ));
        assert!(matches!(
            manager
                .update_shared_preferences(SharedPreferencesUpdate::Theme(Theme::Dark))
                .await,
            Err(Error::NotInitialized)
        ));
        assert!(matches!(
            manager
                .update_user_preferences(UserPreferencesUpdate::SpotlightEnabled(true))
                .await,
            Err(Error::NotInitialized)
        ));

        assert!(db.get_setting(APP_PREFERENCES_KEY).unwrap().is_none());
        assert!(db.get_shared_preferences().unwrap().is_none());
        assert!(db.get_user_preferences("user-1").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_publishes_value_and_event() {
        let (manager, db, _) = manager_with(None).await;
        manager.set_up().await.unwrap();

        let mut events = manager.app_preference_events();

        manager
            .update_app_preferences(AppPreferencesUpdate::CreatedItemsCount(7))
            .await
            .unwrap();

        assert_eq!(
            manager.app_preferences().borrow().as_ref().unwrap().created_items_count,
            7
        );
        assert_eq!(
            events.recv().await.unwrap(),
            AppPreferencesUpdate::CreatedItemsCount(7)
        );

        // Persisted, not just published.
        let stored: AppPreferences =
            serde_json::from_str(&db.get_setting(APP_PREFERENCES_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored.created_items_count, 7);
    }

    #[tokio::test]
    async fn test_nullable_field_events() {
        let (manager, _, _) = manager_with(None).await;
        manager.set_up().await.unwrap();

        let mut events = manager.shared_preference_events();

        manager
            .update_shared_preferences(SharedPreferencesUpdate::PinCode(Some("1234".into())))
            .await
            .unwrap();
        manager
            .update_shared_preferences(SharedPreferencesUpdate::PinCode(None))
            .await
            .unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            SharedPreferencesUpdate::PinCode(Some("1234".into()))
        );
        // Clearing a nullable field is observable as an event too.
        assert_eq!(
            events.recv().await.unwrap(),
            SharedPreferencesUpdate::PinCode(None)
        );
        assert_eq!(
            manager.shared_preferences().borrow().as_ref().unwrap().pin_code,
            None
        );
    }

    #[tokio::test]
    async fn test_shared_updates_survive_reload() {
        let db = Arc::new(Database::open(None).await.unwrap());
        let codec = Arc::new(SymmetricCodec::from_master_seed(&[55u8; 32]).unwrap());
        let provider = StubUserId::new(None);

        {
            let manager = PreferencesManager::new(
                Arc::clone(&db),
                Arc::clone(&codec),
                Arc::clone(&provider) as Arc<dyn ActiveUserIdProvider>,
            );
            manager.set_up().await.unwrap();
            manager
                .update_shared_preferences(SharedPreferencesUpdate::LocalAuthMethod(
                    LocalAuthMethod::Pin,
                ))
                .await
                .unwrap();
            manager
                .update_shared_preferences(SharedPreferencesUpdate::PinCode(Some("9876".into())))
                .await
                .unwrap();
        }

        let manager = PreferencesManager::new(
            db,
            codec,
            provider as Arc<dyn ActiveUserIdProvider>,
        );
        manager.set_up().await.unwrap();

        let shared = manager.shared_preferences().borrow().clone().unwrap();
        assert_eq!(shared.local_auth_method, LocalAuthMethod::Pin);
        assert_eq!(shared.pin_code, Some("9876".into()));
    }

    #[tokio::test]
    async fn test_remove_deletes_backing_store_but_keeps_value() {
        let (manager, db, _) = manager_with(Some("user-1")).await;
        manager.set_up().await.unwrap();

        manager.remove_app_preferences().await.unwrap();
        manager.remove_shared_preferences().await.unwrap();
        manager.remove_user_preferences().await.unwrap();

        assert!(db.get_setting(APP_PREFERENCES_KEY).unwrap().is_none());
        assert!(db.get_shared_preferences().unwrap().is_none());
        assert!(db.get_user_preferences("user-1").unwrap().is_none());

        // The published values stay until a fresh set_up.
        assert!(manager.app_preferences().borrow().is_some());
        assert!(manager.shared_preferences().borrow().is_some());
        assert!(manager.user_preferences().borrow().is_some());
    }

    #[tokio::test]
    async fn test_user_scope_without_active_user() {
        let (manager, _, _) = manager_with(None).await;
        manager.set_up().await.unwrap();

        assert_eq!(*manager.user_preferences().borrow(), None);
        assert!(matches!(
            manager
                .update_user_preferences(UserPreferencesUpdate::SpotlightEnabled(true))
                .await,
            Err(Error::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_user_scope_follows_account_switch() {
        let (manager, _, provider) = manager_with(Some("user-1")).await;
        manager.set_up().await.unwrap();

        manager
            .update_user_preferences(UserPreferencesUpdate::SpotlightContent(
                SpotlightContent::TitleAndNote,
            ))
            .await
            .unwrap();

        // Switch to a fresh account: its scope starts at defaults.
        provider.switch(Some("user-2"));
        manager.reload_user_preferences().await.unwrap();
        assert_eq!(
            *manager.user_preferences().borrow(),
            Some(UserPreferences::default())
        );

        // Switching back restores the persisted value.
        provider.switch(Some("user-1"));
        manager.reload_user_preferences().await.unwrap();
        assert_eq!(
            manager.user_preferences().borrow().as_ref().unwrap().spotlight_content,
            SpotlightContent::TitleAndNote
        );

        // Logout unloads the scope.
        provider.switch(None);
        manager.reload_user_preferences().await.unwrap();
        assert_eq!(*manager.user_preferences().borrow(), None);
    }
}
