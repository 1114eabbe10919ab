//! Preference models, their defaults, and record mapping.
//!
//! Three scopes with independent lifecycles:
//!
//! - **App**: device-level flags that survive logout (onboarding,
//!   counters). Plain JSON in the settings table; nothing sensitive.
//! - **Shared**: settings common to every account on the device (lock
//!   method, PIN code, theme). Sealed singleton blob.
//! - **User**: per-account settings, keyed by user id. Sealed blob.
//!
//! Every scope's struct is complete or absent: defaults are written on
//! first access, never partially merged.

use serde::{Deserialize, Serialize};

use crate::crypto::{record_aad, SymmetricCodec};
use crate::error::Result;

use super::require_blob;

/// AAD for the shared-preferences singleton blob
const SHARED_PREFS_AAD: &[u8] = b"shared-preferences";

/// AAD record kind for per-user preference blobs
const USER_PREFS_KIND: &str = "user-preferences";

// ============================================================================
// SETTING ENUMS
// ============================================================================

/// App color scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Theme {
    /// Follow the OS setting
    #[default]
    System,
    /// Always light
    Light,
    /// Always dark
    Dark,
}

/// Browser used to open item URLs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Browser {
    /// Whatever the OS opens by default
    #[default]
    SystemDefault,
    /// In-app browser sheet
    InApp,
    /// Safari
    Safari,
    /// Chrome
    Chrome,
    /// Firefox
    Firefox,
    /// DuckDuckGo
    DuckDuckGo,
    /// Brave
    Brave,
}

/// How long the app may stay unlocked in the background
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppLockTime {
    /// Lock as soon as the app leaves the foreground
    Immediately,
    /// One minute
    OneMinute,
    /// Two minutes
    #[default]
    TwoMinutes,
    /// Five minutes
    FiveMinutes,
    /// Ten minutes
    TenMinutes,
    /// One hour
    OneHour,
    /// Four hours
    FourHours,
}

/// How long copied secrets stay on the clipboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClipboardExpiration {
    /// Fifteen seconds
    FifteenSeconds,
    /// One minute
    #[default]
    OneMinute,
    /// Two minutes
    TwoMinutes,
    /// Never cleared
    Never,
}

/// Local authentication gate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocalAuthMethod {
    /// No local gate
    #[default]
    None,
    /// Face ID / Touch ID / platform biometrics
    Biometric,
    /// PIN code
    Pin,
}

/// What the OS search index may see of an item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpotlightContent {
    /// Title only
    #[default]
    TitleOnly,
    /// Title and note
    TitleAndNote,
    /// Everything except sensitive fields
    AllExceptSensitive,
}

// ============================================================================
// APP SCOPE
// ============================================================================

/// Device-level preferences that survive logout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppPreferences {
    /// Whether onboarding has been completed on this device
    pub onboarded: bool,
    /// Items created on this device, drives review prompts
    pub created_items_count: u32,
    /// Next telemetry send threshold
    pub telemetry_threshold: Option<i64>,
    /// Banners the user dismissed
    pub dismissed_banner_ids: Vec<String>,
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            onboarded: false,
            created_items_count: 0,
            telemetry_threshold: None,
            dismissed_banner_ids: Vec::new(),
        }
    }
}

/// A single-field change to `AppPreferences`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppPreferencesUpdate {
    /// Set `onboarded`
    Onboarded(bool),
    /// Set `created_items_count`
    CreatedItemsCount(u32),
    /// Set `telemetry_threshold`
    TelemetryThreshold(Option<i64>),
    /// Set `dismissed_banner_ids`
    DismissedBannerIds(Vec<String>),
}

impl AppPreferencesUpdate {
    /// Apply the change to a copy of the current value
    pub fn apply(&self, preferences: &mut AppPreferences) {
        match self {
            AppPreferencesUpdate::Onboarded(value) => preferences.onboarded = *value,
            AppPreferencesUpdate::CreatedItemsCount(value) => {
                preferences.created_items_count = *value;
            }
            AppPreferencesUpdate::TelemetryThreshold(value) => {
                preferences.telemetry_threshold = *value;
            }
            AppPreferencesUpdate::DismissedBannerIds(value) => {
                preferences.dismissed_banner_ids = value.clone();
            }
        }
    }
}

// ============================================================================
// SHARED SCOPE
// ============================================================================

/// Preferences shared between all accounts on the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedPreferences {
    /// AutoFill suggestions above the keyboard
    pub quick_type_bar: bool,
    /// Copy the TOTP code to the clipboard after autofilling
    pub automatically_copy_totp_code: bool,
    /// Chosen color scheme
    pub theme: Theme,
    /// Chosen browser for item URLs
    pub browser: Browser,
    /// Display favicons on login items
    pub display_favicons: bool,
    /// Failed local authentication attempts so far
    pub failed_attempt_count: u32,
    /// Biometric or PIN gate
    pub local_auth_method: LocalAuthMethod,
    /// PIN code when `local_auth_method` is `Pin`
    pub pin_code: Option<String>,
    /// Fall back to the device passcode when biometrics fail
    pub fallback_to_passcode: bool,
    /// Automatic lock timeout
    pub app_lock_time: AppLockTime,
    /// Clipboard expiry for copied secrets
    pub clipboard_expiration: ClipboardExpiration,
    /// Share the clipboard with devices on the same account
    pub share_clipboard: bool,
    /// Always show the username field in the login editor
    pub always_show_username_field: bool,
    /// Timestamp of the last host-app or extension usage
    pub last_active_timestamp: Option<i64>,
}

impl Default for SharedPreferences {
    fn default() -> Self {
        Self {
            quick_type_bar: true,
            automatically_copy_totp_code: true,
            theme: Theme::default(),
            browser: Browser::default(),
            display_favicons: true,
            failed_attempt_count: 0,
            local_auth_method: LocalAuthMethod::default(),
            pin_code: None,
            fallback_to_passcode: true,
            app_lock_time: AppLockTime::default(),
            clipboard_expiration: ClipboardExpiration::default(),
            share_clipboard: false,
            always_show_username_field: false,
            last_active_timestamp: None,
        }
    }
}

/// A single-field change to `SharedPreferences`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharedPreferencesUpdate {
    /// Set `quick_type_bar`
    QuickTypeBar(bool),
    /// Set `automatically_copy_totp_code`
    AutomaticallyCopyTotpCode(bool),
    /// Set `theme`
    Theme(Theme),
    /// Set `browser`
    Browser(Browser),
    /// Set `display_favicons`
    DisplayFavicons(bool),
    /// Set `failed_attempt_count`
    FailedAttemptCount(u32),
    /// Set `local_auth_method`
    LocalAuthMethod(LocalAuthMethod),
    /// Set or clear `pin_code`
    PinCode(Option<String>),
    /// Set `fallback_to_passcode`
    FallbackToPasscode(bool),
    /// Set `app_lock_time`
    AppLockTime(AppLockTime),
    /// Set `clipboard_expiration`
    ClipboardExpiration(ClipboardExpiration),
    /// Set `share_clipboard`
    ShareClipboard(bool),
    /// Set `always_show_username_field`
    AlwaysShowUsernameField(bool),
    /// Set or clear `last_active_timestamp`
    LastActiveTimestamp(Option<i64>),
}

impl SharedPreferencesUpdate {
    /// Apply the change to a copy of the current value
    pub fn apply(&self, preferences: &mut SharedPreferences) {
        match self {
            SharedPreferencesUpdate::QuickTypeBar(value) => preferences.quick_type_bar = *value,
            SharedPreferencesUpdate::AutomaticallyCopyTotpCode(value) => {
                preferences.automatically_copy_totp_code = *value;
            }
            SharedPreferencesUpdate::Theme(value) => preferences.theme = *value,
            SharedPreferencesUpdate::Browser(value) => preferences.browser = *value,
            SharedPreferencesUpdate::DisplayFavicons(value) => {
                preferences.display_favicons = *value;
            }
            SharedPreferencesUpdate::FailedAttemptCount(value) => {
                preferences.failed_attempt_count = *value;
            }
            SharedPreferencesUpdate::LocalAuthMethod(value) => {
                preferences.local_auth_method = *value;
            }
            SharedPreferencesUpdate::PinCode(value) => preferences.pin_code = value.clone(),
            SharedPreferencesUpdate::FallbackToPasscode(value) => {
                preferences.fallback_to_passcode = *value;
            }
            SharedPreferencesUpdate::AppLockTime(value) => preferences.app_lock_time = *value,
            SharedPreferencesUpdate::ClipboardExpiration(value) => {
                preferences.clipboard_expiration = *value;
            }
            SharedPreferencesUpdate::ShareClipboard(value) => {
                preferences.share_clipboard = *value;
            }
            SharedPreferencesUpdate::AlwaysShowUsernameField(value) => {
                preferences.always_show_username_field = *value;
            }
            SharedPreferencesUpdate::LastActiveTimestamp(value) => {
                preferences.last_active_timestamp = *value;
            }
        }
    }
}

// ============================================================================
// USER SCOPE
// ============================================================================

/// Per-account preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Index items into the OS search
    pub spotlight_enabled: bool,
    /// What the OS search index may see
    pub spotlight_content: SpotlightContent,
    /// Extra password gate on top of account authentication
    pub extra_password_enabled: bool,
    /// Share selected in the last item-creation flow
    pub last_selected_share_id: Option<String>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            spotlight_enabled: false,
            spotlight_content: SpotlightContent::default(),
            extra_password_enabled: false,
            last_selected_share_id: None,
        }
    }
}

/// A single-field change to `UserPreferences`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserPreferencesUpdate {
    /// Set `spotlight_enabled`
    SpotlightEnabled(bool),
    /// Set `spotlight_content`
    SpotlightContent(SpotlightContent),
    /// Set `extra_password_enabled`
    ExtraPasswordEnabled(bool),
    /// Set or clear `last_selected_share_id`
    LastSelectedShareId(Option<String>),
}

impl UserPreferencesUpdate {
    /// Apply the change to a copy of the current value
    pub fn apply(&self, preferences: &mut UserPreferences) {
        match self {
            UserPreferencesUpdate::SpotlightEnabled(value) => {
                preferences.spotlight_enabled = *value;
            }
            UserPreferencesUpdate::SpotlightContent(value) => {
                preferences.spotlight_content = *value;
            }
            UserPreferencesUpdate::ExtraPasswordEnabled(value) => {
                preferences.extra_password_enabled = *value;
            }
            UserPreferencesUpdate::LastSelectedShareId(value) => {
                preferences.last_selected_share_id = value.clone();
            }
        }
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// Storage row for the shared-preferences singleton
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedPreferencesRecord {
    /// Sealed `SharedPreferences` payload; empty means corruption
    pub encrypted_content: Vec<u8>,
}

impl SharedPreferencesRecord {
    /// Seal the shared preferences into a storage row
    pub fn hydrate(preferences: &SharedPreferences, codec: &SymmetricCodec) -> Result<Self> {
        Ok(Self {
            encrypted_content: codec.seal(preferences, SHARED_PREFS_AAD)?,
        })
    }

    /// Decrypt the row back into shared preferences
    pub fn to_domain(&self, codec: &SymmetricCodec) -> Result<SharedPreferences> {
        require_blob("shared_preferences", "encrypted_content", &self.encrypted_content)?;
        codec.open(&self.encrypted_content, SHARED_PREFS_AAD)
    }
}

/// Storage row for one user's preferences
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPreferencesRecord {
    /// Owning user
    pub user_id: String,
    /// Sealed `UserPreferences` payload; empty means corruption
    pub encrypted_content: Vec<u8>,
}

impl UserPreferencesRecord {
    /// Seal a user's preferences into a storage row
    pub fn hydrate(
        preferences: &UserPreferences,
        user_id: &str,
        codec: &SymmetricCodec,
    ) -> Result<Self> {
        let aad = record_aad(user_id, USER_PREFS_KIND);
        Ok(Self {
            user_id: user_id.to_string(),
            encrypted_content: codec.seal(preferences, &aad)?,
        })
    }

    /// Decrypt the row back into user preferences
    pub fn to_domain(&self, codec: &SymmetricCodec) -> Result<UserPreferences> {
        require_blob("user_preferences", "encrypted_content", &self.encrypted_content)?;
        let aad = record_aad(&self.user_id, USER_PREFS_KIND);
        codec.open(&self.encrypted_content, &aad)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn codec() -> SymmetricCodec {
        SymmetricCodec::from_master_seed(&[21u8; 32]).unwrap()
    }

    #[test]
    fn test_shared_defaults() {
        let prefs = SharedPreferences::default();
        assert!(prefs.quick_type_bar);
        assert!(prefs.fallback_to_passcode);
        assert_eq!(prefs.app_lock_time, AppLockTime::TwoMinutes);
        assert_eq!(prefs.local_auth_method, LocalAuthMethod::None);
        assert_eq!(prefs.pin_code, None);
    }

    #[test]
    fn test_shared_roundtrip() {
        let codec = codec();
        let mut prefs = SharedPreferences::default();
        prefs.theme = Theme::Dark;
        prefs.pin_code = Some("123456".into());
        prefs.local_auth_method = LocalAuthMethod::Pin;

        let record = SharedPreferencesRecord::hydrate(&prefs, &codec).unwrap();
        assert_eq!(record.to_domain(&codec).unwrap(), prefs);
    }

    #[test]
    fn test_shared_wrong_key_fails() {
        let record =
            SharedPreferencesRecord::hydrate(&SharedPreferences::default(), &codec()).unwrap();
        let other = SymmetricCodec::from_master_seed(&[22u8; 32]).unwrap();
        assert!(matches!(
            record.to_domain(&other),
            Err(Error::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_user_roundtrip_bound_to_user() {
        let codec = codec();
        let mut prefs = UserPreferences::default();
        prefs.spotlight_enabled = true;
        prefs.last_selected_share_id = Some("share-9".into());

        let record = UserPreferencesRecord::hydrate(&prefs, "user-1", &codec).unwrap();
        assert_eq!(record.to_domain(&codec).unwrap(), prefs);

        // The same blob under another user id fails authentication.
        let mut moved = record.clone();
        moved.user_id = "user-2".into();
        assert!(matches!(
            moved.to_domain(&codec),
            Err(Error::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_empty_blob_is_corrupted() {
        let record = UserPreferencesRecord {
            user_id: "user-1".into(),
            encrypted_content: Vec::new(),
        };
        assert!(matches!(
            record.to_domain(&codec()),
            Err(Error::Corrupted { entity: "user_preferences", field: "encrypted_content" })
        ));
    }

    #[test]
    fn test_updates_touch_only_their_field() {
        let mut prefs = SharedPreferences::default();
        SharedPreferencesUpdate::Theme(Theme::Dark).apply(&mut prefs);
        assert_eq!(prefs.theme, Theme::Dark);

        let expected = SharedPreferences {
            theme: Theme::Dark,
            ..SharedPreferences::default()
        };
        assert_eq!(prefs, expected);

        SharedPreferencesUpdate::PinCode(Some("0000".into())).apply(&mut prefs);
        assert_eq!(prefs.pin_code, Some("0000".into()));
        SharedPreferencesUpdate::PinCode(None).apply(&mut prefs);
        assert_eq!(prefs.pin_code, None);
    }
}
