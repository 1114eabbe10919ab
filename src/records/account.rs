//! Account and auth-credential record mapping.
//!
//! These are sealed-blob records: the whole domain value is serialized
//! and encrypted under the storage key, and the row keeps only the
//! lookup columns (user id, module, active flag, update time) in the
//! clear.

use serde::{Deserialize, Serialize};

use crate::crypto::{record_aad, SymmetricCodec};
use crate::error::Result;

use super::require_blob;

const ACCOUNT_ENTITY: &str = "account";
const CREDENTIAL_ENTITY: &str = "auth_credential";

/// AAD record kind for sealed account payloads
const ACCOUNT_KIND: &str = "account";

/// A logged-in user session's profile data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Server-assigned user id
    pub user_id: String,
    /// Primary address
    pub email: String,
    /// Display name shown in the account switcher
    pub display_name: String,
    /// Recovery address, when set
    pub recovery_email: Option<String>,
}

/// A stored account row together with its bookkeeping columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountProfile {
    /// The decrypted account
    pub account: UserAccount,
    /// Whether this session is the active one
    pub is_active: bool,
    /// Last upsert timestamp, drives recency ordering
    pub update_time: i64,
}

/// Storage row for an account session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    /// Owning user
    pub user_id: String,
    /// Sealed `UserAccount` payload; empty means the row is corrupted
    pub encrypted_data: Vec<u8>,
    /// Active-session flag
    pub is_active: bool,
    /// Last upsert timestamp
    pub update_time: i64,
}

impl AccountRecord {
    /// Seal a domain account into a storage row
    pub fn hydrate(
        account: &UserAccount,
        is_active: bool,
        update_time: i64,
        codec: &SymmetricCodec,
    ) -> Result<Self> {
        let aad = record_aad(&account.user_id, ACCOUNT_KIND);
        Ok(Self {
            user_id: account.user_id.clone(),
            encrypted_data: codec.seal(account, &aad)?,
            is_active,
            update_time,
        })
    }

    /// Decrypt the row back into a profile
    pub fn to_domain(&self, codec: &SymmetricCodec) -> Result<AccountProfile> {
        require_blob(ACCOUNT_ENTITY, "encrypted_data", &self.encrypted_data)?;
        let aad = record_aad(&self.user_id, ACCOUNT_KIND);
        let account: UserAccount = codec.open(&self.encrypted_data, &aad)?;
        Ok(AccountProfile {
            account,
            is_active: self.is_active,
            update_time: self.update_time,
        })
    }
}

// ============================================================================
// AUTH CREDENTIALS
// ============================================================================

/// The process a credential belongs to.
///
/// Each extension keeps its own session so that revoking one does not
/// log the others out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppModule {
    /// The main application
    HostApp,
    /// The autofill extension
    AutoFill,
    /// The share extension
    ShareExtension,
}

impl AppModule {
    /// Stable storage identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            AppModule::HostApp => "host_app",
            AppModule::AutoFill => "autofill",
            AppModule::ShareExtension => "share_extension",
        }
    }
}

/// Session tokens for one user in one app module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthCredential {
    /// Server session id
    pub session_id: String,
    /// Bearer token
    pub access_token: String,
    /// Token used to refresh the session
    pub refresh_token: String,
    /// Access token expiry timestamp
    pub expires_at: Option<i64>,
}

/// Storage row for a sealed auth credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCredentialRecord {
    /// Owning user
    pub user_id: String,
    /// `AppModule::as_str` value
    pub module: String,
    /// Sealed `AuthCredential` payload; empty means the row is corrupted
    pub encrypted_data: Vec<u8>,
}

impl AuthCredentialRecord {
    /// Seal a credential into a storage row
    pub fn hydrate(
        credential: &AuthCredential,
        user_id: &str,
        module: AppModule,
        codec: &SymmetricCodec,
    ) -> Result<Self> {
        let aad = credential_aad(user_id, module);
        Ok(Self {
            user_id: user_id.to_string(),
            module: module.as_str().to_string(),
            encrypted_data: codec.seal(credential, &aad)?,
        })
    }

    /// Decrypt the row back into a credential
    pub fn to_domain(&self, module: AppModule, codec: &SymmetricCodec) -> Result<AuthCredential> {
        require_blob(CREDENTIAL_ENTITY, "encrypted_data", &self.encrypted_data)?;
        let aad = credential_aad(&self.user_id, module);
        codec.open(&self.encrypted_data, &aad)
    }
}

fn credential_aad(user_id: &str, module: AppModule) -> Vec<u8> {
    let kind = format!("credential-{}", module.as_str());
    record_aad(user_id, &kind)
}

// ============================================================================
// TESTS
// ============================================================================
