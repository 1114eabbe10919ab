//! Access record mapping.
//!
//! One access row per user: the plan the server granted, its limits,
//! and account-level toggles. The limit columns are the canonical
//! sentinel fields: a free plan stores real numbers (including 0), a
//! paid plan stores -1 for "unlimited".

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::sentinel::{decode_optional_int, decode_optional_string, encode_optional_int,
                      encode_optional_string};
use super::require_field;

const ENTITY: &str = "access";

/// The plan granted to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Plan kind ("free", "plus", "business")
    pub plan_type: String,
    /// Server-internal plan name
    pub internal_name: String,
    /// Human-readable plan name
    pub display_name: String,
    /// Whether upgrade prompts should be hidden
    pub hide_upgrade: bool,
    /// Trial end timestamp; `None` when not on trial
    pub trial_end: Option<i64>,
    /// Maximum number of vaults; `None` = unlimited
    pub vault_limit: Option<i64>,
    /// Maximum number of aliases; `None` = unlimited
    pub alias_limit: Option<i64>,
    /// Maximum number of TOTP items; `None` = unlimited
    pub totp_limit: Option<i64>,
}

/// Breach-monitoring toggles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monitor {
    /// Monitor the account's own addresses
    pub addresses: bool,
    /// Monitor alias addresses
    pub aliases: bool,
}

/// Account-level access information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Access {
    /// Granted plan and limits
    pub plan: Plan,
    /// Monitoring toggles
    pub monitor: Monitor,
    /// Invites awaiting the user's response
    pub pending_invites: i64,
    /// Invites the user sent that wait on new-user confirmation
    pub waiting_new_user_invites: i64,
    /// Minimum app version required by the organization
    pub min_version_upgrade: Option<String>,
    /// Share new items default into
    pub default_share_id: Option<String>,
    /// Whether SimpleLogin alias sync is enabled
    pub alias_sync_enabled: bool,
    /// Aliases pending sync
    pub pending_alias_to_sync: i64,
}

/// Access together with its owning user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccess {
    /// Owning user
    pub user_id: String,
    /// The access payload
    pub access: Access,
}

/// Flat storage row for a user's access
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    /// Owning user; required
    pub user_id: String,
    /// Plan kind; required
    pub plan_type: String,
    /// Server-internal plan name; required
    pub internal_name: String,
    /// Display plan name
    pub display_name: String,
    /// Hide-upgrade flag
    pub hide_upgrade: bool,
    /// Trial end; -1 = absent
    pub trial_end: i64,
    /// Vault limit; -1 = unlimited
    pub vault_limit: i64,
    /// Alias limit; -1 = unlimited
    pub alias_limit: i64,
    /// TOTP limit; -1 = unlimited
    pub totp_limit: i64,
    /// Monitor own addresses
    pub monitor_addresses: bool,
    /// Monitor aliases
    pub monitor_aliases: bool,
    /// Pending incoming invites
    pub pending_invites: i64,
    /// Outgoing invites waiting on new users
    pub waiting_new_user_invites: i64,
    /// Required minimum version; '' = absent
    pub min_version_upgrade: String,
    /// Default share; '' = absent
    pub default_share_id: String,
    /// Alias sync toggle
    pub alias_sync_enabled: bool,
    /// Aliases pending sync
    pub pending_alias_to_sync: i64,
}

impl AccessRecord {
    /// Build a storage row from a domain value
    pub fn hydrate(user_access: &UserAccess) -> Self {
        let access = &user_access.access;
        let plan = &access.plan;
        Self {
            user_id: user_access.user_id.clone(),
            plan_type: plan.plan_type.clone(),
            internal_name: plan.internal_name.clone(),
            display_name: plan.display_name.clone(),
            hide_upgrade: plan.hide_upgrade,
            trial_end: encode_optional_int(plan.trial_end),
            vault_limit: encode_optional_int(plan.vault_limit),
            alias_limit: encode_optional_int(plan.alias_limit),
            totp_limit: encode_optional_int(plan.totp_limit),
            monitor_addresses: access.monitor.addresses,
            monitor_aliases: access.monitor.aliases,
            pending_invites: access.pending_invites,
            waiting_new_user_invites: access.waiting_new_user_invites,
            min_version_upgrade: encode_optional_string(access.min_version_upgrade.as_deref()),
            default_share_id: encode_optional_string(access.default_share_id.as_deref()),
            alias_sync_enabled: access.alias_sync_enabled,
            pending_alias_to_sync: access.pending_alias_to_sync,
        }
    }

    /// Convert the row back into a domain value
    pub fn to_domain(&self) -> Result<UserAccess> {
        let plan = Plan {
            plan_type: require_field(ENTITY, "plan_type", &self.plan_type)?.to_string(),
            internal_name: require_field(ENTITY, "internal_name", &self.internal_name)?
                .to_string(),
            display_name: self.display_name.clone(),
            hide_upgrade: self.hide_upgrade,
            trial_end: decode_optional_int(self.trial_end),
            vault_limit: decode_optional_int(self.vault_limit),
            alias_limit: decode_optional_int(self.alias_limit),
            totp_limit: decode_optional_int(self.totp_limit),
        };

        Ok(UserAccess {
            user_id: require_field(ENTITY, "user_id", &self.user_id)?.to_string(),
            access: Access {
                plan,
                monitor: Monitor {
                    addresses: self.monitor_addresses,
                    aliases: self.monitor_aliases,
                },
                pending_invites: self.pending_invites,
                waiting_new_user_invites: self.waiting_new_user_invites,
                min_version_upgrade: decode_optional_string(&self.min_version_upgrade),
                default_share_id: decode_optional_string(&self.default_share_id),
                alias_sync_enabled: self.alias_sync_enabled,
                pending_alias_to_sync: self.pending_alias_to_sync,
            },
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
