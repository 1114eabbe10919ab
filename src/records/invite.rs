//! Pending share invite record mapping.

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::sentinel::{decode_optional_string, encode_optional_string};
use super::require_field;

const ENTITY: &str = "invite";

/// An invitation to join a vault or item share, awaiting response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingInvite {
    /// Opaque token used to accept or reject the invite
    pub invite_token: String,
    /// Who sent the invite
    pub inviter_email: String,
    /// Address the invite was sent to
    pub invited_email: String,
    /// Share target kind (vault / item)
    pub target_type: i64,
    /// Vault name, decrypted by the sharing layer when available
    pub vault_name: Option<String>,
    /// Number of items in the shared target
    pub item_count: i64,
    /// Current member count of the share
    pub member_count: i64,
    /// How many reminders were sent
    pub remind_count: i64,
    /// Creation timestamp
    pub create_time: i64,
}

/// Flat storage row for a pending invite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteRecord {
    /// Owning user
    pub user_id: String,
    /// Invite token; required
    pub invite_token: String,
    /// Sender address; required
    pub inviter_email: String,
    /// Recipient address
    pub invited_email: String,
    /// Target kind
    pub target_type: i64,
    /// Vault name; '' = absent
    pub vault_name: String,
    /// Item count of the target
    pub item_count: i64,
    /// Member count of the share
    pub member_count: i64,
    /// Reminders sent
    pub remind_count: i64,
    /// Creation timestamp
    pub create_time: i64,
}

impl InviteRecord {
    /// Build a storage row from a domain value
    pub fn hydrate(invite: &PendingInvite, user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            invite_token: invite.invite_token.clone(),
            inviter_email: invite.inviter_email.clone(),
            invited_email: invite.invited_email.clone(),
            target_type: invite.target_type,
            vault_name: encode_optional_string(invite.vault_name.as_deref()),
            item_count: invite.item_count,
            member_count: invite.member_count,
            remind_count: invite.remind_count,
            create_time: invite.create_time,
        }
    }

    /// Convert the row back into a domain value
    pub fn to_domain(&self) -> Result<PendingInvite> {
        Ok(PendingInvite {
            invite_token: require_field(ENTITY, "invite_token", &self.invite_token)?.to_string(),
            inviter_email: require_field(ENTITY, "inviter_email", &self.inviter_email)?
                .to_string(),
            invited_email: self.invited_email.clone(),
            target_type: self.target_type,
            vault_name: decode_optional_string(&self.vault_name),
            item_count: self.item_count,
            member_count: self.member_count,
            remind_count: self.remind_count,
            create_time: self.create_time,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn sample() -> PendingInvite {
        PendingInvite {
            invite_token: "tok-1".into(),
            inviter_email: "owner@example.com".into(),
            invited_email: "me@example.com".into(),
            target_type: 1,
            vault_name: None,
            item_count: 12,
            member_count: 2,
            remind_count: 0,
            create_time: 1700000000,
        }
    }

    #[test]
    fn test_roundtrip() {
        let invite = sample();
        let record = InviteRecord::hydrate(&invite, "user-1");
        assert_eq!(record.vault_name, "");
        assert_eq!(record.to_domain().unwrap(), invite);
    }

    #[test]
    fn test_missing_token_is_corrupted() {
        let mut record = InviteRecord::hydrate(&sample(), "user-1");
        record.invite_token.clear();
        assert!(matches!(
            record.to_domain(),
            Err(Error::Corrupted { entity: "invite", field: "invite_token" })
        ));
    }
}
