//! Share record mapping.

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::sentinel::{decode_optional_int, decode_optional_string, encode_optional_int,
                      encode_optional_string};
use super::require_field;

const ENTITY: &str = "share";

/// A vault or item share visible to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    /// Server-assigned share id
    pub share_id: String,
    /// Vault the share points into
    pub vault_id: String,
    /// Address the share was made to
    pub address_id: String,
    /// Share target kind (vault / item)
    pub target_type: i64,
    /// Id of the shared vault or item
    pub target_id: String,
    /// Permission bitfield
    pub permission: i64,
    /// Role granted to this member (admin / write / read)
    pub share_role_id: String,
    /// Whether the user owns the underlying vault
    pub owner: bool,
    /// Whether the target is shared with other members
    pub shared: bool,
    /// Encrypted vault content (absent for item shares)
    pub content: Option<String>,
    /// Key rotation the content is encrypted with
    pub content_key_rotation: Option<i64>,
    /// Format version of the content payload
    pub content_format_version: Option<i64>,
    /// When the share link expires
    pub expire_time: Option<i64>,
    /// Creation timestamp
    pub create_time: i64,
    /// Whether autofill may surface items of this share
    pub can_auto_fill: bool,
}

/// Flat storage row for a share
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRecord {
    /// Owning user
    pub user_id: String,
    /// Share id; required
    pub share_id: String,
    /// Vault id; required
    pub vault_id: String,
    /// Address id
    pub address_id: String,
    /// Target kind
    pub target_type: i64,
    /// Target id; required
    pub target_id: String,
    /// Permission bitfield
    pub permission: i64,
    /// Member role; required
    pub share_role_id: String,
    /// Ownership flag
    pub owner: bool,
    /// Shared-with-others flag
    pub shared: bool,
    /// Vault content; '' = absent
    pub content: String,
    /// Content key rotation; -1 = absent
    pub content_key_rotation: i64,
    /// Content format version; -1 = absent
    pub content_format_version: i64,
    /// Expiry timestamp; -1 = absent
    pub expire_time: i64,
    /// Creation timestamp
    pub create_time: i64,
    /// Autofill eligibility
    pub can_auto_fill: bool,
}

impl ShareRecord {
    /// Build a storage row from a domain value
    pub fn hydrate(share: &Share, user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            share_id: share.share_id.clone(),
            vault_id: share.vault_id.clone(),
            address_id: share.address_id.clone(),
            target_type: share.target_type,
            target_id: share.target_id.clone(),
            permission: share.permission,
            share_role_id: share.share_role_id.clone(),
            owner: share.owner,
            shared: share.shared,
            content: encode_optional_string(share.content.as_deref()),
            content_key_rotation: encode_optional_int(share.content_key_rotation),
            content_format_version: encode_optional_int(share.content_format_version),
            expire_time: encode_optional_int(share.expire_time),
            create_time: share.create_time,
            can_auto_fill: share.can_auto_fill,
        }
    }

    /// Convert the row back into a domain value
    pub fn to_domain(&self) -> Result<Share> {
        Ok(Share {
            share_id: require_field(ENTITY, "share_id", &self.share_id)?.to_string(),
            vault_id: require_field(ENTITY, "vault_id", &self.vault_id)?.to_string(),
            address_id: self.address_id.clone(),
            target_type: self.target_type,
            target_id: require_field(ENTITY, "target_id", &self.target_id)?.to_string(),
            permission: self.permission,
            share_role_id: require_field(ENTITY, "share_role_id", &self.share_role_id)?
                .to_string(),
            owner: self.owner,
            shared: self.shared,
            content: decode_optional_string(&self.content),
            content_key_rotation: decode_optional_int(self.content_key_rotation),
            content_format_version: decode_optional_int(self.content_format_version),
            expire_time: decode_optional_int(self.expire_time),
            create_time: self.create_time,
            can_auto_fill: self.can_auto_fill,
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

    fn sample() -> Share {
        Share {
            share_id: "share-1".into(),
            vault_id: "vault-1".into(),
            address_id: "addr-1".into(),
            target_type: 1,
            target_id: "vault-1".into(),
            permission: 255,
            share_role_id: "1".into(),
            owner: true,
            shared: false,
            content: Some("dmF1bHQtY29udGVudA==".into()),
            content_key_rotation: Some(1),
            content_format_version: Some(1),
            expire_time: None,
            create_time: 1700000000,
            can_auto_fill: true,
        }
    }

    #[test]
    fn test_roundtrip() {
        let share = sample();
        let record = ShareRecord::hydrate(&share, "user-1");
        assert_eq!(record.user_id, "user-1");
        assert_eq!(record.to_domain().unwrap(), share);
    }

    #[test]
    fn test_absent_expire_time_is_sentinel() {
        let record = ShareRecord::hydrate(&sample(), "user-1");
        assert_eq!(record.expire_time, -1);
        assert_eq!(record.to_domain().unwrap().expire_time, None);
    }

    #[test]
    fn test_zero_key_rotation_survives() {
        let mut share = sample();
        share.content_key_rotation = Some(0);
        let record = ShareRecord::hydrate(&share, "user-1");
        assert_eq!(record.content_key_rotation, 0);
        assert_eq!(record.to_domain().unwrap().content_key_rotation, Some(0));
    }

    #[test]
    fn test_missing_vault_id_is_corrupted() {
        let mut record = ShareRecord::hydrate(&sample(), "user-1");
        record.vault_id.clear();
        assert!(matches!(
            record.to_domain(),
            Err(Error::Corrupted { entity: "share", field: "vault_id" })
        ));
    }
}
