//! Item record mapping.
//!
//! An item row carries the server-side item payload (already encrypted
//! by the sharing layer) plus a symmetrically re-encrypted copy of its
//! content under the local storage key, so list screens and the
//! autofill index can decrypt without a network round trip.

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::sentinel::{decode_optional_int, decode_optional_string, encode_optional_int,
                      encode_optional_string};
use super::require_field;

const ENTITY: &str = "item";

/// Server-shaped item metadata and payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Server-assigned item id, unique within a share
    pub item_id: String,
    /// Monotonic revision number
    pub revision: i64,
    /// Version of the content payload format
    pub content_format_version: i64,
    /// Rotation of the vault key the content is encrypted with
    pub key_rotation: i64,
    /// Item content as received from the server (base64 ciphertext)
    pub content: String,
    /// Per-item key, present for shared items
    pub item_key: Option<String>,
    /// Item state (active / trashed)
    pub state: i64,
    /// Whether the user pinned this item
    pub pinned: bool,
    /// When the item was pinned
    pub pin_time: Option<i64>,
    /// Alias address for alias items
    pub alias_email: Option<String>,
    /// Creation timestamp
    pub create_time: i64,
    /// Last modification timestamp
    pub modify_time: i64,
    /// Last autofill/copy usage timestamp
    pub last_use_time: Option<i64>,
    /// Timestamp of the current revision
    pub revision_time: i64,
    /// Server-side item flags bitfield
    pub flags: i64,
    /// How many shares expose this item
    pub share_count: i64,
}

/// An item together with its locally re-encrypted content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedItem {
    /// Share the item belongs to
    pub share_id: String,
    /// Owning user
    pub user_id: String,
    /// Server-shaped item
    pub item: Item,
    /// Content re-encrypted under the local storage key (base64)
    pub encrypted_content: String,
    /// Whether the item is a login (drives the autofill index)
    pub is_login_item: bool,
}

/// Flat storage row for an item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    /// Owning user
    pub user_id: String,
    /// Owning share
    pub share_id: String,
    /// Item id
    pub item_id: String,
    /// Revision number
    pub revision: i64,
    /// Content format version
    pub content_format_version: i64,
    /// Vault key rotation
    pub key_rotation: i64,
    /// Server payload (base64); required
    pub content: String,
    /// Per-item key; '' = absent
    pub item_key: String,
    /// Item state
    pub state: i64,
    /// Pinned flag
    pub pinned: bool,
    /// Pin timestamp; -1 = absent
    pub pin_time: i64,
    /// Alias address; '' = absent
    pub alias_email: String,
    /// Creation timestamp
    pub create_time: i64,
    /// Modification timestamp
    pub modify_time: i64,
    /// Last usage timestamp; -1 = absent
    pub last_use_time: i64,
    /// Revision timestamp
    pub revision_time: i64,
    /// Locally re-encrypted content; required, empty means corruption
    pub encrypted_content: String,
    /// Login flag for the autofill index
    pub is_login_item: bool,
    /// Server flags bitfield
    pub flags: i64,
    /// Number of shares exposing the item
    pub share_count: i64,
}

impl ItemRecord {
    /// Build a storage row from a domain value
    pub fn hydrate(item: &EncryptedItem) -> Self {
        let inner = &item.item;
        Self {
            user_id: item.user_id.clone(),
            share_id: item.share_id.clone(),
            item_id: inner.item_id.clone(),
            revision: inner.revision,
            content_format_version: inner.content_format_version,
            key_rotation: inner.key_rotation,
            content: inner.content.clone(),
            item_key: encode_optional_string(inner.item_key.as_deref()),
            state: inner.state,
            pinned: inner.pinned,
            pin_time: encode_optional_int(inner.pin_time),
            alias_email: encode_optional_string(inner.alias_email.as_deref()),
            create_time: inner.create_time,
            modify_time: inner.modify_time,
            last_use_time: encode_optional_int(inner.last_use_time),
            revision_time: inner.revision_time,
            encrypted_content: item.encrypted_content.clone(),
            is_login_item: item.is_login_item,
            flags: inner.flags,
            share_count: inner.share_count,
        }
    }

    /// Convert the row back into a domain value
    pub fn to_domain(&self) -> Result<EncryptedItem> {
        let encrypted_content =
            require_field(ENTITY, "encrypted_content", &self.encrypted_content)?.to_string();
        let content = require_field(ENTITY, "content", &self.content)?.to_string();

        let item = Item {
            item_id: self.item_id.clone(),
            revision: self.revision,
            content_format_version: self.content_format_version,
            key_rotation: self.key_rotation,
            content,
            item_key: decode_optional_string(&self.item_key),
            state: self.state,
            pinned: self.pinned,
            pin_time: decode_optional_int(self.pin_time),
            alias_email: decode_optional_string(&self.alias_email),
            create_time: self.create_time,
            modify_time: self.modify_time,
            last_use_time: decode_optional_int(self.last_use_time),
            revision_time: self.revision_time,
            flags: self.flags,
            share_count: self.share_count,
        };

        Ok(EncryptedItem {
            share_id: self.share_id.clone(),
            user_id: self.user_id.clone(),
            item,
            encrypted_content,
            is_login_item: self.is_login_item,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
