//! # Records Module
//!
//! Entity mappers: conversions between storage-shaped records and
//! domain structs.
//!
//! ## Mapping Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         RECORD ⇄ DOMAIN MAPPING                         │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   Storage row                         Domain value                      │
//! │  ┌──────────────────┐   to_domain    ┌──────────────────┐               │
//! │  │ flat scalars,    │ ─────────────► │ validated struct │               │
//! │  │ sentinel-encoded │                │ with native      │               │
//! │  │ optionality      │ ◄───────────── │ Option fields    │               │
//! │  └──────────────────┘    hydrate     └──────────────────┘               │
//! │                                                                         │
//! │   Two record families:                                                  │
//! │   • Plain-field records (items, shares, access, invites):              │
//! │     every column is a non-optional scalar; absence is encoded          │
//! │     with sentinels (-1 for integers, "" for strings).                  │
//! │   • Sealed-blob records (accounts, credentials, preferences):          │
//! │     the whole domain value is serialized and encrypted into one        │
//! │     BLOB column via the SymmetricCodec.                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Mappers are pure transformations: no I/O, no clocks. A record whose
//! logically-required column is empty maps to `Error::Corrupted` naming
//! the field; decryption and deserialization failures propagate with
//! their own error kinds so callers can tell a bad row from a bad key.
//!
//! Round-trip law: for every valid domain value `d`,
//! `to_domain(hydrate(d)) == d`.

mod access;
mod account;
mod invite;
mod item;
mod preferences;
pub mod sentinel;
mod share;

pub use access::{Access, AccessRecord, Monitor, Plan, UserAccess};
pub use account::{AccountProfile, AccountRecord, AppModule, AuthCredential,
                  AuthCredentialRecord, UserAccount};
pub use invite::{InviteRecord, PendingInvite};
pub use item::{EncryptedItem, Item, ItemRecord};
pub use preferences::{AppLockTime, AppPreferences, AppPreferencesUpdate, Browser,
                      ClipboardExpiration, LocalAuthMethod, SharedPreferences,
                      SharedPreferencesRecord, SharedPreferencesUpdate, SpotlightContent,
                      Theme, UserPreferences, UserPreferencesRecord, UserPreferencesUpdate};
pub use share::{Share, ShareRecord};

use crate::error::{Error, Result};

/// Reject an empty required column, naming the record and field.
pub(crate) fn require_field<'a>(
    entity: &'static str,
    field: &'static str,
    value: &'a str,
) -> Result<&'a str> {
    if value.is_empty() {
        Err(Error::Corrupted { entity, field })
    } else {
        Ok(value)
    }
}

/// Reject an empty required blob column, naming the record and field.
pub(crate) fn require_blob<'a>(
    entity: &'static str,
    field: &'static str,
    value: &'a [u8],
) -> Result<&'a [u8]> {
    if value.is_empty() {
        Err(Error::Corrupted { entity, field })
    } else {
        Ok(value)
    }
}
