//! # Symmetric Record Codec
//!
//! Seals and opens whole domain values for storage: serialize with
//! bincode, encrypt with AES-256-GCM under the process-wide storage
//! key, and frame as `nonce || ciphertext` in a single blob column.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SEALED BLOB LAYOUT                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   ┌──────────────┬──────────────────────────────┬──────────────┐        │
//! │   │ nonce (12 B) │ ciphertext (= plaintext len) │  tag (16 B)  │        │
//! │   └──────────────┴──────────────────────────────┴──────────────┘        │
//! │                                                                         │
//! │   AAD = "<user_id>/<record kind>" binds the blob to its row, so a       │
//! │   payload copied under another user fails authentication.               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Opening is fail-closed: a wrong key, a tampered byte, or a truncated
//! frame yields `DecryptionFailed`; a decrypted payload of the wrong
//! shape yields `DeserializationFailed`. There is no partial recovery.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

use super::encryption::{decrypt, encrypt, EncryptionKey, Nonce, NONCE_SIZE, TAG_SIZE};
use super::kdf::{derive_storage_key, key_fingerprint};

/// Encrypts and decrypts serialized domain values with the process-wide
/// storage key.
///
/// The codec performs no I/O; callers hand the sealed blob to the
/// storage layer and back.
pub struct SymmetricCodec {
    key: EncryptionKey,
}

impl SymmetricCodec {
    /// Create a codec around an existing storage key
    pub fn new(key: EncryptionKey) -> Self {
        tracing::debug!(key = %key_fingerprint(&key), "symmetric codec ready");
        Self { key }
    }

    /// Derive the storage key from a master seed and wrap it
    pub fn from_master_seed(master_seed: &[u8; 32]) -> Result<Self> {
        Ok(Self::new(derive_storage_key(master_seed)?))
    }

    /// Serialize and encrypt a domain value into a sealed blob
    pub fn seal<T: Serialize>(&self, value: &T, aad: &[u8]) -> Result<Vec<u8>> {
        let plaintext = bincode::serialize(value)?;
        let (nonce, ciphertext) = encrypt(&self.key, &plaintext, aad)?;

        let mut blob = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        blob.extend_from_slice(nonce.as_bytes());
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Decrypt and deserialize a sealed blob back into a domain value
    pub fn open<T: DeserializeOwned>(&self, blob: &[u8], aad: &[u8]) -> Result<T> {
        if blob.len() < NONCE_SIZE + TAG_SIZE {
            return Err(Error::DecryptionFailed("sealed blob too short".into()));
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&blob[..NONCE_SIZE]);

        let plaintext = decrypt(&self.key, &Nonce::from_bytes(nonce), &blob[NONCE_SIZE..], aad)?;
        bincode::deserialize(&plaintext).map_err(|e| Error::DeserializationFailed(e.to_string()))
    }
}

/// Build the AAD string binding a sealed blob to its owning row
pub fn record_aad(user_id: &str, kind: &str) -> Vec<u8> {
    let mut aad = Vec::with_capacity(user_id.len() + 1 + kind.len());
    aad.extend_from_slice(user_id.as_bytes());
    aad.push(b'/');
    aad.extend_from_slice(kind.as_bytes());
    aad
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Session {
        user_id: String,
        email: String,
        refresh_token: Option<String>,
    }

    fn sample() -> Session {
        Session {
            user_id: "user-1".into(),
            email: "user@example.com".into(),
            refresh_token: Some("tok".into()),
        }
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let codec = SymmetricCodec::from_master_seed(&[5u8; 32]).unwrap();
        let aad = record_aad("user-1", "account");

        let blob = codec.seal(&sample(), &aad).unwrap();
        let opened: Session = codec.open(&blob, &aad).unwrap();
        assert_eq!(opened, sample());
    }

    #[test]
    fn test_wrong_key_fails_closed() {
        let codec = SymmetricCodec::from_master_seed(&[5u8; 32]).unwrap();
        let other = SymmetricCodec::from_master_seed(&[6u8; 32]).unwrap();
        let aad = record_aad("user-1", "account");

        let blob = codec.seal(&sample(), &aad).unwrap();
        let result: Result<Session> = other.open(&blob, &aad);
        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_blob_bound_to_owner() {
        let codec = SymmetricCodec::from_master_seed(&[5u8; 32]).unwrap();

        let blob = codec.seal(&sample(), &record_aad("user-1", "account")).unwrap();
        let result: Result<Session> = codec.open(&blob, &record_aad("user-2", "account"));
        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_truncated_blob_rejected() {
        let codec = SymmetricCodec::from_master_seed(&[5u8; 32]).unwrap();
        let result: Result<Session> = codec.open(&[0u8; 8], b"aad");
        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_wrong_shape_is_deserialization_failure() {
        let codec = SymmetricCodec::from_master_seed(&[5u8; 32]).unwrap();
        let aad = record_aad("user-1", "account");

        // Seal a plain string, then try to open it as a Session.
        let blob = codec.seal(&"not a session".to_string(), &aad).unwrap();
        let result: Result<Session> = codec.open(&blob, &aad);
        assert!(matches!(result, Err(Error::DeserializationFailed(_))));
    }
}
