//! # Key Derivation Functions
//!
//! Derives the process-wide storage encryption key from the master seed
//! held by the platform keystore.
//!
//! ## Key Derivation Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    KEY DERIVATION HIERARCHY                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                 MASTER SEED (32 bytes)                          │    │
//! │  │                                                                 │    │
//! │  │  Provisioned by the host app, held in the platform keystore    │    │
//! │  │  (Keychain / Keystore). Used as Input Key Material for HKDF.   │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │                                ▼                                        │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                 STORAGE ENCRYPTION KEY                          │    │
//! │  │                                                                 │    │
//! │  │  HKDF-SHA256(                                                   │    │
//! │  │    ikm  = master_seed,                                          │    │
//! │  │    salt = empty,                                                │    │
//! │  │    info = "sanctum-storage-encryption-v1"                       │    │
//! │  │  )                                                              │    │
//! │  │                                                                 │    │
//! │  │  → 32-byte AES-256-GCM key for records at rest                  │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `-v1` suffix in the domain string allows a future algorithm
//! upgrade to derive a distinct key from the same seed.

use hkdf::Hkdf;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

use super::encryption::{EncryptionKey, KEY_SIZE};

/// Domain separation strings for HKDF
///
/// These ensure that keys derived for different purposes are
/// cryptographically independent, even when derived from the same
/// master seed.
pub mod domain {
    /// Domain for storage encryption key derivation
    pub const STORAGE_ENCRYPTION: &[u8] = b"sanctum-storage-encryption-v1";
}

/// Derive the storage encryption key from a master seed
pub fn derive_storage_key(master_seed: &[u8; 32]) -> Result<EncryptionKey> {
    let hkdf = Hkdf::<Sha256>::new(None, master_seed);
    let mut key = [0u8; KEY_SIZE];
    hkdf.expand(domain::STORAGE_ENCRYPTION, &mut key)
        .map_err(|_| Error::KeyDerivationFailed("HKDF expansion failed".into()))?;

    Ok(EncryptionKey::from_bytes(key))
}

/// Compute a short fingerprint of a key for debug logging.
///
/// Returns the first 8 hex characters of SHA-256(key). Safe to log:
/// the preimage is not recoverable from it.
pub fn key_fingerprint(key: &EncryptionKey) -> String {
    let digest = Sha256::digest(key.as_inner());
    hex::encode(&digest[..4])
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let seed = [42u8; 32];
        let a = derive_storage_key(&seed).unwrap();
        let b = derive_storage_key(&seed).unwrap();
        assert_eq!(a.as_inner(), b.as_inner());
    }

    #[test]
    fn test_different_seeds_give_different_keys() {
        let a = derive_storage_key(&[1u8; 32]).unwrap();
        let b = derive_storage_key(&[2u8; 32]).unwrap();
        assert_ne!(a.as_inner(), b.as_inner());
    }

    #[test]
    fn test_derived_key_differs_from_seed() {
        let seed = [9u8; 32];
        let key = derive_storage_key(&seed).unwrap();
        assert_ne!(key.as_inner(), &seed);
    }

    #[test]
    fn test_fingerprint_is_short_hex() {
        let key = derive_storage_key(&[3u8; 32]).unwrap();
        let fp = key_fingerprint(&key);
        assert_eq!(fp.len(), 8);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
