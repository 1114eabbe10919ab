//! # Encryption Module
//!
//! Provides AES-256-GCM encryption for record payloads at rest.
//!
//! ## Record Encryption Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      RECORD ENCRYPTION FLOW                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Step 1: Storage Key (process-wide, derived once)                       │
//! │  ┌─────────────────────────────────────────────────────────────┐        │
//! │  │  HKDF-SHA256(                                               │        │
//! │  │    ikm  = master seed (from the platform keystore),         │        │
//! │  │    info = "sanctum-storage-encryption-v1"                   │        │
//! │  │  )                                                          │        │
//! │  │           ↓                                                 │        │
//! │  │  Storage Encryption Key (32 bytes)                          │        │
//! │  └─────────────────────────────────────────────────────────────┘        │
//! │                                                                         │
//! │  Step 2: Generate Nonce (unique per write)                              │
//! │  ┌─────────────────────────────────────────────────────────────┐        │
//! │  │  Random 12 bytes from CSPRNG                                │        │
//! │  │  (Never reuse a nonce with the same key!)                   │        │
//! │  └─────────────────────────────────────────────────────────────┘        │
//! │                                                                         │
//! │  Step 3: Encrypt                                                        │
//! │  ┌─────────────────────────────────────────────────────────────┐        │
//! │  │  AES-256-GCM(                                               │        │
//! │  │    key       = storage_key,                                 │        │
//! │  │    nonce     = random_nonce,                                │        │
//! │  │    plaintext = serialized domain value,                     │        │
//! │  │    aad       = (user_id || record kind)                     │        │
//! │  │  )                                                          │        │
//! │  │           ↓                                                 │        │
//! │  │  Ciphertext + 16-byte Auth Tag                              │        │
//! │  └─────────────────────────────────────────────────────────────┘        │
//! │                                                                         │
//! │  Output: (nonce, ciphertext_with_tag)                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Properties
//!
//! | Property | Guarantee |
//! |----------|-----------|
//! | Confidentiality | Only the key holder can read the record |
//! | Integrity | Any modification of the stored blob is detected |
//! | Binding | AAD ties each blob to its owning row |
//! | Fail-closed | Wrong key yields an error, never garbage plaintext |

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce as AesNonce,
};
use rand::RngCore;
use zeroize::ZeroizeOnDrop;

use crate::error::{Error, Result};

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// Size of the encryption key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// A nonce (number used once) for AES-GCM encryption
///
/// ## Critical Security Requirement
///
/// **NEVER reuse a nonce with the same key!**
///
/// Nonce reuse completely breaks AES-GCM security:
/// - Allows recovering the authentication key
/// - Allows forging records
/// - May allow recovering plaintext
///
/// We use random nonces, which are safe for up to 2^32 writes
/// per key (birthday bound for 96-bit nonces).
#[derive(Clone, Copy, Debug)]
pub struct Nonce(pub [u8; NONCE_SIZE]);

impl Nonce {
    /// Generate a cryptographically random nonce
    pub fn random() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from existing bytes
    pub fn from_bytes(bytes: [u8; NONCE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

/// An AES-256-GCM encryption key
///
/// Zeroized when dropped for security.
#[derive(ZeroizeOnDrop)]
pub struct EncryptionKey([u8; KEY_SIZE]);

impl EncryptionKey {
    /// Create from raw bytes
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Get the raw key bytes (for fingerprinting and derivation chains)
    pub(crate) fn as_inner(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

/// Encrypt a record payload using AES-256-GCM
///
/// ## Parameters
///
/// - `key`: 256-bit storage encryption key
/// - `plaintext`: Serialized domain value to encrypt
/// - `aad`: Additional authenticated data (not encrypted, but authenticated)
///
/// ## Returns
///
/// Tuple of (nonce, ciphertext_with_tag)
pub fn encrypt(key: &EncryptionKey, plaintext: &[u8], aad: &[u8]) -> Result<(Nonce, Vec<u8>)> {
    let nonce = Nonce::random();
    let cipher = Aes256Gcm::new_from_slice(&key.0)
        .map_err(|e| Error::EncryptionFailed(format!("Invalid key: {}", e)))?;

    let payload = Payload {
        msg: plaintext,
        aad,
    };

    let ciphertext = cipher
        .encrypt(AesNonce::from_slice(&nonce.0), payload)
        .map_err(|e| Error::EncryptionFailed(format!("Encryption failed: {}", e)))?;

    Ok((nonce, ciphertext))
}

/// Decrypt a record payload using AES-256-GCM
///
/// ## Errors
///
/// Returns `DecryptionFailed` if:
/// - The ciphertext was tampered with
/// - The AAD doesn't match
/// - The key is wrong
/// - The nonce is wrong
pub fn decrypt(
    key: &EncryptionKey,
    nonce: &Nonce,
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(&key.0)
        .map_err(|e| Error::DecryptionFailed(format!("Invalid key: {}", e)))?;

    let payload = Payload {
        msg: ciphertext,
        aad,
    };

    cipher
        .decrypt(AesNonce::from_slice(&nonce.0), payload)
        .map_err(|_| {
            Error::DecryptionFailed("authentication tag mismatch".into())
        })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = EncryptionKey::from_bytes([7u8; KEY_SIZE]);
        let plaintext = b"user session payload";
        let aad = b"user-1/account";

        let (nonce, ciphertext) = encrypt(&key, plaintext, aad).unwrap();
        assert_ne!(&ciphertext[..], &plaintext[..]);
        assert_eq!(ciphertext.len(), plaintext.len() + TAG_SIZE);

        let decrypted = decrypt(&key, &nonce, &ciphertext, aad).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_wrong_key_fails_closed() {
        let key = EncryptionKey::from_bytes([7u8; KEY_SIZE]);
        let other = EncryptionKey::from_bytes([8u8; KEY_SIZE]);

        let (nonce, ciphertext) = encrypt(&key, b"secret", b"aad").unwrap();
        let result = decrypt(&other, &nonce, &ciphertext, b"aad");
        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_wrong_aad_fails() {
        let key = EncryptionKey::from_bytes([7u8; KEY_SIZE]);
        let (nonce, ciphertext) = encrypt(&key, b"secret", b"user-1/account").unwrap();
        let result = decrypt(&key, &nonce, &ciphertext, b"user-2/account");
        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = EncryptionKey::from_bytes([7u8; KEY_SIZE]);
        let (nonce, mut ciphertext) = encrypt(&key, b"secret", b"aad").unwrap();
        ciphertext[0] ^= 0x01;
        let result = decrypt(&key, &nonce, &ciphertext, b"aad");
        assert!(matches!(result, Err(Error::DecryptionFailed(_))));
    }

    #[test]
    fn test_nonces_are_unique() {
        let a = Nonce::random();
        let b = Nonce::random();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }
}
