//! # Cryptography Module
//!
//! Cryptographic primitives for records at rest.
//!
//! ## Security Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Master Seed (platform keystore, 32 bytes)                              │
//! │         │                                                               │
//! │         └──► HKDF-SHA256("sanctum-storage-encryption-v1")               │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │         Storage Encryption Key (AES-256-GCM)                            │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │         SymmetricCodec: seal/open of serialized domain values           │
//! │         (nonce || ciphertext framing, AAD = owner row)                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices & Rationale
//!
//! | Algorithm | Purpose | Why Chosen |
//! |-----------|---------|------------|
//! | AES-256-GCM | Record encryption | Hardware acceleration, AEAD |
//! | HKDF-SHA256 | Key derivation | Industry standard, well-analyzed |
//!
//! ## Security Considerations
//!
//! 1. **Key Zeroization**: The storage key is zeroized when dropped
//! 2. **Secure Random**: `rand::rngs::OsRng` for cryptographic randomness
//! 3. **No Nonce Reuse**: Unique random nonce for every write

mod codec;
mod encryption;
mod kdf;

pub use codec::{record_aad, SymmetricCodec};
pub use encryption::{decrypt, encrypt, EncryptionKey, Nonce, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
pub use kdf::{derive_storage_key, key_fingerprint};
