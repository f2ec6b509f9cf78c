//! Cryptographic primitives for Relaytun.
//!
//! Provides two things:
//!   1. The block cipher adapter: RSA-2048 with PKCS#1 v1.5 padding, one
//!      245-byte plaintext block in, exactly one 256-byte ciphertext block out.
//!   2. Keypair handling and BLAKE3 key fingerprints for logs.
//!
//! Only one recipient can open an envelope: it is encrypted against that
//! recipient's public key and nothing else. There is no session state, so
//! there is no forward secrecy and no replay protection across envelopes.
//! The rsa crate wipes private key material on drop.

use std::sync::Arc;

use rsa::traits::PublicKeyParts;
use rsa::Pkcs1v15Encrypt;
use thiserror::Error;

use crate::wire::{CIPHERTEXT_CHUNK_LEN, PLAINTEXT_CHUNK_LEN, RSA_MODULUS_LEN};

pub use rsa::{RsaPrivateKey, RsaPublicKey};

/// Modulus size in bits of every key the tunnel accepts.
pub const RSA_BITS: usize = RSA_MODULUS_LEN * 8;

// ── BLAKE3 ────────────────────────────────────────────────────────────────────

/// Short hex fingerprint of a public key, for logs and diagnostics.
///
///   fingerprint = hex(BLAKE3(n_be || e_be)[..8])
pub fn key_fingerprint(key: &RsaPublicKey) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&key.n().to_bytes_be());
    hasher.update(&key.e().to_bytes_be());
    hex::encode(&hasher.finalize().as_bytes()[..8])
}

// ── Block cipher ──────────────────────────────────────────────────────────────

/// Encrypt one plaintext block against `key`.
///
/// The block must be at most 245 bytes. The result is always exactly
/// 256 bytes; anything else is reported as an error so a short ciphertext
/// can never be spliced into an envelope.
pub fn encrypt_block(key: &RsaPublicKey, block: &[u8]) -> Result<Vec<u8>, CryptoError> {
    check_key_size(key)?;
    if block.len() > PLAINTEXT_CHUNK_LEN {
        return Err(CryptoError::BlockTooLarge(block.len()));
    }

    let ciphertext = key.encrypt(&mut rand::thread_rng(), Pkcs1v15Encrypt, block)?;
    if ciphertext.len() != CIPHERTEXT_CHUNK_LEN {
        return Err(CryptoError::CiphertextLength(ciphertext.len()));
    }
    Ok(ciphertext)
}

/// Decrypt one 256-byte ciphertext block with `key`.
///
/// Fails whenever the block was encrypted for somebody else, which is the
/// common case for a peer that sees every relay message.
pub fn decrypt_block(key: &RsaPrivateKey, block: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if block.len() != CIPHERTEXT_CHUNK_LEN {
        return Err(CryptoError::CiphertextLength(block.len()));
    }
    Ok(key.decrypt(Pkcs1v15Encrypt, block)?)
}

fn check_key_size(key: &RsaPublicKey) -> Result<(), CryptoError> {
    if key.size() != RSA_MODULUS_LEN {
        return Err(CryptoError::KeySize(key.size() * 8));
    }
    Ok(())
}

// ── Keypair ───────────────────────────────────────────────────────────────────

/// A peer's RSA-2048 keypair.
///
/// The tunnel never stores one of these itself: key providers hand out the
/// private half per inbound message and public halves per send. Cloning is
/// cheap because the private key is shared.
#[derive(Clone)]
pub struct Keypair {
    private: Arc<RsaPrivateKey>,
    /// Public key. Handed to peers so they can address envelopes to us.
    pub public: RsaPublicKey,
}

impl Keypair {
    /// Generate a new random RSA-2048 keypair.
    ///
    /// Slow in unoptimised builds; generate once and share.
    pub fn generate() -> Result<Self, CryptoError> {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), RSA_BITS)?;
        Self::from_private(private)
    }

    /// Wrap an existing private key. The modulus must be 2048 bits.
    pub fn from_private(private: RsaPrivateKey) -> Result<Self, CryptoError> {
        let public = private.to_public_key();
        check_key_size(&public)?;
        Ok(Self {
            private: Arc::new(private),
            public,
        })
    }

    /// Shared handle to the private key.
    pub fn private(&self) -> Arc<RsaPrivateKey> {
        Arc::clone(&self.private)
    }

    pub fn fingerprint(&self) -> String {
        key_fingerprint(&self.public)
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("fingerprint", &self.fingerprint())
            .finish_non_exhaustive()
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("RSA error: {0}")]
    Rsa(#[from] rsa::Error),

    #[error("key modulus is {0} bits, expected {}", RSA_BITS)]
    KeySize(usize),

    #[error("plaintext block of {0} bytes exceeds {}", PLAINTEXT_CHUNK_LEN)]
    BlockTooLarge(usize),

    #[error("ciphertext block is {0} bytes, expected {}", CIPHERTEXT_CHUNK_LEN)]
    CiphertextLength(usize),
}

// ── Tests ─────────────────────────────────────────────────────────────────────
