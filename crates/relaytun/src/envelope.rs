//! Envelope sealing: chunked RSA over a compressed frame.
//!
//! The compressed bytes are cut into 245-byte plaintext chunks, each chunk is
//! encrypted on its own, and the 256-byte ciphertexts are joined in order.
//! Position in the joined buffer is the only chunk index there is.

use relaytun_core::crypto::{decrypt_block, encrypt_block, CryptoError};
use relaytun_core::wire::{whole_chunk_len, CIPHERTEXT_CHUNK_LEN, PLAINTEXT_CHUNK_LEN};
use relaytun_core::{RsaPrivateKey, RsaPublicKey};

/// Encrypt `plaintext` for the holder of `key`.
///
/// All or nothing: if any chunk fails, no ciphertext is returned.
pub fn seal(key: &RsaPublicKey, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let chunks = plaintext.chunks(PLAINTEXT_CHUNK_LEN);
    let mut out = Vec::with_capacity(chunks.len() * CIPHERTEXT_CHUNK_LEN);
    for chunk in chunks {
        out.extend_from_slice(&encrypt_block(key, chunk)?);
    }
    Ok(out)
}

/// Decrypt a joined ciphertext buffer.
///
/// A trailing partial chunk is ignored; the relay may cut long messages.
pub fn open(key: &RsaPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let whole = &ciphertext[..whole_chunk_len(ciphertext.len())];
    let mut out = Vec::with_capacity(whole.len());
    for chunk in whole.chunks_exact(CIPHERTEXT_CHUNK_LEN) {
        out.extend_from_slice(&decrypt_block(key, chunk)?);
    }
    Ok(out)
}
