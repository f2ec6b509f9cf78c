//! Relaytun wire constants — the fixed numbers every peer must agree on.
//!
//! These values ARE the protocol. Changing the header literal or either
//! chunk size is a breaking change: envelopes produced by one version would
//! be silently dropped by the other.

use static_assertions::const_assert_eq;

// ── Envelope ──────────────────────────────────────────────────────────────────

/// Literal prefix of every tunnel envelope.
///
/// Receivers use it to tell tunnel traffic apart from ordinary relay text.
/// The `Ε` is GREEK CAPITAL LETTER EPSILON, which keeps the header from
/// colliding with anything a human would plausibly type.
pub const ENVELOPE_HEADER: &str = "TNLΕNC:";

// ── Chunking ──────────────────────────────────────────────────────────────────

/// Size in bytes of the RSA modulus used for every envelope (RSA-2048).
pub const RSA_MODULUS_LEN: usize = 256;

/// PKCS#1 v1.5 encryption padding overhead in bytes.
pub const PKCS1_PADDING_LEN: usize = 11;

/// Maximum plaintext bytes encrypted as one block.
pub const PLAINTEXT_CHUNK_LEN: usize = 245;

/// Exact size of one ciphertext block. Ciphertext chunks are positional:
/// chunk `i` occupies bytes `i * 256 .. (i + 1) * 256` of the joined buffer.
pub const CIPHERTEXT_CHUNK_LEN: usize = 256;

// A full plaintext chunk plus padding must fill the modulus exactly.
const_assert_eq!(PLAINTEXT_CHUNK_LEN + PKCS1_PADDING_LEN, RSA_MODULUS_LEN);
const_assert_eq!(CIPHERTEXT_CHUNK_LEN, RSA_MODULUS_LEN);

// ── Relay ─────────────────────────────────────────────────────────────────────

/// Default relay message budget, in characters, including the addressing
/// prefix and the header.
pub const DEFAULT_MAX_MESSAGE_LEN: usize = 256;

/// Default relay command used to address a single recipient.
pub const DEFAULT_WHISPER_COMMAND: &str = "w";

/// Default lifetime of a Recently-Sent entry, in seconds.
pub const DEFAULT_ECHO_WINDOW_SECS: u64 = 30;

/// Default maximum number of Recently-Sent entries held at once.
pub const DEFAULT_ECHO_CAPACITY: usize = 64;

/// Default upper bound on decompressed packet size in bytes.
pub const DEFAULT_MAX_DECOMPRESSED_LEN: usize = 65536;

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Number of plaintext (and therefore ciphertext) chunks a compressed payload
/// of `len` bytes occupies.
pub fn chunk_count(len: usize) -> usize {
    len.div_ceil(PLAINTEXT_CHUNK_LEN)
}

/// Largest prefix length of a ciphertext buffer that holds only whole chunks.
pub fn whole_chunk_len(len: usize) -> usize {
    len - len % CIPHERTEXT_CHUNK_LEN
}

/// Short, log-safe fingerprint of an envelope payload.
///
/// First 8 bytes of its BLAKE3 hash, hex-encoded. Never log the payload itself.
pub fn fingerprint(payload: &str) -> String {
    hex::encode(&blake3::hash(payload.as_bytes()).as_bytes()[..8])
}

// ── Tests ─────────────────────────────────────────────────────────────────────
