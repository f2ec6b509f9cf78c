//! Text-safe codec. Carries arbitrary bytes through a relay that only
//! transmits printable text.
//!
//! Bytes are packed big-endian into 14-bit groups, each written as one
//! character from U+4E00..U+8DFF (CJK Unified Ideographs). A trailing group
//! of at most 7 bits is written as one character from the tail repertoire
//! U+3400..U+347F (CJK Extension A). Padding is always shorter than a byte,
//! so the decoder recovers the exact byte count without a length prefix.
//!
//! Every character is a single UTF-16 code unit, so the relay's length limit
//! counts one per character: 256 bytes of ciphertext become 147 characters.

use thiserror::Error;

const FULL_BASE: u32 = 0x4E00;
const FULL_BITS: u32 = 14;
const FULL_MASK: u32 = (1 << FULL_BITS) - 1;

const TAIL_BASE: u32 = 0x3400;
const TAIL_BITS: u32 = 7;
const TAIL_MASK: u32 = (1 << TAIL_BITS) - 1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextCodecError {
    #[error("character {ch:?} at position {position} is outside the text-safe alphabet")]
    InvalidChar { ch: char, position: usize },

    #[error("tail character at position {position} is not the last character")]
    TailNotLast { position: usize },
}

/// Number of characters `encode` produces for `len` input bytes.
pub fn encoded_len(len: usize) -> usize {
    let bits = len * 8;
    let full = bits / FULL_BITS as usize;
    match bits % FULL_BITS as usize {
        0 => full,
        _ => full + 1,
    }
}

/// Encode bytes as relay-safe text.
pub fn encode(data: &[u8]) -> String {
    // Every character in both repertoires is three bytes of UTF-8.
    let mut out = String::with_capacity(encoded_len(data.len()) * 3);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;

    for &byte in data {
        acc = (acc << 8) | u32::from(byte);
        bits += 8;
        while bits >= FULL_BITS {
            bits -= FULL_BITS;
            out.push(glyph(FULL_BASE, (acc >> bits) & FULL_MASK));
        }
        acc &= (1 << bits) - 1;
    }

    if bits > 0 {
        if bits <= TAIL_BITS {
            out.push(glyph(TAIL_BASE, (acc << (TAIL_BITS - bits)) & TAIL_MASK));
        } else {
            out.push(glyph(FULL_BASE, (acc << (FULL_BITS - bits)) & FULL_MASK));
        }
    }

    out
}

/// Decode relay-safe text back into bytes.
///
/// Padding bits left over after the last whole byte are discarded.
pub fn decode(text: &str) -> Result<Vec<u8>, TextCodecError> {
    let mut out = Vec::with_capacity(text.len() * 14 / 24 + 1);
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut tail_at: Option<usize> = None;

    for (position, ch) in text.chars().enumerate() {
        if let Some(tail) = tail_at {
            return Err(TextCodecError::TailNotLast { position: tail });
        }

        let cp = u32::from(ch);
        if (FULL_BASE..=FULL_BASE + FULL_MASK).contains(&cp) {
            acc = (acc << FULL_BITS) | (cp - FULL_BASE);
            bits += FULL_BITS;
        } else if (TAIL_BASE..=TAIL_BASE + TAIL_MASK).contains(&cp) {
            acc = (acc << TAIL_BITS) | (cp - TAIL_BASE);
            bits += TAIL_BITS;
            tail_at = Some(position);
        } else {
            return Err(TextCodecError::InvalidChar { ch, position });
        }

        while bits >= 8 {
            bits -= 8;
            out.push((acc >> bits) as u8);
        }
        acc &= (1 << bits) - 1;
    }

    Ok(out)
}

fn glyph(base: u32, value: u32) -> char {
    // Both repertoires sit well below the surrogate block.
    char::from_u32(base + value).expect("text-safe repertoire contains only scalar values")
}
