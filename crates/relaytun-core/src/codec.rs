//! Field-level packet encoding.
//!
//! Layout rules shared by every packet variant:
//!   varint: unsigned LEB128, at most 5 bytes, 32-bit range
//!   string: varint byte length, then UTF-8 bytes
//!   uuid:   16 bytes, big-endian
//!   bool:   one byte, 0x00 or 0x01 and nothing else
//!   u8:     one byte
//!
//! Readers never panic on short input: every read is bounds-checked and
//! reports `Malformed(Truncated)`.

use bytes::{Buf, BufMut, BytesMut};
use uuid::Uuid;

use crate::packet::{MalformedReason, PacketError};

const VARINT_MAX_BYTES: usize = 5;

// ── Writer ────────────────────────────────────────────────────────────────────

/// Append-only packet body builder.
#[derive(Debug, Default)]
pub struct PacketWriter {
    buf: BytesMut,
}

impl PacketWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_varint(&mut self, value: u32) {
        let mut value = value;
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.put_u8(byte);
                return;
            }
            self.buf.put_u8(byte | 0x80);
        }
    }

    /// Signed ints travel as their two's-complement bit pattern.
    pub fn write_varint_i32(&mut self, value: i32) {
        self.write_varint(value as u32);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.put_u8(u8::from(value));
    }

    pub fn write_uuid(&mut self, value: &Uuid) {
        self.buf.put_slice(value.as_bytes());
    }

    /// Write a string, refusing anything longer than `max_chars`.
    pub fn write_string(&mut self, value: &str, max_chars: usize) -> Result<(), PacketError> {
        let chars = value.chars().count();
        if chars > max_chars {
            return Err(PacketError::Malformed(MalformedReason::StringTooLong {
                len: chars,
                max: max_chars,
            }));
        }
        self.write_varint(value.len() as u32);
        self.buf.put_slice(value.as_bytes());
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.to_vec()
    }
}

// ── Reader ────────────────────────────────────────────────────────────────────

/// Bounds-checked cursor over a packet body.
#[derive(Debug)]
pub struct PacketReader<'a> {
    buf: &'a [u8],
}

impl<'a> PacketReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    fn need(&self, n: usize) -> Result<(), PacketError> {
        if self.buf.remaining() < n {
            return Err(PacketError::Malformed(MalformedReason::Truncated));
        }
        Ok(())
    }

    pub fn read_varint(&mut self) -> Result<u32, PacketError> {
        let mut value: u32 = 0;
        for i in 0..VARINT_MAX_BYTES {
            self.need(1)?;
            let byte = self.buf.get_u8();
            value |= u32::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(PacketError::Malformed(MalformedReason::VarIntTooLong))
    }

    pub fn read_varint_i32(&mut self) -> Result<i32, PacketError> {
        Ok(self.read_varint()? as i32)
    }

    pub fn read_u8(&mut self) -> Result<u8, PacketError> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    pub fn read_bool(&mut self) -> Result<bool, PacketError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(PacketError::Malformed(MalformedReason::InvalidBool(other))),
        }
    }

    pub fn read_uuid(&mut self) -> Result<Uuid, PacketError> {
        self.need(16)?;
        let mut bytes = [0u8; 16];
        self.buf.copy_to_slice(&mut bytes);
        Ok(Uuid::from_bytes(bytes))
    }

    /// Read a string of at most `max_chars` characters.
    pub fn read_string(&mut self, max_chars: usize) -> Result<String, PacketError> {
        let len = self.read_varint()? as usize;
        // UTF-8 never needs more than 4 bytes per char.
        if len > max_chars * 4 {
            return Err(PacketError::Malformed(MalformedReason::StringTooLong {
                len,
                max: max_chars * 4,
            }));
        }
        self.need(len)?;
        let (raw, rest) = self.buf.split_at(len);
        let value = std::str::from_utf8(raw)
            .map_err(|_| PacketError::Malformed(MalformedReason::InvalidUtf8))?
            .to_owned();
        self.buf = rest;

        let chars = value.chars().count();
        if chars > max_chars {
            return Err(PacketError::Malformed(MalformedReason::StringTooLong {
                len: chars,
                max: max_chars,
            }));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_boundaries() {
        for (value, width) in [(0u32, 1), (127, 1), (128, 2), (16_383, 2), (16_384, 3), (u32::MAX, 5)] {
            let mut w = PacketWriter::new();
            w.write_varint(value);
            assert_eq!(w.len(), width, "width of {value}");
            let bytes = w.into_bytes();
            let mut r = PacketReader::new(&bytes);
            assert_eq!(r.read_varint().unwrap(), value);
            assert_eq!(r.remaining(), 0);
        }
    }

    #[test]
    fn negative_i32_survives() {
        let mut w = PacketWriter::new();
        w.write_varint_i32(-1);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 5);
        assert_eq!(PacketReader::new(&bytes).read_varint_i32().unwrap(), -1);
    }

    #[test]
    fn overlong_varint_is_malformed() {
        let bytes = [0x80u8; 6];
        assert_eq!(
            PacketReader::new(&bytes).read_varint(),
            Err(PacketError::Malformed(MalformedReason::VarIntTooLong))
        );
    }

    #[test]
    fn bool_must_be_zero_or_one() {
        assert_eq!(
            PacketReader::new(&[2]).read_bool(),
            Err(PacketError::Malformed(MalformedReason::InvalidBool(2)))
        );
        assert!(PacketReader::new(&[1]).read_bool().unwrap());
    }

    #[test]
    fn short_uuid_is_truncated() {
        assert_eq!(
            PacketReader::new(&[0u8; 15]).read_uuid(),
            Err(PacketError::Malformed(MalformedReason::Truncated))
        );
    }

    #[test]
    fn string_length_prefix_beyond_buffer_is_truncated() {
        let mut w = PacketWriter::new();
        w.write_varint(10);
        let mut bytes = w.into_bytes();
        bytes.extend_from_slice(b"abc");
        assert_eq!(
            PacketReader::new(&bytes).read_string(16),
            Err(PacketError::Malformed(MalformedReason::Truncated))
        );
    }

    #[test]
    fn string_limits_apply_both_ways() {
        let mut w = PacketWriter::new();
        assert!(w.write_string("abcdef", 5).is_err());
        w.write_string("abcde", 5).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(PacketReader::new(&bytes).read_string(5).unwrap(), "abcde");
        assert!(matches!(
            PacketReader::new(&bytes).read_string(4),
            Err(PacketError::Malformed(MalformedReason::StringTooLong { .. }))
        ));
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let bytes = [2u8, 0xff, 0xfe];
        assert_eq!(
            PacketReader::new(&bytes).read_string(8),
            Err(PacketError::Malformed(MalformedReason::InvalidUtf8))
        );
    }
}
