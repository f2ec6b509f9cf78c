//! Packet codec registry — maps wire type ids to per-variant codecs.
//!
//! A frame on the wire is `varint type_id || body`. The registry owns the
//! mapping in both directions: `PacketKind -> type_id` for encoding and
//! `type_id -> decoder` for decoding. Ids are assigned by the caller; the
//! standard registry numbers the variants in registration order.

use std::collections::HashMap;

use crate::codec::{PacketReader, PacketWriter};
use crate::packet::{
    MalformedReason, MessagePacket, Packet, PacketBody, PacketError, PacketKind,
    PutConnectFourPiecePacket, PutTicTacToeMarkPacket, StartTwoPlayerGamePacket,
};

/// Writes the body of one variant. Fails on the wrong variant.
pub type EncodeFn = fn(&Packet, &mut PacketWriter) -> Result<(), PacketError>;

/// Reads the body of one variant.
pub type DecodeFn = fn(&mut PacketReader<'_>) -> Result<Packet, PacketError>;

#[derive(Clone, Copy)]
struct PacketCodec {
    kind: PacketKind,
    encode: EncodeFn,
    decode: DecodeFn,
}

fn encode_body<T: PacketBody>(packet: &Packet, w: &mut PacketWriter) -> Result<(), PacketError> {
    T::from_packet(packet)
        .ok_or(PacketError::UnregisteredKind(packet.kind()))?
        .write(w)
}

fn decode_body<T: PacketBody>(r: &mut PacketReader<'_>) -> Result<Packet, PacketError> {
    T::read(r).map(T::into_packet)
}

/// Type id ↔ codec table.
#[derive(Clone, Default)]
pub struct PacketRegistry {
    by_id: HashMap<u32, PacketCodec>,
    ids: HashMap<PacketKind, u32>,
}

impl PacketRegistry {
    /// An empty registry. Decoding anything fails until variants are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry every peer uses: all four variants, ids 0..=3.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        // Ids are fixed. Append only.
        registry.insert_body::<MessagePacket>(0);
        registry.insert_body::<StartTwoPlayerGamePacket>(1);
        registry.insert_body::<PutTicTacToeMarkPacket>(2);
        registry.insert_body::<PutConnectFourPiecePacket>(3);
        registry
    }

    fn insert_body<T: PacketBody>(&mut self, type_id: u32) {
        let codec = PacketCodec {
            kind: T::KIND,
            encode: encode_body::<T>,
            decode: decode_body::<T>,
        };
        self.by_id.insert(type_id, codec);
        self.ids.insert(T::KIND, type_id);
    }

    /// Register a codec pair for `kind` under `type_id`.
    pub fn register(
        &mut self,
        type_id: u32,
        kind: PacketKind,
        encode: EncodeFn,
        decode: DecodeFn,
    ) -> Result<(), PacketError> {
        if self.by_id.contains_key(&type_id) {
            return Err(PacketError::DuplicateTypeId(type_id));
        }
        if self.ids.contains_key(&kind) {
            return Err(PacketError::DuplicateKind(kind));
        }
        self.by_id.insert(type_id, PacketCodec { kind, encode, decode });
        self.ids.insert(kind, type_id);
        Ok(())
    }

    /// Register a variant through its `PacketBody` layout.
    pub fn register_body<T: PacketBody>(&mut self, type_id: u32) -> Result<(), PacketError> {
        self.register(type_id, T::KIND, encode_body::<T>, decode_body::<T>)
    }

    /// Type id assigned to `kind`, if registered.
    pub fn type_id(&self, kind: PacketKind) -> Option<u32> {
        self.ids.get(&kind).copied()
    }

    /// Variant registered under `type_id`, if any.
    pub fn kind(&self, type_id: u32) -> Option<PacketKind> {
        self.by_id.get(&type_id).map(|codec| codec.kind)
    }

    /// Encode a packet body (without the type id).
    pub fn encode(&self, packet: &Packet) -> Result<Vec<u8>, PacketError> {
        let (_, codec) = self.codec_for(packet.kind())?;
        let mut w = PacketWriter::new();
        (codec.encode)(packet, &mut w)?;
        Ok(w.into_bytes())
    }

    /// Decode a body previously produced for `type_id`.
    ///
    /// The body must be consumed exactly: trailing bytes are a protocol
    /// violation, not padding.
    pub fn decode(&self, type_id: u32, body: &[u8]) -> Result<Packet, PacketError> {
        let codec = self
            .by_id
            .get(&type_id)
            .ok_or(PacketError::UnknownPacketType(type_id))?;
        let mut r = PacketReader::new(body);
        let packet = (codec.decode)(&mut r)?;
        Self::finish(&r)?;
        Ok(packet)
    }

    /// Encode a full frame: `varint type_id || body`.
    pub fn encode_frame(&self, packet: &Packet) -> Result<Vec<u8>, PacketError> {
        let (type_id, codec) = self.codec_for(packet.kind())?;
        let mut w = PacketWriter::new();
        w.write_varint(type_id);
        (codec.encode)(packet, &mut w)?;
        Ok(w.into_bytes())
    }

    /// Decode a full frame produced by `encode_frame`.
    pub fn decode_frame(&self, frame: &[u8]) -> Result<Packet, PacketError> {
        let mut r = PacketReader::new(frame);
        let type_id = r.read_varint()?;
        let codec = self
            .by_id
            .get(&type_id)
            .ok_or(PacketError::UnknownPacketType(type_id))?;
        let packet = (codec.decode)(&mut r)?;
        Self::finish(&r)?;
        Ok(packet)
    }

    fn codec_for(&self, kind: PacketKind) -> Result<(u32, &PacketCodec), PacketError> {
        self.ids
            .get(&kind)
            .and_then(|id| self.by_id.get(id).map(|codec| (*id, codec)))
            .ok_or(PacketError::UnregisteredKind(kind))
    }

    fn finish(r: &PacketReader<'_>) -> Result<(), PacketError> {
        match r.remaining() {
            0 => Ok(()),
            n => Err(PacketError::Malformed(MalformedReason::TrailingBytes(n))),
        }
    }
}

impl std::fmt::Debug for PacketRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut entries: Vec<_> = self.ids.iter().map(|(k, id)| (*id, k.name())).collect();
        entries.sort_unstable();
        f.debug_map().entries(entries).finish()
    }
}
