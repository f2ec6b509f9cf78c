//! Packet variants carried through the tunnel.
//!
//! A closed set: chat messages, two-player game invitations, and game moves.
//! Every variant names its author twice, as a display name and as a stable
//! UUID. Both travel on the wire and both are checked against the identity
//! the relay reports for the envelope before a packet is dispatched.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::codec::{PacketReader, PacketWriter};

/// Longest accepted display name, in characters.
pub const MAX_SENDER_CHARS: usize = 64;

/// Longest accepted chat message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 256;

/// Longest accepted namespaced identifier, in characters.
pub const MAX_ID_CHARS: usize = 64;

/// Tic-tac-toe board edge length.
pub const TIC_TAC_TOE_SIZE: u8 = 3;

/// Connect-four board width in columns.
pub const CONNECT_FOUR_WIDTH: i32 = 7;

// ── Identity ──────────────────────────────────────────────────────────────────

/// A relay participant as the relay itself reports it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Peer {
    /// Display name, as the relay shows it.
    pub name: String,
    /// Stable unique identity.
    pub id: Uuid,
}

impl Peer {
    pub fn new(name: impl Into<String>, id: Uuid) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

impl std::fmt::Display for Peer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

// ── Discriminants ─────────────────────────────────────────────────────────────

/// Packet variant discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketKind {
    Message,
    StartTwoPlayerGame,
    PutTicTacToeMark,
    PutConnectFourPiece,
}

impl PacketKind {
    /// Namespaced, human-readable name. Used in logs and by observers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Message => "relaytun:message",
            Self::StartTwoPlayerGame => "relaytun:start_two_player_game",
            Self::PutTicTacToeMark => "relaytun:put_tic_tac_toe_mark",
            Self::PutConnectFourPiece => "relaytun:put_connect_four_piece",
        }
    }
}

impl std::fmt::Display for PacketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which two-player game an invitation refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    TicTacToe,
    ConnectFour,
}

impl GameKind {
    pub fn id(&self) -> &'static str {
        match self {
            Self::TicTacToe => "relaytun:tictactoe",
            Self::ConnectFour => "relaytun:connectfour",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "relaytun:tictactoe" => Some(Self::TicTacToe),
            "relaytun:connectfour" => Some(Self::ConnectFour),
            _ => None,
        }
    }
}

// ── Variants ──────────────────────────────────────────────────────────────────

/// Private chat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePacket {
    pub sender: String,
    pub sender_id: Uuid,
    pub message: String,
}

/// Game invitation (`accept == false`) or acceptance of one (`accept == true`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartTwoPlayerGamePacket {
    pub sender: String,
    pub sender_id: Uuid,
    pub accept: bool,
    pub game: GameKind,
}

/// Tic-tac-toe move at column `x`, row `y`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutTicTacToeMarkPacket {
    pub sender: String,
    pub sender_id: Uuid,
    pub x: u8,
    pub y: u8,
}

/// Connect-four move dropping a piece into column `x`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutConnectFourPiecePacket {
    pub sender: String,
    pub sender_id: Uuid,
    pub x: i32,
}

/// Every packet the tunnel can carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Packet {
    Message(MessagePacket),
    StartTwoPlayerGame(StartTwoPlayerGamePacket),
    PutTicTacToeMark(PutTicTacToeMarkPacket),
    PutConnectFourPiece(PutConnectFourPiecePacket),
}

impl Packet {
    /// Create a chat message authored by `from`.
    pub fn message(from: &Peer, message: impl Into<String>) -> Self {
        Self::Message(MessagePacket {
            sender: from.name.clone(),
            sender_id: from.id,
            message: message.into(),
        })
    }

    /// Create a game invitation, or an acceptance when `accept` is true.
    pub fn start_game(from: &Peer, game: GameKind, accept: bool) -> Self {
        Self::StartTwoPlayerGame(StartTwoPlayerGamePacket {
            sender: from.name.clone(),
            sender_id: from.id,
            accept,
            game,
        })
    }

    pub fn tic_tac_toe_mark(from: &Peer, x: u8, y: u8) -> Self {
        Self::PutTicTacToeMark(PutTicTacToeMarkPacket {
            sender: from.name.clone(),
            sender_id: from.id,
            x,
            y,
        })
    }

    pub fn connect_four_piece(from: &Peer, x: i32) -> Self {
        Self::PutConnectFourPiece(PutConnectFourPiecePacket {
            sender: from.name.clone(),
            sender_id: from.id,
            x,
        })
    }

    pub fn kind(&self) -> PacketKind {
        match self {
            Self::Message(_) => PacketKind::Message,
            Self::StartTwoPlayerGame(_) => PacketKind::StartTwoPlayerGame,
            Self::PutTicTacToeMark(_) => PacketKind::PutTicTacToeMark,
            Self::PutConnectFourPiece(_) => PacketKind::PutConnectFourPiece,
        }
    }

    /// Display name the packet claims as its author.
    pub fn sender(&self) -> &str {
        match self {
            Self::Message(p) => &p.sender,
            Self::StartTwoPlayerGame(p) => &p.sender,
            Self::PutTicTacToeMark(p) => &p.sender,
            Self::PutConnectFourPiece(p) => &p.sender,
        }
    }

    /// Stable id the packet claims as its author.
    pub fn sender_id(&self) -> Uuid {
        match self {
            Self::Message(p) => p.sender_id,
            Self::StartTwoPlayerGame(p) => p.sender_id,
            Self::PutTicTacToeMark(p) => p.sender_id,
            Self::PutConnectFourPiece(p) => p.sender_id,
        }
    }

    /// True when both claimed identity fields equal `author`.
    pub fn is_authored_by(&self, author: &Peer) -> bool {
        self.sender() == author.name && self.sender_id() == author.id
    }
}

// ── Body codecs ───────────────────────────────────────────────────────────────

/// Wire layout of one packet variant.
///
/// `read` must consume exactly the bytes `write` produced; the registry
/// rejects any body that leaves bytes behind.
pub trait PacketBody: Sized {
    const KIND: PacketKind;

    fn write(&self, w: &mut PacketWriter) -> Result<(), PacketError>;

    fn read(r: &mut PacketReader<'_>) -> Result<Self, PacketError>;

    fn into_packet(self) -> Packet;

    fn from_packet(packet: &Packet) -> Option<&Self>;
}

fn write_author(w: &mut PacketWriter, sender: &str, sender_id: &Uuid) -> Result<(), PacketError> {
    w.write_string(sender, MAX_SENDER_CHARS)?;
    w.write_uuid(sender_id);
    Ok(())
}

fn read_author(r: &mut PacketReader<'_>) -> Result<(String, Uuid), PacketError> {
    let sender = r.read_string(MAX_SENDER_CHARS)?;
    let sender_id = r.read_uuid()?;
    Ok((sender, sender_id))
}

fn check_tic_tac_toe(x: u8, y: u8) -> Result<(), PacketError> {
    for (field, value) in [("x", x), ("y", y)] {
        if value >= TIC_TAC_TOE_SIZE {
            return Err(PacketError::Malformed(MalformedReason::OutOfRange {
                field,
                value: i64::from(value),
            }));
        }
    }
    Ok(())
}

fn check_connect_four(x: i32) -> Result<(), PacketError> {
    if !(0..CONNECT_FOUR_WIDTH).contains(&x) {
        return Err(PacketError::Malformed(MalformedReason::OutOfRange {
            field: "x",
            value: i64::from(x),
        }));
    }
    Ok(())
}

impl PacketBody for MessagePacket {
    const KIND: PacketKind = PacketKind::Message;

    fn write(&self, w: &mut PacketWriter) -> Result<(), PacketError> {
        write_author(w, &self.sender, &self.sender_id)?;
        w.write_string(&self.message, MAX_MESSAGE_CHARS)
    }

    fn read(r: &mut PacketReader<'_>) -> Result<Self, PacketError> {
        let (sender, sender_id) = read_author(r)?;
        let message = r.read_string(MAX_MESSAGE_CHARS)?;
        Ok(Self {
            sender,
            sender_id,
            message,
        })
    }

    fn into_packet(self) -> Packet {
        Packet::Message(self)
    }

    fn from_packet(packet: &Packet) -> Option<&Self> {
        match packet {
            Packet::Message(p) => Some(p),
            _ => None,
        }
    }
}

impl PacketBody for StartTwoPlayerGamePacket {
    const KIND: PacketKind = PacketKind::StartTwoPlayerGame;

    fn write(&self, w: &mut PacketWriter) -> Result<(), PacketError> {
        write_author(w, &self.sender, &self.sender_id)?;
        w.write_bool(self.accept);
        w.write_string(self.game.id(), MAX_ID_CHARS)
    }

    fn read(r: &mut PacketReader<'_>) -> Result<Self, PacketError> {
        let (sender, sender_id) = read_author(r)?;
        let accept = r.read_bool()?;
        let id = r.read_string(MAX_ID_CHARS)?;
        let game = GameKind::from_id(&id)
            .ok_or(PacketError::Malformed(MalformedReason::UnknownGame(id)))?;
        Ok(Self {
            sender,
            sender_id,
            accept,
            game,
        })
    }

    fn into_packet(self) -> Packet {
        Packet::StartTwoPlayerGame(self)
    }

    fn from_packet(packet: &Packet) -> Option<&Self> {
        match packet {
            Packet::StartTwoPlayerGame(p) => Some(p),
            _ => None,
        }
    }
}

impl PacketBody for PutTicTacToeMarkPacket {
    const KIND: PacketKind = PacketKind::PutTicTacToeMark;

    fn write(&self, w: &mut PacketWriter) -> Result<(), PacketError> {
        check_tic_tac_toe(self.x, self.y)?;
        write_author(w, &self.sender, &self.sender_id)?;
        w.write_u8(self.x);
        w.write_u8(self.y);
        Ok(())
    }

    fn read(r: &mut PacketReader<'_>) -> Result<Self, PacketError> {
        let (sender, sender_id) = read_author(r)?;
        let x = r.read_u8()?;
        let y = r.read_u8()?;
        check_tic_tac_toe(x, y)?;
        Ok(Self {
            sender,
            sender_id,
            x,
            y,
        })
    }

    fn into_packet(self) -> Packet {
        Packet::PutTicTacToeMark(self)
    }

    fn from_packet(packet: &Packet) -> Option<&Self> {
        match packet {
            Packet::PutTicTacToeMark(p) => Some(p),
            _ => None,
        }
    }
}

impl PacketBody for PutConnectFourPiecePacket {
    const KIND: PacketKind = PacketKind::PutConnectFourPiece;

    fn write(&self, w: &mut PacketWriter) -> Result<(), PacketError> {
        check_connect_four(self.x)?;
        write_author(w, &self.sender, &self.sender_id)?;
        w.write_varint_i32(self.x);
        Ok(())
    }

    fn read(r: &mut PacketReader<'_>) -> Result<Self, PacketError> {
        let (sender, sender_id) = read_author(r)?;
        let x = r.read_varint_i32()?;
        check_connect_four(x)?;
        Ok(Self { sender, sender_id, x })
    }

    fn into_packet(self) -> Packet {
        Packet::PutConnectFourPiece(self)
    }

    fn from_packet(packet: &Packet) -> Option<&Self> {
        match packet {
            Packet::PutConnectFourPiece(p) => Some(p),
            _ => None,
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Why a packet body could not be read or written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    #[error("body ends before the layout is complete")]
    Truncated,

    #[error("{0} bytes left unread after the body")]
    TrailingBytes(usize),

    #[error("varint longer than 5 bytes")]
    VarIntTooLong,

    #[error("boolean byte 0x{0:02x} is neither 0 nor 1")]
    InvalidBool(u8),

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("string of {len} exceeds limit {max}")]
    StringTooLong { len: usize, max: usize },

    #[error("unknown game id {0:?}")]
    UnknownGame(String),

    #[error("field {field} = {value} is out of range")]
    OutOfRange { field: &'static str, value: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    #[error("unknown packet type id {0}")]
    UnknownPacketType(u32),

    #[error("packet kind {0} is not registered")]
    UnregisteredKind(PacketKind),

    #[error("malformed packet: {0}")]
    Malformed(MalformedReason),

    #[error("packet type id {0} is already registered")]
    DuplicateTypeId(u32),

    #[error("packet kind {0} is already registered")]
    DuplicateKind(PacketKind),
}
