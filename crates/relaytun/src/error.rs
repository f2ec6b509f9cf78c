//! Tunnel errors and inbound outcomes.
//!
//! Outbound failures are errors: the caller asked for a send and it did not
//! happen. Inbound failures are not. Every peer sees every relay message and
//! most of them are not addressed to it, so an inbound message that goes
//! nowhere is reported as an [`InboundOutcome`], never as an error.

use relaytun_core::{PacketError, PacketKind};
use thiserror::Error;

use crate::transport::RelayError;

#[derive(Debug, Error)]
pub enum TunnelError {
    #[error("no public key known for {0}")]
    KeyUnavailable(String),

    #[error("packet type {0} is not registered")]
    UnknownPacketType(PacketKind),

    #[error("packet could not be encoded: {0}")]
    Encode(PacketError),

    #[error("encryption failed: {0}")]
    EncryptionFailed(#[from] relaytun_core::crypto::CryptoError),

    #[error("relay message is {len} characters, limit is {max}")]
    MessageTooLong { len: usize, max: usize },

    #[error("relay send failed: {0}")]
    Relay(#[from] RelayError),
}

impl From<PacketError> for TunnelError {
    fn from(e: PacketError) -> Self {
        match e {
            PacketError::UnregisteredKind(kind) => Self::UnknownPacketType(kind),
            other => Self::Encode(other),
        }
    }
}

/// Why an inbound tunnel message was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DropReason {
    #[error("payload is not valid relay-safe text")]
    TextDecode,

    #[error("no local private key")]
    KeyUnavailable,

    #[error("payload does not decrypt with the local key")]
    Decrypt,

    #[error("payload does not decompress")]
    Decompress,

    #[error("packet rejected: {0}")]
    Decode(PacketError),

    #[error("packet claims a sender the relay did not report")]
    SenderMismatch,
}

/// What happened to one relay message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// No envelope header. Ordinary relay text.
    NotTunnel,
    /// Our own envelope, reflected back by the relay.
    Echo,
    Dropped(DropReason),
    /// Authenticated and handed to its handler.
    Dispatched(PacketKind),
    /// Authenticated, but no handler is registered for the variant.
    Unhandled(PacketKind),
}

impl InboundOutcome {
    /// True when the message was tunnel traffic meant for this peer and
    /// should not be shown as plain relay text.
    pub fn is_handled(&self) -> bool {
        matches!(
            self,
            Self::Echo | Self::Dispatched(_) | Self::Unhandled(_)
        )
    }
}
