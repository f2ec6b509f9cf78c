//! relaytun-core — wire constants, codecs, and cryptographic primitives.
//! The tunnel crate and every application built on it depend on this one.

pub mod codec;
pub mod compress;
pub mod config;
pub mod crypto;
pub mod packet;
pub mod registry;
pub mod textsafe;
pub mod wire;

pub use config::TunnelConfig;
pub use crypto::{Keypair, RsaPrivateKey, RsaPublicKey};
pub use packet::{GameKind, Packet, PacketError, PacketKind, Peer};
pub use registry::PacketRegistry;
