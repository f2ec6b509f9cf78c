//! relaytun — confidential packet tunnel over an untrusted text relay.
//!
//! A [`Tunnel`] owns everything one peer needs to speak the protocol: the
//! packet registry, the handler table, the echo filter and handles to the
//! relay and key provider. Sending is [`Tunnel::send_packet`]; every relay
//! message the peer sees goes through [`Tunnel::on_text`].

pub mod dispatch;
pub mod echo;
pub mod envelope;
pub mod error;
pub mod inbound;
pub mod loopback;
pub mod outbound;
pub mod relay_loop;
pub mod transport;
pub mod tunnel;

pub use dispatch::{LogObserver, PacketDispatcher, PacketFlow, PacketHandler, PacketObserver};
pub use echo::EchoFilter;
pub use error::{DropReason, InboundOutcome, TunnelError};
pub use loopback::{LoopbackRelay, RelayHub};
pub use relay_loop::{run_inbound, InboundStats};
pub use transport::{Feedback, KeyProvider, KeyRing, LogFeedback, Relay, RelayError, RelayMessage};
pub use tunnel::Tunnel;
