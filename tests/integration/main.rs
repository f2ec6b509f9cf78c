//! Relaytun integration test harness.
//!
//! Every test builds its own loopback relay and its own peers, so tests are
//! independent and need no network. RSA keys are generated once per run:
//! key generation dominates the runtime otherwise.
//!
//!   cargo test --test integration

use std::sync::{Arc, Mutex, OnceLock};

use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use relaytun::{InboundOutcome, KeyRing, RelayHub, RelayMessage, Tunnel};
use relaytun_core::{Keypair, Packet, PacketKind, PacketRegistry, Peer, TunnelConfig};

mod limits;
mod roundtrip;
mod security;

// ── Harness ───────────────────────────────────────────────────────────────────

pub const ALL_KINDS: [PacketKind; 4] = [
    PacketKind::Message,
    PacketKind::StartTwoPlayerGame,
    PacketKind::PutTicTacToeMark,
    PacketKind::PutConnectFourPiece,
];

pub fn alice() -> Peer {
    Peer::new("Alice", Uuid::from_u128(0xa11ce))
}

pub fn bob() -> Peer {
    Peer::new("Bob", Uuid::from_u128(0xb0b))
}

pub fn mallory() -> Peer {
    Peer::new("Mallory", Uuid::from_u128(0x3a11))
}

/// Keypairs for Alice, Bob and Mallory, in that order.
pub fn keys() -> &'static [Keypair; 3] {
    static KEYS: OnceLock<[Keypair; 3]> = OnceLock::new();
    KEYS.get_or_init(|| {
        [
            Keypair::generate().unwrap(),
            Keypair::generate().unwrap(),
            Keypair::generate().unwrap(),
        ]
    })
}

fn keypair_of(peer: &Peer) -> &'static Keypair {
    let k = keys();
    match peer.name.as_str() {
        "Alice" => &k[0],
        "Bob" => &k[1],
        _ => &k[2],
    }
}

/// One peer on the relay: its tunnel, its inbox and every packet its
/// handlers have been given.
pub struct Node {
    pub peer: Peer,
    pub tunnel: Arc<Tunnel>,
    pub inbox: UnboundedReceiver<RelayMessage>,
    pub received: Arc<Mutex<Vec<Packet>>>,
}

impl Node {
    /// Join `hub` as `peer`, knowing the public keys of everyone in `contacts`.
    pub fn join(hub: &RelayHub, peer: Peer, contacts: &[Peer], config: TunnelConfig) -> Self {
        Self::join_with_registry(hub, peer, contacts, config, PacketRegistry::standard())
    }

    pub fn join_with_registry(
        hub: &RelayHub,
        peer: Peer,
        contacts: &[Peer],
        config: TunnelConfig,
        registry: PacketRegistry,
    ) -> Self {
        let ring = KeyRing::with_own(keypair_of(&peer).clone());
        for contact in contacts {
            ring.insert(contact.id, keypair_of(contact).public.clone());
        }
        let (relay, inbox) = hub.join(peer.clone());
        let mut tunnel = Tunnel::new(config, peer.clone(), Arc::new(ring), Arc::new(relay))
            .with_registry(registry);

        let received = Arc::new(Mutex::new(Vec::new()));
        for kind in ALL_KINDS {
            let sink = received.clone();
            tunnel.register_handler(
                kind,
                Arc::new(move |packet: &Packet| -> anyhow::Result<()> {
                    sink.lock().unwrap().push(packet.clone());
                    Ok(())
                }),
            );
        }

        Self {
            peer,
            tunnel: Arc::new(tunnel),
            inbox,
            received,
        }
    }

    /// Feed every queued relay message through the tunnel, in order.
    pub fn pump(&mut self) -> Vec<InboundOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(msg) = self.inbox.try_recv() {
            outcomes.push(self.tunnel.on_text(&msg.text, &msg.sender));
        }
        outcomes
    }

    /// Raw queued relay messages, without processing them.
    pub fn drain(&mut self) -> Vec<RelayMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.inbox.try_recv() {
            out.push(msg);
        }
        out
    }

    pub fn received(&self) -> Vec<Packet> {
        self.received.lock().unwrap().clone()
    }
}

/// A default-config relay with Alice and Bob, who know each other's keys.
pub fn alice_and_bob() -> (RelayHub, Node, Node) {
    alice_and_bob_with(TunnelConfig::default())
}

pub fn alice_and_bob_with(config: TunnelConfig) -> (RelayHub, Node, Node) {
    let hub = RelayHub::new(config.relay.max_message_len, config.relay.whisper_command.clone());
    let a = Node::join(&hub, alice(), &[bob()], config.clone());
    let b = Node::join(&hub, bob(), &[alice()], config);
    (hub, a, b)
}
