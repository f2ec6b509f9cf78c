//! Collaborators the tunnel consumes: the relay, the key provider and the
//! local feedback sink.

use std::sync::Arc;

use dashmap::DashMap;
use relaytun_core::crypto::key_fingerprint;
use relaytun_core::{Keypair, Peer, RsaPrivateKey, RsaPublicKey};
use thiserror::Error;
use uuid::Uuid;

// ── Relay ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    #[error("not connected to the relay")]
    Disconnected,

    #[error("no relay participant named {0}")]
    UnknownRecipient(String),

    #[error("relay refused a {len}-character message, limit is {max}")]
    TooLong { len: usize, max: usize },
}

/// Outbound half of the relay.
///
/// `send_text` hands one complete relay command to the relay. There is no
/// acknowledgement: `Ok` means the relay accepted it, nothing more.
pub trait Relay: Send + Sync {
    fn send_text(&self, text: &str) -> Result<(), RelayError>;
}

/// One message delivered by the relay, with the author the relay vouches for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayMessage {
    pub text: String,
    pub sender: Peer,
}

// ── Keys ──────────────────────────────────────────────────────────────────────

/// Source of key material. Looked up per send and per receive; the tunnel
/// never keeps keys of its own.
pub trait KeyProvider: Send + Sync {
    fn public_key_of(&self, peer: &Peer) -> Option<RsaPublicKey>;

    fn own_private_key(&self) -> Option<Arc<RsaPrivateKey>>;
}

/// In-memory key provider: public keys by peer id plus an optional own keypair.
#[derive(Default)]
pub struct KeyRing {
    own: Option<Keypair>,
    public: DashMap<Uuid, RsaPublicKey>,
}

impl KeyRing {
    /// A ring with no own keypair. Can send, never receives.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_own(keypair: Keypair) -> Self {
        tracing::debug!(fingerprint = %keypair.fingerprint(), "own keypair installed");
        Self {
            own: Some(keypair),
            public: DashMap::new(),
        }
    }

    /// Record a peer's public key. Returns the key it replaced, if any.
    pub fn insert(&self, peer_id: Uuid, key: RsaPublicKey) -> Option<RsaPublicKey> {
        tracing::debug!(
            peer = %peer_id,
            fingerprint = %key_fingerprint(&key),
            "peer public key recorded"
        );
        self.public.insert(peer_id, key)
    }

    pub fn remove(&self, peer_id: &Uuid) -> Option<RsaPublicKey> {
        self.public.remove(peer_id).map(|(_, key)| key)
    }

    pub fn len(&self) -> usize {
        self.public.len()
    }

    pub fn is_empty(&self) -> bool {
        self.public.is_empty()
    }
}

impl KeyProvider for KeyRing {
    fn public_key_of(&self, peer: &Peer) -> Option<RsaPublicKey> {
        self.public.get(&peer.id).map(|key| key.clone())
    }

    fn own_private_key(&self) -> Option<Arc<RsaPrivateKey>> {
        self.own.as_ref().map(Keypair::private)
    }
}

// ── Feedback ──────────────────────────────────────────────────────────────────

/// Best-effort channel for telling the local user something went wrong.
pub trait Feedback: Send + Sync {
    fn feedback(&self, message: &str);
}

/// Default feedback sink: writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFeedback;

impl Feedback for LogFeedback {
    fn feedback(&self, message: &str) {
        tracing::info!(feedback = message, "tunnel feedback");
    }
}
