//! Routes authenticated packets to application handlers by variant.

use std::collections::HashMap;
use std::sync::Arc;

use relaytun_core::{Packet, PacketKind, Peer};

/// Application callback for one packet variant.
///
/// Errors are caught by the tunnel, logged, and reported through
/// [`Feedback`](crate::transport::Feedback). They never reach the relay loop.
pub trait PacketHandler: Send + Sync {
    fn handle(&self, packet: &Packet) -> anyhow::Result<()>;
}

impl<F> PacketHandler for F
where
    F: Fn(&Packet) -> anyhow::Result<()> + Send + Sync,
{
    fn handle(&self, packet: &Packet) -> anyhow::Result<()> {
        self(packet)
    }
}

/// At most one handler per packet variant.
#[derive(Default)]
pub struct PacketDispatcher {
    handlers: HashMap<PacketKind, Arc<dyn PacketHandler>>,
}

impl PacketDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the handler for `kind`, returning the one it replaces.
    pub fn register(
        &mut self,
        kind: PacketKind,
        handler: Arc<dyn PacketHandler>,
    ) -> Option<Arc<dyn PacketHandler>> {
        self.handlers.insert(kind, handler)
    }

    pub fn has_handler(&self, kind: PacketKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Run the handler for this packet's variant.
    /// Returns `None` if no handler is registered.
    pub fn dispatch(&self, packet: &Packet) -> Option<anyhow::Result<()>> {
        self.handlers
            .get(&packet.kind())
            .map(|handler| handler.handle(packet))
    }
}

impl std::fmt::Debug for PacketDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().map(PacketKind::name).collect();
        kinds.sort_unstable();
        f.debug_struct("PacketDispatcher")
            .field("handlers", &kinds)
            .finish()
    }
}

// ── Observation ───────────────────────────────────────────────────────────────

/// Direction a packet is travelling when an observer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketFlow {
    /// About to be handed to the relay. `peer` is the recipient.
    Outbound,
    /// Authenticated and about to be dispatched. `peer` is the author.
    Inbound,
}

/// Sees every packet that crosses the tunnel, in both directions.
pub trait PacketObserver: Send + Sync {
    fn observe(&self, flow: PacketFlow, peer: &Peer, packet: &Packet);
}

/// Dumps observed packets to the log as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl PacketObserver for LogObserver {
    fn observe(&self, flow: PacketFlow, peer: &Peer, packet: &Packet) {
        match serde_json::to_string(packet) {
            Ok(json) => tracing::info!(
                ?flow,
                peer = %peer,
                kind = %packet.kind(),
                packet = %json,
                "packet"
            ),
            Err(e) => tracing::warn!(
                ?flow,
                kind = %packet.kind(),
                error = %e,
                "packet not serializable"
            ),
        }
    }
}
