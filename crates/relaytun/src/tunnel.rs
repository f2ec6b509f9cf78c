//! The tunnel context: one per local peer.

use std::sync::Arc;
use std::time::Duration;

use relaytun_core::{PacketKind, PacketRegistry, Peer, TunnelConfig};

use crate::dispatch::{PacketDispatcher, PacketFlow, PacketHandler, PacketObserver};
use crate::echo::EchoFilter;
use crate::transport::{Feedback, KeyProvider, LogFeedback, Relay};

/// Everything one peer needs to send and receive tunnel packets.
///
/// Construct it, register handlers, then share it (usually behind an `Arc`).
/// The echo filter is the only state mutated after setup and it is safe to
/// touch from several threads at once.
pub struct Tunnel {
    pub(crate) config: TunnelConfig,
    pub(crate) local: Peer,
    pub(crate) registry: PacketRegistry,
    pub(crate) dispatcher: PacketDispatcher,
    pub(crate) echo: EchoFilter,
    pub(crate) keys: Arc<dyn KeyProvider>,
    pub(crate) relay: Arc<dyn Relay>,
    pub(crate) feedback: Arc<dyn Feedback>,
    pub(crate) observers: Vec<Arc<dyn PacketObserver>>,
}

impl Tunnel {
    pub fn new(
        config: TunnelConfig,
        local: Peer,
        keys: Arc<dyn KeyProvider>,
        relay: Arc<dyn Relay>,
    ) -> Self {
        let echo = EchoFilter::new(
            Duration::from_secs(config.echo.window_secs),
            config.echo.capacity,
        );
        Self {
            config,
            local,
            registry: PacketRegistry::standard(),
            dispatcher: PacketDispatcher::new(),
            echo,
            keys,
            relay,
            feedback: Arc::new(LogFeedback),
            observers: Vec::new(),
        }
    }

    /// Replace the packet registry. Both ends must use the same ids.
    pub fn with_registry(mut self, registry: PacketRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_feedback(mut self, feedback: Arc<dyn Feedback>) -> Self {
        self.feedback = feedback;
        self
    }

    pub fn add_observer(&mut self, observer: Arc<dyn PacketObserver>) {
        self.observers.push(observer);
    }

    /// Install the handler for one packet variant, replacing any earlier one.
    pub fn register_handler(&mut self, kind: PacketKind, handler: Arc<dyn PacketHandler>) {
        if self.dispatcher.register(kind, handler).is_some() {
            tracing::debug!(%kind, "packet handler replaced");
        }
    }

    pub fn local(&self) -> &Peer {
        &self.local
    }

    pub fn config(&self) -> &TunnelConfig {
        &self.config
    }

    pub fn registry(&self) -> &PacketRegistry {
        &self.registry
    }

    /// Envelopes sent and not yet seen echoed back.
    pub fn pending_echoes(&self) -> usize {
        self.echo.len()
    }

    pub(crate) fn notify(&self, flow: PacketFlow, peer: &Peer, packet: &relaytun_core::Packet) {
        for observer in &self.observers {
            observer.observe(flow, peer, packet);
        }
    }
}

impl std::fmt::Debug for Tunnel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tunnel")
            .field("local", &self.local)
            .field("registry", &self.registry)
            .field("dispatcher", &self.dispatcher)
            .field("echo", &self.echo)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
