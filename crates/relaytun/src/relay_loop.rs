//! Relay receive loop. Feeds delivered messages through the tunnel one at
//! a time.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::InboundOutcome;
use crate::transport::RelayMessage;
use crate::tunnel::Tunnel;

/// Tally of what the loop saw before its channel closed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct InboundStats {
    pub plain: usize,
    pub echoes: usize,
    pub dropped: usize,
    pub dispatched: usize,
    pub unhandled: usize,
}

impl InboundStats {
    fn record(&mut self, outcome: &InboundOutcome) {
        match outcome {
            InboundOutcome::NotTunnel => self.plain += 1,
            InboundOutcome::Echo => self.echoes += 1,
            InboundOutcome::Dropped(_) => self.dropped += 1,
            InboundOutcome::Dispatched(_) => self.dispatched += 1,
            InboundOutcome::Unhandled(_) => self.unhandled += 1,
        }
    }
}

/// Process relay messages until every sender is gone.
///
/// Each message is fully handled, dispatch included, before the next one is
/// received. Plain relay text is passed to `on_plain`.
pub async fn run_inbound<F>(
    tunnel: Arc<Tunnel>,
    mut rx: mpsc::UnboundedReceiver<RelayMessage>,
    mut on_plain: F,
) -> InboundStats
where
    F: FnMut(&RelayMessage) + Send,
{
    let mut stats = InboundStats::default();
    while let Some(msg) = rx.recv().await {
        let outcome = tunnel.on_text(&msg.text, &msg.sender);
        if outcome == InboundOutcome::NotTunnel {
            on_plain(&msg);
        }
        stats.record(&outcome);
    }
    tracing::debug!(
        peer = %tunnel.local(),
        dispatched = stats.dispatched,
        dropped = stats.dropped,
        echoes = stats.echoes,
        "relay inbox closed"
    );
    stats
}
