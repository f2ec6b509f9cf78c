//! In-memory relay for demos and tests.
//!
//! Behaves like the real relay in the ways the tunnel cares about:
//!   - `"<whisper> <name> <body>"` delivers `<body>` to `<name>` and echoes
//!     it back to the sender
//!   - anything else is broadcast to every participant, sender included
//!   - the reported author is always the participant who sent it
//!   - messages over the length budget are refused

use std::sync::Arc;

use dashmap::DashMap;
use relaytun_core::Peer;
use tokio::sync::mpsc;

use crate::transport::{Relay, RelayError, RelayMessage};

#[derive(Clone)]
struct Member {
    peer: Peer,
    inbox: mpsc::UnboundedSender<RelayMessage>,
}

/// Shared relay state. Cheap to clone.
#[derive(Clone)]
pub struct RelayHub {
    // display name -> member
    members: Arc<DashMap<String, Member>>,
    max_message_len: usize,
    whisper_command: String,
}

impl RelayHub {
    pub fn new(max_message_len: usize, whisper_command: impl Into<String>) -> Self {
        Self {
            members: Arc::new(DashMap::new()),
            max_message_len,
            whisper_command: whisper_command.into(),
        }
    }

    /// Connect `peer` to the relay. Returns its outbound handle and inbox.
    /// A peer joining under a name already in use replaces the old member.
    pub fn join(&self, peer: Peer) -> (LoopbackRelay, mpsc::UnboundedReceiver<RelayMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        tracing::debug!(peer = %peer, "joined loopback relay");
        self.members.insert(
            peer.name.clone(),
            Member {
                peer: peer.clone(),
                inbox: tx,
            },
        );
        let relay = LoopbackRelay {
            hub: self.clone(),
            peer,
        };
        (relay, rx)
    }

    /// Disconnect the participant named `name`. Their inbox closes.
    pub fn leave(&self, name: &str) {
        self.members.remove(name);
    }

    pub fn members(&self) -> usize {
        self.members.len()
    }

    fn deliver(&self, to: &Member, text: &str, from: &Peer) {
        let msg = RelayMessage {
            text: text.to_string(),
            sender: from.clone(),
        };
        if to.inbox.send(msg).is_err() {
            tracing::debug!(peer = %to.peer, "inbox closed, message discarded");
        }
    }

    fn route(&self, from: &Peer, text: &str) -> Result<(), RelayError> {
        let len = text.chars().count();
        if len > self.max_message_len {
            return Err(RelayError::TooLong {
                len,
                max: self.max_message_len,
            });
        }

        let sender = self
            .members
            .get(&from.name)
            .map(|m| m.clone())
            .ok_or(RelayError::Disconnected)?;

        let mut parts = text.splitn(3, ' ');
        if parts.next() == Some(self.whisper_command.as_str()) {
            let (Some(name), Some(body)) = (parts.next(), parts.next()) else {
                return Err(RelayError::UnknownRecipient(String::new()));
            };
            let target = self
                .members
                .get(name)
                .map(|m| m.clone())
                .ok_or_else(|| RelayError::UnknownRecipient(name.to_string()))?;
            self.deliver(&target, body, from);
            self.deliver(&sender, body, from);
            return Ok(());
        }

        let everyone: Vec<Member> = self.members.iter().map(|m| m.value().clone()).collect();
        for member in &everyone {
            self.deliver(member, text, from);
        }
        Ok(())
    }
}

/// One participant's connection to a [`RelayHub`].
#[derive(Clone)]
pub struct LoopbackRelay {
    hub: RelayHub,
    peer: Peer,
}

impl LoopbackRelay {
    pub fn peer(&self) -> &Peer {
        &self.peer
    }
}

impl Relay for LoopbackRelay {
    fn send_text(&self, text: &str) -> Result<(), RelayError> {
        self.hub.route(&self.peer, text)
    }
}
