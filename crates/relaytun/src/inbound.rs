//! Inbound envelope pipeline.
//!
//! Every relay message the local peer sees passes through here, including
//! our own echoes and envelopes addressed to other peers. Failing to decrypt
//! is the normal case and is not an error.

use relaytun_core::wire::{fingerprint, ENVELOPE_HEADER};
use relaytun_core::{compress, textsafe, Packet, Peer};

use crate::dispatch::PacketFlow;
use crate::envelope;
use crate::error::{DropReason, InboundOutcome};
use crate::tunnel::Tunnel;

impl Tunnel {
    /// Process one relay message reported as authored by `sender`.
    ///
    /// Runs synchronously to completion: a handler, if any, has returned by
    /// the time this does.
    pub fn on_text(&self, text: &str, sender: &Peer) -> InboundOutcome {
        let Some(payload) = text.strip_prefix(ENVELOPE_HEADER) else {
            return InboundOutcome::NotTunnel;
        };
        let fp = fingerprint(payload);

        if *sender == self.local && self.echo.take(payload) {
            tracing::trace!(fingerprint = %fp, "own envelope echoed back");
            return InboundOutcome::Echo;
        }

        let packet = match self.unseal(payload, &fp) {
            Ok(packet) => packet,
            Err(reason) => return InboundOutcome::Dropped(reason),
        };

        if !packet.is_authored_by(sender) {
            tracing::warn!(
                fingerprint = %fp,
                reported = %sender,
                claimed = %packet.sender(),
                claimed_id = %packet.sender_id(),
                "packet sender does not match relay author, dropped"
            );
            return InboundOutcome::Dropped(DropReason::SenderMismatch);
        }

        let kind = packet.kind();
        self.notify(PacketFlow::Inbound, sender, &packet);

        match self.dispatcher.dispatch(&packet) {
            Some(Ok(())) => {
                tracing::debug!(fingerprint = %fp, %kind, sender = %sender, "packet dispatched");
                InboundOutcome::Dispatched(kind)
            }
            Some(Err(e)) => {
                tracing::warn!(%kind, sender = %sender, error = %e, "packet handler failed");
                self.feedback
                    .feedback(&format!("Error handling {kind} from {}: {e:#}", sender.name));
                InboundOutcome::Dispatched(kind)
            }
            None => {
                tracing::debug!(%kind, sender = %sender, "no handler for packet");
                InboundOutcome::Unhandled(kind)
            }
        }
    }

    /// Text-decode, decrypt, decompress and decode one envelope payload.
    fn unseal(&self, payload: &str, fp: &str) -> Result<Packet, DropReason> {
        let ciphertext = textsafe::decode(payload).map_err(|e| {
            tracing::debug!(fingerprint = %fp, error = %e, "envelope payload not decodable");
            DropReason::TextDecode
        })?;

        let Some(key) = self.keys.own_private_key() else {
            tracing::debug!(fingerprint = %fp, "no local private key, envelope skipped");
            return Err(DropReason::KeyUnavailable);
        };

        let compressed = envelope::open(&key, &ciphertext).map_err(|e| {
            tracing::debug!(fingerprint = %fp, error = %e, "envelope not addressed to us");
            DropReason::Decrypt
        })?;

        let frame = compress::decompress(&compressed, self.config.limits.max_decompressed_len)
            .map_err(|e| {
                tracing::debug!(fingerprint = %fp, error = %e, "envelope did not decompress");
                DropReason::Decompress
            })?;

        self.registry.decode_frame(&frame).map_err(|e| {
            tracing::warn!(fingerprint = %fp, error = %e, "packet rejected");
            DropReason::Decode(e)
        })
    }
}
