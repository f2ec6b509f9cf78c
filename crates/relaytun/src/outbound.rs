//! Outbound envelope pipeline.
//!
//!   frame → gzip → 245-byte chunks → RSA each → join → text-encode
//!   → "<whisper> <name> " + header + payload → relay
//!
//! Every step must succeed before the next runs. Nothing reaches the relay
//! unless the whole envelope was built and fits the message budget.

use relaytun_core::wire::{fingerprint, ENVELOPE_HEADER};
use relaytun_core::{compress, textsafe, Packet, Peer, RsaPublicKey};

use crate::dispatch::PacketFlow;
use crate::envelope;
use crate::error::TunnelError;
use crate::tunnel::Tunnel;

impl Tunnel {
    /// Encrypt `packet` for `recipient` and send it through the relay.
    ///
    /// A packet that cannot be compressed is dropped quietly: the call
    /// returns `Ok` and nothing is sent.
    pub fn send_packet(&self, packet: &Packet, recipient: &Peer) -> Result<(), TunnelError> {
        let key = self
            .keys
            .public_key_of(recipient)
            .ok_or_else(|| TunnelError::KeyUnavailable(recipient.to_string()))?;

        let Some(payload) = self.seal_payload(packet, &key)? else {
            return Ok(());
        };

        let text = self.address(recipient, &payload);
        let len = text.chars().count();
        let max = self.config.relay.max_message_len;
        if len > max {
            return Err(TunnelError::MessageTooLong { len, max });
        }

        self.notify(PacketFlow::Outbound, recipient, packet);
        // The relay may deliver the echo before send_text returns.
        self.echo.insert(&payload);
        if let Err(e) = self.relay.send_text(&text) {
            self.echo.forget(&payload);
            return Err(e.into());
        }

        tracing::debug!(
            kind = %packet.kind(),
            recipient = %recipient,
            fingerprint = %fingerprint(&payload),
            chars = len,
            "envelope sent"
        );
        Ok(())
    }

    /// Build the envelope payload (the text after the header) for `packet`.
    /// `None` when compression failed and the send should be abandoned.
    pub(crate) fn seal_payload(
        &self,
        packet: &Packet,
        key: &RsaPublicKey,
    ) -> Result<Option<String>, TunnelError> {
        let frame = self.registry.encode_frame(packet)?;

        let compressed = match compress::compress(&frame) {
            Ok(compressed) => compressed,
            Err(e) => {
                tracing::warn!(
                    kind = %packet.kind(),
                    error = %e,
                    "compression failed, packet not sent"
                );
                return Ok(None);
            }
        };

        let ciphertext = envelope::seal(key, &compressed)?;
        Ok(Some(textsafe::encode(&ciphertext)))
    }

    /// Full relay command for one envelope.
    fn address(&self, recipient: &Peer, payload: &str) -> String {
        format!(
            "{} {} {}{}",
            self.config.relay.whisper_command, recipient.name, ENVELOPE_HEADER, payload
        )
    }
}
