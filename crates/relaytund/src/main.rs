//! relaytund — two peers, one loopback relay, a short tunnelled exchange.
//!
//! Alice greets Bob and invites him to connect four. Bob accepts and plays
//! the first piece. Every packet crosses the relay as an encrypted envelope;
//! run with `RUST_LOG=debug` to watch the pipeline.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use uuid::Uuid;

use relaytun::{run_inbound, KeyRing, LogObserver, RelayHub, RelayMessage, Tunnel};
use relaytun_core::{GameKind, Keypair, Packet, PacketKind, Peer, TunnelConfig};

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = TunnelConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = TunnelConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        TunnelConfig::default()
    });
    tracing::info!(
        max_message_len = config.relay.max_message_len,
        whisper = %config.relay.whisper_command,
        "relaytund starting"
    );

    let alice = Peer::new("Alice", Uuid::new_v4());
    let bob = Peer::new("Bob", Uuid::new_v4());

    // Keypairs
    let alice_keys = Keypair::generate().context("alice keypair")?;
    let bob_keys = Keypair::generate().context("bob keypair")?;
    tracing::info!(peer = %alice, fingerprint = %alice_keys.fingerprint(), "keypair ready");
    tracing::info!(peer = %bob, fingerprint = %bob_keys.fingerprint(), "keypair ready");

    let alice_ring = KeyRing::with_own(alice_keys.clone());
    alice_ring.insert(bob.id, bob_keys.public.clone());
    let bob_ring = KeyRing::with_own(bob_keys);
    bob_ring.insert(alice.id, alice_keys.public);

    // Relay
    let hub = RelayHub::new(config.relay.max_message_len, config.relay.whisper_command.clone());
    let (alice_relay, alice_rx) = hub.join(alice.clone());
    let (bob_relay, bob_rx) = hub.join(bob.clone());

    // Handlers queue replies; the main task sends them.
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<(Peer, Packet)>();

    let mut alice_tunnel = Tunnel::new(
        config.clone(),
        alice.clone(),
        Arc::new(alice_ring),
        Arc::new(alice_relay),
    );
    alice_tunnel.add_observer(Arc::new(LogObserver));
    register_chat(&mut alice_tunnel);
    alice_tunnel.register_handler(
        PacketKind::PutConnectFourPiece,
        Arc::new(|packet: &Packet| -> Result<()> {
            if let Packet::PutConnectFourPiece(p) = packet {
                tracing::info!(from = %p.sender, column = p.x, "connect four move");
            }
            Ok(())
        }),
    );
    let alice_tunnel = Arc::new(alice_tunnel);

    let mut bob_tunnel = Tunnel::new(config, bob.clone(), Arc::new(bob_ring), Arc::new(bob_relay));
    register_chat(&mut bob_tunnel);
    {
        let bob = bob.clone();
        let alice = alice.clone();
        let replies = reply_tx.clone();
        bob_tunnel.register_handler(
            PacketKind::StartTwoPlayerGame,
            Arc::new(move |packet: &Packet| -> Result<()> {
                let Packet::StartTwoPlayerGame(invite) = packet else {
                    return Ok(());
                };
                tracing::info!(from = %invite.sender, game = invite.game.id(), "game invitation");
                if !invite.accept {
                    replies.send((alice.clone(), Packet::start_game(&bob, invite.game, true)))?;
                    replies.send((alice.clone(), Packet::connect_four_piece(&bob, 3)))?;
                }
                Ok(())
            }),
        );
    }
    let bob_tunnel = Arc::new(bob_tunnel);
    drop(reply_tx);

    let print_plain = |m: &RelayMessage| tracing::info!(from = %m.sender, text = %m.text, "chat");
    let alice_task = tokio::spawn(run_inbound(alice_tunnel.clone(), alice_rx, print_plain));
    let bob_task = tokio::spawn(run_inbound(bob_tunnel.clone(), bob_rx, print_plain));

    alice_tunnel.send_packet(&Packet::message(&alice, "hi Bob, fancy a game?"), &bob)?;
    alice_tunnel.send_packet(&Packet::start_game(&alice, GameKind::ConnectFour, false), &bob)?;

    // Bob answers the invitation from the main task.
    for _ in 0..2 {
        let Ok(Some((to, packet))) = tokio::time::timeout(REPLY_TIMEOUT, reply_rx.recv()).await
        else {
            tracing::warn!("no reply from Bob");
            break;
        };
        bob_tunnel.send_packet(&packet, &to)?;
    }

    // Let the last envelopes drain, then disconnect everyone.
    tokio::time::sleep(Duration::from_millis(100)).await;
    hub.leave(&alice.name);
    hub.leave(&bob.name);

    let alice_stats = alice_task.await?;
    let bob_stats = bob_task.await?;
    tracing::info!(?alice_stats, ?bob_stats, "relaytund finished");
    Ok(())
}

fn register_chat(tunnel: &mut Tunnel) {
    let me = tunnel.local().name.clone();
    tunnel.register_handler(
        PacketKind::Message,
        Arc::new(move |packet: &Packet| -> Result<()> {
            if let Packet::Message(m) = packet {
                tracing::info!(to = %me, from = %m.sender, text = %m.message, "private message");
            }
            Ok(())
        }),
    );
}
