//! the sender's half of a transfer (spec.md §4.2): dial the rendezvous,
//! hand the user a password, run the PAKE initiator round, race a direct
//! listener against the relay fallback, then drive the sender transfer
//! state machine to completion.

use crate::archive;
use crate::tempfiles;
use crate::transport::{DirectWs, Transport};
use futures::{SinkExt, StreamExt};
use portal_core::chunking::chunk_size;
use portal_core::codec::{read_encrypted_frame, write_encrypted_chunk, write_encrypted_message, TransferFrame};
use portal_core::crypto::CryptContext;
use portal_core::net::dial_with_backoff;
use portal_core::pake::{PakeState, Role};
use portal_core::session::SenderState;
use portal_core::{Password, PortalError, RendezvousMessage, TransferMessage};
use std::path::PathBuf;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::Instrument;

const DIRECT_PROBE_WINDOW: Duration = Duration::from_secs(3);

type RendezvousWs = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

pub async fn run(paths: Vec<PathBuf>, rendezvous_url: &str) -> Result<(), PortalError> {
    tempfiles::sweep(Role::Initiator).await;

    // no UI is wired up in this crate (spec.md §1 names it an external
    // collaborator), but the streaming loop still publishes onto a
    // `watch` channel the way one would be consumed from; with no
    // receiver held, `send` is simply a no-op.
    let (progress, _progress_rx) = watch::channel(0.0f64);

    let mut rendezvous = dial_with_backoff(|| async {
        tokio_tungstenite::connect_async(format!("{rendezvous_url}/establish-sender"))
            .await
            .map(|(ws, _)| ws)
            .map_err(|e| PortalError::RendezvousUnreachable(e.to_string()))
    })
    .await?;

    let id = match recv_rendezvous(&mut rendezvous).await? {
        RendezvousMessage::RendezvousToSenderBind { id } => id,
        other => {
            return Err(PortalError::ProtocolDesync {
                expected: "RendezvousToSenderBind".into(),
                actual: format!("{other:?}"),
            })
        }
    };

    let password = Password::generate(id);
    println!("On the other computer, run:\n\n  portal receive {password}\n");

    match recv_rendezvous(&mut rendezvous).await? {
        RendezvousMessage::RendezvousToSenderReady => {}
        other => {
            return Err(PortalError::ProtocolDesync {
                expected: "RendezvousToSenderReady".into(),
                actual: format!("{other:?}"),
            })
        }
    }

    let pake = PakeState::new(&password.weak_secret(), Role::Initiator);
    send_rendezvous(
        &mut rendezvous,
        &RendezvousMessage::SenderToReceiverPake {
            bytes: pake.bytes().to_vec(),
        },
    )
    .await?;

    let peer_bytes = match recv_rendezvous(&mut rendezvous).await? {
        RendezvousMessage::ReceiverToSenderPake { bytes } => bytes,
        other => {
            return Err(PortalError::ProtocolDesync {
                expected: "ReceiverToSenderPake".into(),
                actual: format!("{other:?}"),
            })
        }
    };
    let session_key = pake.finish(&peer_bytes)?;

    let salt = CryptContext::random_salt();
    send_rendezvous(
        &mut rendezvous,
        &RendezvousMessage::SenderToReceiverSalt {
            salt: salt.to_vec(),
        },
    )
    .await?;
    let ctx = CryptContext::new(&session_key, &salt);

    let listener = TcpListener::bind("0.0.0.0:0").await.map_err(PortalError::Io)?;
    let local_port = listener.local_addr().map_err(PortalError::Io)?.port();
    send_rendezvous(
        &mut rendezvous,
        &RendezvousMessage::SenderToRendezvousReady {
            ip: local_ip_best_effort(),
            port: local_port,
        },
    )
    .await?;

    let mut transport = race_direct_or_relay(listener, rendezvous).await?;

    let payload_size = archive::packed_size(&paths).await?;
    let chunk = chunk_size(payload_size);

    let span = tracing::info_span!("transfer", id, payload_size, chunk);
    run_sender_transfer(&mut transport, &ctx, &paths, chunk, payload_size, &progress)
        .instrument(span)
        .await?;

    println!("Transfer complete.");
    Ok(())
}

/// races the sender's local direct-mode listener against the rendezvous
/// telling us the receiver's probe failed. whichever side loses the race
/// hands the other a `closeServer`-style shutdown: the accept loop runs in
/// its own task and is told to stop via a one-shot `tokio::sync::oneshot`
/// signal rather than left to idle once its result is no longer wanted.
async fn race_direct_or_relay(
    listener: TcpListener,
    mut rendezvous: RendezvousWs,
) -> Result<Transport, PortalError> {
    let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

    let mut accept_task = tokio::spawn(async move {
        tokio::select! {
            accepted = tokio::time::timeout(DIRECT_PROBE_WINDOW, accept_direct(&listener)) => Some(accepted),
            _ = &mut cancel_rx => None,
        }
    });

    tokio::select! {
        joined = &mut accept_task => {
            match joined {
                Ok(Some(Ok(Ok(ws)))) => {
                    tracing::info!("direct connection established");
                    Ok(Transport::Direct(ws))
                }
                _ => wait_for_relay_signal(rendezvous).await,
            }
        }
        msg = rendezvous.next() => {
            let _ = cancel_tx.send(());
            match msg {
                Some(Ok(WsMessage::Text(text))) => {
                    match serde_json::from_str::<RendezvousMessage>(&text) {
                        Ok(RendezvousMessage::RendezvousToSenderRelay) => {
                            tracing::info!("falling back to relay, cancelling local listener");
                            Ok(Transport::Relay(rendezvous))
                        }
                        _ => Err(PortalError::ProtocolDesync {
                            expected: "RendezvousToSenderRelay".into(),
                            actual: text,
                        }),
                    }
                }
                _ => Err(PortalError::TransportFailure("rendezvous closed early".into())),
            }
        }
    }
}

/// accept one connection on the sender's local listener and upgrade it to a
/// websocket — spec.md §4.2 step 7's "local...websocket server", not a
/// bespoke TCP framing.
async fn accept_direct(listener: &TcpListener) -> Result<DirectWs, PortalError> {
    let (stream, _addr) = listener.accept().await.map_err(PortalError::Io)?;
    tokio_tungstenite::accept_async(stream)
        .await
        .map_err(|e| PortalError::TransportFailure(e.to_string()))
}

async fn wait_for_relay_signal(mut rendezvous: RendezvousWs) -> Result<Transport, PortalError> {
    match recv_rendezvous(&mut rendezvous).await? {
        RendezvousMessage::RendezvousToSenderRelay => Ok(Transport::Relay(rendezvous)),
        other => Err(PortalError::ProtocolDesync {
            expected: "RendezvousToSenderRelay".into(),
            actual: format!("{other:?}"),
        }),
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_sender_transfer(
    transport: &mut Transport,
    ctx: &CryptContext,
    paths: &[PathBuf],
    chunk: u64,
    payload_size: u64,
    progress: &watch::Sender<f64>,
) -> Result<(), PortalError> {
    let mut state = SenderState::WaitForFileRequest;

    loop {
        let frame = transport
            .recv()
            .await?
            .ok_or_else(|| PortalError::TransportFailure("peer closed mid-transfer".into()))?;
        let TransferFrame::Control(msg) = read_encrypted_frame(ctx, &frame)? else {
            return fail_transfer(
                transport,
                ctx,
                PortalError::ProtocolDesync {
                    expected: state.name().to_string(),
                    actual: "payload chunk".into(),
                },
            )
            .await;
        };

        let next = match state.on_message(&msg) {
            Ok(next) => next,
            Err(err) => return fail_transfer(transport, ctx, err).await,
        };

        if state == SenderState::WaitForFileRequest && next == SenderState::WaitForFileAck {
            stream_payload(transport, ctx, paths, chunk, payload_size, progress).await?;
            transport
                .send(&write_encrypted_message(ctx, &TransferMessage::SenderPayloadSent)?)
                .await?;
        }

        if state == SenderState::WaitForFileAck && next == SenderState::WaitForCloseAck {
            transport
                .send(&write_encrypted_message(ctx, &TransferMessage::SenderClosing)?)
                .await?;
        }

        state = next;
        match state {
            SenderState::Done => return Ok(()),
            SenderState::Error => {
                return Err(PortalError::ProtocolDesync {
                    expected: "any".into(),
                    actual: "TransferError".into(),
                })
            }
            _ => {}
        }
    }
}

/// spec.md §4.2's state table: an event that doesn't match the expected
/// state replies with `TransferError{expected, actual}` before the socket
/// closes, so the peer can tell a desync from a plain disconnect.
async fn fail_transfer(transport: &mut Transport, ctx: &CryptContext, err: PortalError) -> Result<(), PortalError> {
    if let PortalError::ProtocolDesync { expected, actual } = &err {
        let encoded = write_encrypted_message(
            ctx,
            &TransferMessage::TransferError {
                expected: expected.clone(),
                actual: actual.clone(),
            },
        );
        if let Ok(frame) = encoded {
            let _ = transport.send(&frame).await;
        }
    }
    Err(err)
}

async fn stream_payload(
    transport: &mut Transport,
    ctx: &CryptContext,
    paths: &[PathBuf],
    chunk: u64,
    payload_size: u64,
    progress: &watch::Sender<f64>,
) -> Result<(), PortalError> {
    let mut buffer = Vec::new();
    archive::pack(paths, &mut buffer).await?;

    let total_chunks = buffer.len().div_ceil(chunk as usize).max(1);
    let mut bytes_sent = 0u64;
    for (i, slice) in buffer.chunks(chunk as usize).enumerate() {
        transport.send(&write_encrypted_chunk(ctx, slice)?).await?;
        bytes_sent += slice.len() as u64;

        // fraction in [0,1]; a zero-byte payload has nothing to divide by
        // and is always "fully sent".
        let fraction = if payload_size == 0 {
            1.0
        } else {
            bytes_sent as f64 / payload_size as f64
        };
        let _ = progress.send(fraction);
        tracing::debug!(chunk = i + 1, of = total_chunks, bytes = slice.len(), fraction, "sent payload chunk");
    }
    Ok(())
}

async fn send_rendezvous(ws: &mut RendezvousWs, msg: &RendezvousMessage) -> Result<(), PortalError> {
    let encoded = serde_json::to_string(msg)?;
    ws.send(WsMessage::Text(encoded))
        .await
        .map_err(|e| PortalError::TransportFailure(e.to_string()))
}

async fn recv_rendezvous(ws: &mut RendezvousWs) -> Result<RendezvousMessage, PortalError> {
    match ws.next().await {
        Some(Ok(WsMessage::Text(text))) => Ok(serde_json::from_str(&text)?),
        Some(Ok(_)) => Err(PortalError::TransportFailure("expected a text frame".into())),
        Some(Err(e)) => Err(PortalError::TransportFailure(e.to_string())),
        None => Err(PortalError::RendezvousUnreachable("connection closed".into())),
    }
}

/// best-effort local address for the direct-mode listener. a real deployment
/// would resolve the outward-facing address (STUN, upnp, or an explicit
/// `--advertise-ip` flag); this stand-in advertises the first non-loopback
/// interface address and leaves NAT traversal to the relay fallback.
fn local_ip_best_effort() -> String {
    std::net::UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("1.1.1.1:80")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| "0.0.0.0".to_string())
}
