//! the receiver's half of a transfer (spec.md §4.3): parse the password,
//! dial the rendezvous, run the PAKE responder round, probe the sender's
//! claimed direct address, then drive the receiver transfer state machine
//! and unpack the result.

use crate::archive;
use crate::tempfiles;
use crate::transport::{DirectWs, Transport};
use futures::{SinkExt, StreamExt};
use portal_core::codec::{read_encrypted_frame, write_encrypted_message, TransferFrame};
use portal_core::crypto::CryptContext;
use portal_core::net::dial_with_backoff;
use portal_core::pake::{PakeState, Role};
use portal_core::session::ReceiverState;
use portal_core::{Password, PortalError, RendezvousMessage, TransferMessage};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::Instrument;

const DIRECT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

type RendezvousWs = tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<TcpStream>>;

pub async fn run(password_str: &str, rendezvous_url: &str, output_dir: &Path) -> Result<(), PortalError> {
    tempfiles::sweep(Role::Responder).await;

    let password = Password::parse(password_str)?;

    let mut rendezvous = dial_with_backoff(|| async {
        tokio_tungstenite::connect_async(format!(
            "{rendezvous_url}/establish-receiver?id={}",
            password.id
        ))
        .await
        .map(|(ws, _)| ws)
        .map_err(|e| PortalError::RendezvousUnreachable(e.to_string()))
    })
    .await?;

    let sender_bytes = match recv_rendezvous(&mut rendezvous).await? {
        RendezvousMessage::SenderToReceiverPake { bytes } => bytes,
        other => {
            return Err(PortalError::ProtocolDesync {
                expected: "SenderToReceiverPake".into(),
                actual: format!("{other:?}"),
            })
        }
    };

    let pake = PakeState::new(&password.weak_secret(), Role::Responder);
    send_rendezvous(
        &mut rendezvous,
        &RendezvousMessage::ReceiverToSenderPake {
            bytes: pake.bytes().to_vec(),
        },
    )
    .await?;
    let session_key = pake.finish(&sender_bytes)?;

    let salt = match recv_rendezvous(&mut rendezvous).await? {
        RendezvousMessage::SenderToReceiverSalt { salt } => salt,
        other => {
            return Err(PortalError::ProtocolDesync {
                expected: "SenderToReceiverSalt".into(),
                actual: format!("{other:?}"),
            })
        }
    };
    let salt: [u8; 16] = salt
        .try_into()
        .map_err(|_| PortalError::CryptoFailure)?;
    let ctx = CryptContext::new(&session_key, &salt);

    let (ip, port) = match recv_rendezvous(&mut rendezvous).await? {
        RendezvousMessage::RendezvousToReceiverApproveAddress { ip, port } => (ip, port),
        other => {
            return Err(PortalError::ProtocolDesync {
                expected: "RendezvousToReceiverApproveAddress".into(),
                actual: format!("{other:?}"),
            })
        }
    };

    let mut transport = probe_then_pick_transport(rendezvous, &ip, port).await?;
    let used_relay = transport.used_relay();

    let span = tracing::info_span!("transfer", id = password.id, used_relay);
    let transfer_result = run_receiver_transfer(&mut transport, &ctx, output_dir)
        .instrument(span)
        .await;

    // spec.md §4.3 step 10: on success, if we fell back to the relay, tell
    // the rendezvous to tear the mailbox down; either way, always close
    // the socket.
    if transfer_result.is_ok() && used_relay {
        transport.send_relay_close().await?;
    }
    let _ = transport.close().await;
    transfer_result?;

    println!("Transfer complete.");
    Ok(())
}

async fn probe_then_pick_transport(
    mut rendezvous: RendezvousWs,
    ip: &str,
    port: u16,
) -> Result<Transport, PortalError> {
    let direct = tokio::time::timeout(DIRECT_PROBE_TIMEOUT, dial_direct(ip, port)).await;

    match direct {
        Ok(Ok(ws)) => {
            send_rendezvous(&mut rendezvous, &RendezvousMessage::ReceiverToRendezvousProbeOk).await?;
            tracing::info!("direct probe succeeded");
            // the rendezvous connection is no longer needed once we have a
            // direct path; dropping it here tells the server to retire the mailbox.
            drop(rendezvous);
            Ok(Transport::Direct(ws))
        }
        _ => {
            send_rendezvous(&mut rendezvous, &RendezvousMessage::ReceiverToRendezvousProbeFailed).await?;
            tracing::info!("direct probe failed, falling back to relay");
            Ok(Transport::Relay(rendezvous))
        }
    }
}

/// dial the sender's advertised direct-mode address and upgrade it to a
/// websocket — spec.md §4.3 step 6's "attempt a websocket dial", not a bare
/// TCP connect.
async fn dial_direct(ip: &str, port: u16) -> Result<DirectWs, PortalError> {
    let stream = TcpStream::connect((ip, port)).await.map_err(PortalError::Io)?;
    let (ws, _response) = tokio_tungstenite::client_async(format!("ws://{ip}:{port}/"), stream)
        .await
        .map_err(|e| PortalError::TransportFailure(e.to_string()))?;
    Ok(ws)
}

async fn run_receiver_transfer(
    transport: &mut Transport,
    ctx: &CryptContext,
    output_dir: &Path,
) -> Result<(), PortalError> {
    transport
        .send(&write_encrypted_message(ctx, &TransferMessage::ReceiverRequestPayload)?)
        .await?;

    let mut state = ReceiverState::AwaitingPayload;
    let mut received = Vec::new();

    loop {
        let frame = transport
            .recv()
            .await?
            .ok_or_else(|| PortalError::TransportFailure("peer closed mid-transfer".into()))?;
        let classified = read_encrypted_frame(ctx, &frame)?;

        if let TransferFrame::Payload(bytes) = &classified {
            received.extend_from_slice(bytes);
            tracing::debug!(bytes = bytes.len(), total = received.len(), "received payload chunk");
        }

        let next = state.on_frame(&classified)?;

        if state == ReceiverState::AwaitingPayload && next == ReceiverState::AwaitingClose {
            unpack_all(&received, output_dir).await?;
            transport
                .send(&write_encrypted_message(ctx, &TransferMessage::ReceiverPayloadAck)?)
                .await?;
        }

        if state == ReceiverState::AwaitingClose && next == ReceiverState::Done {
            transport
                .send(&write_encrypted_message(ctx, &TransferMessage::ReceiverClosingAck)?)
                .await?;
        }

        state = next;
        match state {
            ReceiverState::Done => return Ok(()),
            ReceiverState::Error => {
                return Err(PortalError::ProtocolDesync {
                    expected: "any".into(),
                    actual: "TransferError".into(),
                })
            }
            _ => {}
        }
    }
}

async fn unpack_all(buffer: &[u8], output_dir: &Path) -> Result<(), PortalError> {
    let mut cursor = Cursor::new(buffer);
    while let Some(path) = archive::unpack_one(&mut cursor, output_dir).await? {
        println!("received: {}", path.display());
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

