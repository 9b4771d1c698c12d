//! websocket upgrade handlers for the two establish routes. both sides
//! speak [`RendezvousMessage`] as JSON text frames while pairing; the
//! server inspects just enough of each message to route it, tunneling PAKE
//! and salt payloads blind. once a session reaches `Relaying` state every
//! further frame — JSON or not — is forwarded byte-for-byte without being
//! parsed, since by then it's the encrypted transfer wire, not ours to read.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use portal_core::RendezvousMessage;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::RendezvousError;
use crate::registry::{MailboxRegistry, SessionState};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<MailboxRegistry>,
}

pub async fn establish_sender(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| sender_session(socket, state))
}

#[derive(Deserialize)]
pub struct ReceiverQuery {
    id: u32,
}

pub async fn establish_receiver(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<ReceiverQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| receiver_session(socket, state, query.id))
}

async fn sender_session(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let registry = state.registry;

    let id = registry.allocate();
    info!(id, "sender connected, bound mailbox");

    let (to_sender_tx, mut to_sender_rx) = mpsc::unbounded_channel();
    registry.attach_sender(id, to_sender_tx);

    if send_json(&mut ws_tx, &RendezvousMessage::RendezvousToSenderBind { id })
        .await
        .is_err()
    {
        registry.retire(id);
        return;
    }

    let forward = tokio::spawn(async move {
        while let Some(msg) = to_sender_rx.recv().await {
            if ws_tx.send(msg).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = ws_rx.next().await {
        if registry.state(id) == Some(SessionState::Relaying) {
            registry.send_to_receiver(id, msg);
            continue;
        }

        let Message::Text(text) = msg else { continue };
        let Ok(parsed) = serde_json::from_str::<RendezvousMessage>(&text) else {
            let err = RendezvousError::ProtocolDesync {
                from: "sender",
                detail: text,
            };
            warn!(id, %err);
            break;
        };

        match parsed {
            RendezvousMessage::SenderToReceiverPake { .. }
            | RendezvousMessage::SenderToReceiverSalt { .. } => {
                registry.send_to_receiver(id, Message::Text(text));
            }
            RendezvousMessage::SenderToRendezvousReady { ip, port } => {
                registry.set_state(id, SessionState::Probing);
                let approve = RendezvousMessage::RendezvousToReceiverApproveAddress { ip, port };
                if let Ok(encoded) = serde_json::to_string(&approve) {
                    registry.send_to_receiver(id, Message::Text(encoded));
                }
            }
            other => {
                warn!(id, ?other, "unexpected message from sender");
                break;
            }
        }
    }

    forward.abort();
    if registry.state(id) != Some(SessionState::Relaying) {
        registry.retire(id);
    }
    info!(id, "sender disconnected");
}

async fn receiver_session(socket: WebSocket, state: AppState, id: u32) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let registry = state.registry;

    let (to_receiver_tx, mut to_receiver_rx) = mpsc::unbounded_channel();
    if !registry.attach_receiver(id, to_receiver_tx) {
        let err = match registry.state(id) {
            None => RendezvousError::UnknownSession(id),
            Some(_) => RendezvousError::SessionAlreadyPaired(id),
        };
        warn!(id, %err);
        let reply = RendezvousMessage::Error {
            message: err.to_string(),
        };
        let _ = send_json(&mut ws_tx, &reply).await;
        return;
    }
    info!(id, "receiver paired");

    let ready = RendezvousMessage::RendezvousToSenderReady;
    if let Ok(encoded) = serde_json::to_string(&ready) {
        registry.send_to_sender(id, Message::Text(encoded));
    }

    let forward = tokio::spawn(async move {
        while let Some(msg) = to_receiver_rx.recv().await {
            if ws_tx.send(msg).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = ws_rx.next().await {
        if registry.state(id) == Some(SessionState::Relaying) {
            if is_receiver_close(&msg) {
                info!(id, "receiver requested relay teardown");
                break;
            }
            registry.send_to_sender(id, msg);
            continue;
        }

        let Message::Text(text) = msg else { continue };
        let Ok(parsed) = serde_json::from_str::<RendezvousMessage>(&text) else {
            let err = RendezvousError::ProtocolDesync {
                from: "receiver",
                detail: text,
            };
            warn!(id, %err);
            break;
        };

        match parsed {
            RendezvousMessage::ReceiverToSenderPake { .. } => {
                registry.send_to_sender(id, Message::Text(text));
            }
            RendezvousMessage::ReceiverToRendezvousProbeOk => {
                info!(id, "direct probe succeeded, rendezvous stepping aside");
                break;
            }
            RendezvousMessage::ReceiverToRendezvousProbeFailed => {
                registry.set_state(id, SessionState::Relaying);
                let relay_msg = RendezvousMessage::RendezvousToSenderRelay;
                if let Ok(encoded) = serde_json::to_string(&relay_msg) {
                    registry.send_to_sender(id, Message::Text(encoded));
                }
                info!(id, "direct probe failed, falling back to relay");
            }
            other => {
                warn!(id, ?other, "unexpected message from receiver");
                break;
            }
        }
    }

    forward.abort();
    registry.retire(id);
    info!(id, "receiver session ended");
}

/// `true` iff `msg` is the receiver's `ReceiverToRendezvousClose` control
/// frame — sent as JSON text even while the session is otherwise blindly
/// relaying binary transfer frames, so the server can tell "tear this down"
/// from opaque transfer bytes.
fn is_receiver_close(msg: &Message) -> bool {
    let Message::Text(text) = msg else { return false };
    matches!(
        serde_json::from_str::<RendezvousMessage>(text),
        Ok(RendezvousMessage::ReceiverToRendezvousClose)
    )
}

async fn send_json(
    tx: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &RendezvousMessage,
) -> Result<(), axum::Error> {
    let encoded = serde_json::to_string(msg).expect("RendezvousMessage always serializes");
    tx.send(Message::Text(encoded)).await
}
