//! the data-plane connection a transfer runs over, once pairing and PAKE are
//! done: either a direct websocket to the peer (the sender's local listener
//! upgrades an inbound TCP connection, the receiver's probe dial upgrades
//! an outbound one), or the same rendezvous websocket continuing to carry
//! frames after the server steps into pure relay mode. spec.md §4.2 step 7
//! and §4.3 step 6 both call this a websocket, not a bespoke framing —
//! direct mode uses the same binary-frame-per-chunk wire the relay path
//! already does, just without the rendezvous in the middle.

use futures::{SinkExt, StreamExt};
use portal_core::{PortalError, RendezvousMessage};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// the sender's local listener upgrades a bare `TcpStream` via
/// `accept_async`; the receiver's probe dial upgrades one via
/// `client_async`. either way it's a plain (non-TLS) websocket.
pub type DirectWs = WebSocketStream<TcpStream>;
/// the rendezvous control connection, continuing to carry frames once the
/// server steps into `Relaying` state.
pub type RelayWs = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub enum Transport {
    Direct(DirectWs),
    Relay(RelayWs),
}

impl Transport {
    /// true once this transfer fell back to the rendezvous relay instead of
    /// a direct peer connection — spec.md §3's `TransferSession.used_relay`.
    pub fn used_relay(&self) -> bool {
        matches!(self, Transport::Relay(_))
    }

    /// send one encrypted frame as a websocket binary message.
    pub async fn send(&mut self, frame: &[u8]) -> Result<(), PortalError> {
        let msg = WsMessage::Binary(frame.to_vec());
        let result = match self {
            Transport::Direct(ws) => ws.send(msg).await,
            Transport::Relay(ws) => ws.send(msg).await,
        };
        result.map_err(|e| PortalError::TransportFailure(e.to_string()))
    }

    /// receive one binary frame, skipping any other websocket message type
    /// (pings, the occasional stray text frame), or `None` once the peer
    /// closes.
    pub async fn recv(&mut self) -> Result<Option<Vec<u8>>, PortalError> {
        loop {
            let next = match self {
                Transport::Direct(ws) => ws.next().await,
                Transport::Relay(ws) => ws.next().await,
            };
            match next {
                Some(Ok(WsMessage::Binary(bytes))) => return Ok(Some(bytes)),
                Some(Ok(WsMessage::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(PortalError::TransportFailure(e.to_string())),
            }
        }
    }

    /// tell the rendezvous to tear down the relay mailbox (spec.md §4.1,
    /// §4.3 step 10). a no-op over a direct connection — the rendezvous
    /// already stepped aside once the probe succeeded, so there's no
    /// mailbox left to retire.
    pub async fn send_relay_close(&mut self) -> Result<(), PortalError> {
        if let Transport::Relay(ws) = self {
            let encoded = serde_json::to_string(&RendezvousMessage::ReceiverToRendezvousClose)?;
            ws.send(WsMessage::Text(encoded))
                .await
                .map_err(|e| PortalError::TransportFailure(e.to_string()))?;
        }
        Ok(())
    }

    /// close the underlying socket, direct or relay.
    pub async fn close(&mut self) -> Result<(), PortalError> {
        let result = match self {
            Transport::Direct(ws) => ws.close(None).await,
            Transport::Relay(ws) => ws.close(None).await,
        };
        result.map_err(|e| PortalError::TransportFailure(e.to_string()))
    }
}
