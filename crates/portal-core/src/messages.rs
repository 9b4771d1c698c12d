//! control-frame message types. rendezvous frames are plain JSON objects
//! sent as websocket text frames; transfer frames are JSON objects
//! encrypted-then-sent as websocket binary frames (see [`crate::codec`]).

use serde::{Deserialize, Serialize};

/// messages exchanged between a client and the rendezvous server (and, for
/// the PAKE/salt steps, blindly tunneled between the two clients).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum RendezvousMessage {
    /// rendezvous -> sender: the assigned session id.
    RendezvousToSenderBind { id: u32 },
    /// rendezvous -> sender: a receiver has paired.
    RendezvousToSenderReady,
    /// sender -> receiver (tunneled): this side's PAKE round bytes.
    SenderToReceiverPake { bytes: Vec<u8> },
    /// receiver -> sender (tunneled): this side's PAKE round bytes.
    ReceiverToSenderPake { bytes: Vec<u8> },
    /// sender -> receiver (tunneled): the salt for HKDF key derivation.
    SenderToReceiverSalt { salt: Vec<u8> },
    /// sender -> rendezvous: the direct-mode server is listening.
    SenderToRendezvousReady { ip: String, port: u16 },
    /// rendezvous -> receiver: the sender's claimed direct-mode address.
    RendezvousToReceiverApproveAddress { ip: String, port: u16 },
    /// receiver -> rendezvous: the direct-mode probe succeeded.
    ReceiverToRendezvousProbeOk,
    /// receiver -> rendezvous: the direct-mode probe failed; relay instead.
    ReceiverToRendezvousProbeFailed,
    /// rendezvous -> sender: the receiver needs the relay path.
    RendezvousToSenderRelay,
    /// receiver -> rendezvous: tear down the relay, we're done.
    ReceiverToRendezvousClose,
    /// either side -> rendezvous: something about the session was invalid.
    Error { message: String },
}

/// the encrypted control messages of the transfer wire. sent as JSON,
/// encrypted with the session [`crate::crypto::CryptContext`], and carried
/// as a websocket binary frame — see the disambiguation rule in
/// [`crate::codec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum TransferMessage {
    /// receiver -> sender: start streaming the payload.
    ReceiverRequestPayload,
    /// sender -> receiver: every chunk has been sent.
    SenderPayloadSent,
    /// receiver -> sender: all chunks were received.
    ReceiverPayloadAck,
    /// sender -> receiver: shutting down, expect one more ack.
    SenderClosing,
    /// receiver -> sender: acknowledges `SenderClosing`.
    ReceiverClosingAck,
    /// either side -> the other: state-machine desync.
    TransferError { expected: String, actual: String },
}

impl std::fmt::Display for TransferMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransferMessage::ReceiverRequestPayload => "ReceiverRequestPayload",
            TransferMessage::SenderPayloadSent => "SenderPayloadSent",
            TransferMessage::ReceiverPayloadAck => "ReceiverPayloadAck",
            TransferMessage::SenderClosing => "SenderClosing",
            TransferMessage::ReceiverClosingAck => "ReceiverClosingAck",
            TransferMessage::TransferError { .. } => "TransferError",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendezvous_messages_roundtrip_through_json() {
        let msg = RendezvousMessage::RendezvousToSenderBind { id: 42 };
        let encoded = serde_json::to_string(&msg).unwrap();
        let decoded: RendezvousMessage = serde_json::from_str(&encoded).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn transfer_messages_roundtrip_through_json() {
        let msg = TransferMessage::TransferError {
            expected: "WaitForFileRequest".into(),
            actual: "WaitForFileRequest".into(),
        };
        let encoded = serde_json::to_string(&msg).unwrap();
        let decoded: TransferMessage = serde_json::from_str(&encoded).unwrap();
        assert_eq!(msg, decoded);
    }
}
