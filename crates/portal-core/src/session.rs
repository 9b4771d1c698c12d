//! the transfer state machines (spec.md §4.2 / §4.3), expressed as tagged
//! variants pattern-matched against the current state — unexpected
//! (frame, state) pairs fall through to a single `ProtocolDesync` arm
//! rather than being checked ad hoc at every call site (spec.md §9).

use crate::codec::TransferFrame;
use crate::error::PortalError;
use crate::messages::TransferMessage;

/// sender-side transfer state (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    WaitForFileRequest,
    WaitForFileAck,
    WaitForCloseAck,
    Done,
    Error,
}

impl SenderState {
    pub fn name(&self) -> &'static str {
        match self {
            SenderState::WaitForFileRequest => "WaitForFileRequest",
            SenderState::WaitForFileAck => "WaitForFileAck",
            SenderState::WaitForCloseAck => "WaitForCloseAck",
            SenderState::Done => "Done",
            SenderState::Error => "Error",
        }
    }

    /// advance the sender state machine given an inbound control message.
    /// streaming the payload itself (the `WaitForFileRequest` ->
    /// `WaitForFileAck` transition's action) is driven by the caller; this
    /// only tracks the legal state sequence and reports desyncs.
    pub fn on_message(self, msg: &TransferMessage) -> Result<SenderState, PortalError> {
        use SenderState::*;
        use TransferMessage::*;

        match (self, msg) {
            (WaitForFileRequest, ReceiverRequestPayload) => Ok(WaitForFileAck),
            (WaitForFileAck, ReceiverPayloadAck) => Ok(WaitForCloseAck),
            (WaitForCloseAck, ReceiverClosingAck) => Ok(Done),
            (_, TransferError { .. }) => Ok(Error),
            (state, _other) => Err(PortalError::ProtocolDesync {
                expected: state.name().to_string(),
                actual: state.name().to_string(),
            }),
        }
    }
}

/// receiver-side transfer state (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    Initial,
    AwaitingPayload,
    AwaitingClose,
    Done,
    Error,
}

impl ReceiverState {
    pub fn name(&self) -> &'static str {
        match self {
            ReceiverState::Initial => "Initial",
            ReceiverState::AwaitingPayload => "AwaitingPayload",
            ReceiverState::AwaitingClose => "AwaitingClose",
            ReceiverState::Done => "Done",
            ReceiverState::Error => "Error",
        }
    }

    /// advance the receiver state machine given a decrypted/classified
    /// inbound frame (either a payload chunk or a control message).
    pub fn on_frame(self, frame: &TransferFrame) -> Result<ReceiverState, PortalError> {
        use ReceiverState::*;

        match (self, frame) {
            (AwaitingPayload, TransferFrame::Payload(_)) => Ok(AwaitingPayload),
            (AwaitingPayload, TransferFrame::Control(TransferMessage::SenderPayloadSent)) => {
                Ok(AwaitingClose)
            }
            (AwaitingClose, TransferFrame::Control(TransferMessage::SenderClosing)) => Ok(Done),
            (_, TransferFrame::Control(TransferMessage::TransferError { .. })) => Ok(Error),
            (state, TransferFrame::Control(other)) => Err(PortalError::ProtocolDesync {
                expected: state.name().to_string(),
                actual: other.to_string(),
            }),
            (state, TransferFrame::Payload(_)) => Err(PortalError::ProtocolDesync {
                expected: state.name().to_string(),
                actual: "payload chunk".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::TransferMessage;

    #[test]
    fn sender_happy_path_reaches_done() {
        let state = SenderState::WaitForFileRequest;
        let state = state.on_message(&TransferMessage::ReceiverRequestPayload).unwrap();
        assert_eq!(state, SenderState::WaitForFileAck);
        let state = state.on_message(&TransferMessage::ReceiverPayloadAck).unwrap();
        assert_eq!(state, SenderState::WaitForCloseAck);
        let state = state.on_message(&TransferMessage::ReceiverClosingAck).unwrap();
        assert_eq!(state, SenderState::Done);
    }

    #[test]
    fn sender_rejects_out_of_order_ack() {
        // scenario 4 from spec.md §8: receiver acks before requesting the payload.
        // both fields name the state the sender was stuck in, per the spec's
        // literal TransferError{expected=WaitForFileRequest, actual=WaitForFileRequest}.
        let state = SenderState::WaitForFileRequest;
        let err = state.on_message(&TransferMessage::ReceiverPayloadAck).unwrap_err();
        match err {
            PortalError::ProtocolDesync { expected, actual } => {
                assert_eq!(expected, "WaitForFileRequest");
                assert_eq!(actual, "WaitForFileRequest");
            }
            other => panic!("expected ProtocolDesync, got {other:?}"),
        }
    }

    #[test]
    fn receiver_happy_path_reaches_done() {
        let state = ReceiverState::AwaitingPayload;
        let state = state
            .on_frame(&TransferFrame::Payload(b"chunk".to_vec()))
            .unwrap();
        assert_eq!(state, ReceiverState::AwaitingPayload);
        let state = state
            .on_frame(&TransferFrame::Control(TransferMessage::SenderPayloadSent))
            .unwrap();
        assert_eq!(state, ReceiverState::AwaitingClose);
        let state = state
            .on_frame(&TransferFrame::Control(TransferMessage::SenderClosing))
            .unwrap();
        assert_eq!(state, ReceiverState::Done);
    }

    #[test]
    fn any_state_reacts_to_transfer_error() {
        for state in [
            ReceiverState::Initial,
            ReceiverState::AwaitingPayload,
            ReceiverState::AwaitingClose,
        ] {
            let next = state
                .on_frame(&TransferFrame::Control(TransferMessage::TransferError {
                    expected: "x".into(),
                    actual: "y".into(),
                }))
                .unwrap();
            assert_eq!(next, ReceiverState::Error);
        }
    }
}
