//! the transfer-wire codec: encrypted JSON control messages and raw
//! encrypted payload chunks, both carried as websocket binary frames.
//!
//! the load-bearing trick is the disambiguation rule on receive: decrypt
//! first, then attempt a JSON decode of the plaintext. JSON success means
//! the frame was a [`TransferMessage`]; JSON failure means the plaintext
//! *is* payload bytes. this is intentional (spec.md §3, §9) rather than a
//! workaround — a reserved leading type byte would also work, but this
//! implementation follows the load-bearing property as specified.

use crate::crypto::CryptContext;
use crate::error::PortalError;
use crate::messages::TransferMessage;

/// either a decoded control message or a decrypted chunk of raw payload.
pub enum TransferFrame {
    Control(TransferMessage),
    Payload(Vec<u8>),
}

/// encrypt `msg` as JSON and return the binary frame to send.
pub fn write_encrypted_message(ctx: &CryptContext, msg: &TransferMessage) -> Result<Vec<u8>, PortalError> {
    let json = serde_json::to_vec(msg)?;
    ctx.encrypt(&json)
}

/// encrypt a raw payload chunk (no JSON wrapping) and return the binary frame.
pub fn write_encrypted_chunk(ctx: &CryptContext, chunk: &[u8]) -> Result<Vec<u8>, PortalError> {
    ctx.encrypt(chunk)
}

/// decrypt a binary frame and classify it as control or payload.
pub fn read_encrypted_frame(ctx: &CryptContext, frame: &[u8]) -> Result<TransferFrame, PortalError> {
    let plaintext = ctx.decrypt(frame)?;
    match serde_json::from_slice::<TransferMessage>(&plaintext) {
        Ok(msg) => Ok(TransferFrame::Control(msg)),
        Err(_) => Ok(TransferFrame::Payload(plaintext)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::CryptContext;

    fn ctx() -> CryptContext {
        CryptContext::new(&[9u8; 32], &CryptContext::random_salt())
    }

    #[test]
    fn control_messages_decode_as_control() {
        let ctx = ctx();
        let frame = write_encrypted_message(&ctx, &TransferMessage::ReceiverRequestPayload).unwrap();
        match read_encrypted_frame(&ctx, &frame).unwrap() {
            TransferFrame::Control(TransferMessage::ReceiverRequestPayload) => {}
            _ => panic!("expected a control frame"),
        }
    }

    #[test]
    fn arbitrary_bytes_decode_as_payload() {
        let ctx = ctx();
        let chunk = b"not valid json at all \x00\x01\x02";
        let frame = write_encrypted_chunk(&ctx, chunk).unwrap();
        match read_encrypted_frame(&ctx, &frame).unwrap() {
            TransferFrame::Payload(bytes) => assert_eq!(bytes, chunk),
            TransferFrame::Control(_) => panic!("expected a payload frame"),
        }
    }

    #[test]
    fn payload_bytes_that_look_like_json_are_still_disambiguated_by_shape() {
        // a chunk that happens to parse as JSON but not as a known
        // TransferMessage variant must still surface as payload bytes.
        let ctx = ctx();
        let chunk = br#"{"hello":"world"}"#;
        let frame = write_encrypted_chunk(&ctx, chunk).unwrap();
        match read_encrypted_frame(&ctx, &frame).unwrap() {
            TransferFrame::Payload(bytes) => assert_eq!(bytes, chunk),
            TransferFrame::Control(_) => panic!("expected a payload frame"),
        }
    }
}
