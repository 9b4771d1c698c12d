//! password-authenticated key exchange. wraps the `spake2` crate's
//! `Ed25519Group`, the same group every PAKE usage in this corpus reaches
//! for, behind the initiator/responder API the protocol state machines use.

use crate::error::PortalError;
use spake2::{Ed25519Group, Identity, Password as SpakePassword, Spake2};

const SENDER_IDENTITY: &[u8] = b"portal-sender";
const RECEIVER_IDENTITY: &[u8] = b"portal-receiver";

/// which side of the exchange this process is playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// the sender runs the initiator (SPAKE2 "A") side.
    Initiator,
    /// the receiver runs the responder (SPAKE2 "B") side.
    Responder,
}

/// one side of an in-progress PAKE round. produced by [`PakeState::new`],
/// consumed by [`PakeState::finish`] once the peer's bytes arrive.
pub struct PakeState {
    spake: Spake2<Ed25519Group>,
    outbound: Vec<u8>,
}

impl PakeState {
    /// start a PAKE round over `weak_secret` playing `role`.
    pub fn new(weak_secret: &[u8], role: Role) -> Self {
        let (spake, outbound) = match role {
            Role::Initiator => Spake2::<Ed25519Group>::start_a(
                &SpakePassword::new(weak_secret),
                &Identity::new(SENDER_IDENTITY),
                &Identity::new(RECEIVER_IDENTITY),
            ),
            Role::Responder => Spake2::<Ed25519Group>::start_b(
                &SpakePassword::new(weak_secret),
                &Identity::new(SENDER_IDENTITY),
                &Identity::new(RECEIVER_IDENTITY),
            ),
        };
        Self { spake, outbound }
    }

    /// the bytes to send the peer for this round.
    pub fn bytes(&self) -> &[u8] {
        &self.outbound
    }

    /// complete the exchange with the peer's bytes, deriving the 32-byte
    /// session key. a wrong shared secret does not make this call fail —
    /// spake2 always "succeeds" here, it just derives a different key on
    /// each side (see spec.md's `CryptoFailure` boundary behavior).
    pub fn finish(self, peer_bytes: &[u8]) -> Result<[u8; 32], PortalError> {
        let key = self
            .spake
            .finish(peer_bytes)
            .map_err(|_| PortalError::PakeFailure)?;
        key.try_into().map_err(|_| PortalError::PakeFailure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_secrets_derive_equal_keys() {
        let initiator = PakeState::new(b"Normie", Role::Initiator);
        let responder = PakeState::new(b"Normie", Role::Responder);

        let initiator_bytes = initiator.bytes().to_vec();
        let responder_bytes = responder.bytes().to_vec();

        let sender_key = initiator.finish(&responder_bytes).unwrap();
        let receiver_key = responder.finish(&initiator_bytes).unwrap();

        assert_eq!(sender_key, receiver_key);
    }

    #[test]
    fn mismatched_secrets_derive_different_keys() {
        let initiator = PakeState::new(b"alpha-bravo-charlie", Role::Initiator);
        let responder = PakeState::new(b"alpha-bravo-delta", Role::Responder);

        let initiator_bytes = initiator.bytes().to_vec();
        let responder_bytes = responder.bytes().to_vec();

        let sender_key = initiator.finish(&responder_bytes).unwrap();
        let receiver_key = responder.finish(&initiator_bytes).unwrap();

        assert_ne!(sender_key, receiver_key);
    }
}
