use thiserror::Error;

/// the error taxonomy a client can observe. no error here is recovered at a
/// higher layer — everything past PAKE is a single-shot transaction.
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("malformed password: check your password")]
    MalformedPassword,

    #[error("could not reach the rendezvous server: {0}")]
    RendezvousUnreachable(String),

    #[error("key exchange failed: wrong password")]
    PakeFailure,

    #[error("protocol desync: expected {expected}, got {actual}")]
    ProtocolDesync { expected: String, actual: String },

    #[error("decryption failed: key mismatch or tampered frame")]
    CryptoFailure,

    #[error("transport error: {0}")]
    TransportFailure(String),

    #[error("relay session expired or was torn down")]
    RelayExpired,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json encode/decode error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PortalError {
    /// map the taxonomy onto a process exit code, per the CLI surface.
    pub fn exit_code(&self) -> i32 {
        match self {
            PortalError::MalformedPassword => 2,
            PortalError::RendezvousUnreachable(_) => 3,
            PortalError::PakeFailure | PortalError::CryptoFailure => 4,
            PortalError::ProtocolDesync { .. } => 5,
            PortalError::TransportFailure(_) | PortalError::RelayExpired => 6,
            PortalError::Io(_) | PortalError::Json(_) => 6,
        }
    }
}
