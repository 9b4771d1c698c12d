//! server-local error taxonomy. never handed to a client directly — a
//! client only ever observes one of these as a closed socket or an
//! `Error` frame; they exist so the server's own logging and internal
//! plumbing have a typed vocabulary instead of ad hoc strings, mirroring
//! the client-side taxonomy in `portal_core::PortalError`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RendezvousError {
    #[error("no mailbox registered for session {0}")]
    UnknownSession(u32),

    #[error("session {0} already has a receiver attached")]
    SessionAlreadyPaired(u32),

    #[error("protocol desync from {from}: {detail}")]
    ProtocolDesync { from: &'static str, detail: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
