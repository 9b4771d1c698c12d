//! protocol core shared by the rendezvous server and the CLI binary:
//! word-code passwords, PAKE key exchange, the authenticated transfer
//! cipher, chunk sizing, the wire message types, and both transfer state
//! machines.

pub mod chunking;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod messages;
pub mod net;
pub mod pake;
pub mod password;
pub mod session;
pub mod wordlist;

pub use config::ProgramOptions;
pub use error::PortalError;
pub use messages::{RendezvousMessage, TransferMessage};
pub use password::Password;
