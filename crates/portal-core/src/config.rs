//! shared program configuration and naming conventions. `ProgramOptions`
//! carries the handful of values both the sender and receiver CLI paths
//! need; it is built by the CLI layer's `clap` parser and handed in here,
//! not parsed by this crate directly, so `portal-core` stays free of a CLI
//! dependency.

use crate::pake::Role;

/// default port the rendezvous server listens on.
pub const DEFAULT_RENDEZVOUS_PORT: u16 = 8080;
/// default port the sender's direct-mode listener binds, when not left to
/// the OS to pick an ephemeral one.
pub const DEFAULT_SENDER_DIRECT_PORT: u16 = 8081;

/// the handful of values that shape one CLI invocation. constructed by
/// `portal`'s `clap::Parser` struct and threaded through to the send/receive
/// lifecycles.
#[derive(Debug, Clone)]
pub struct ProgramOptions {
    pub rendezvous_url: String,
    pub direct_port: u16,
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self {
            rendezvous_url: format!("ws://127.0.0.1:{DEFAULT_RENDEZVOUS_PORT}"),
            direct_port: DEFAULT_SENDER_DIRECT_PORT,
        }
    }
}

/// the scratch-file prefix each role uses, so the CLI binary's temp-file
/// sweep and the (out-of-scope) archiver agree on a shared naming
/// convention without either depending on the other.
pub fn temp_prefix(role: Role) -> &'static str {
    match role {
        Role::Initiator => "portal-send-",
        Role::Responder => "portal-recv-",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_use_the_documented_ports() {
        let opts = ProgramOptions::default();
        assert!(opts.rendezvous_url.contains("8080"));
        assert_eq!(opts.direct_port, DEFAULT_SENDER_DIRECT_PORT);
    }

    #[test]
    fn temp_prefixes_differ_by_role() {
        assert_ne!(temp_prefix(Role::Initiator), temp_prefix(Role::Responder));
    }
}
