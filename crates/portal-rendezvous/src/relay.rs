//! idle-session reaper. the actual byte relay is done inline in
//! [`crate::handlers`] once a mailbox reaches `Relaying` state — this
//! module just guards against mailboxes that never get torn down because
//! a client vanished without sending `ReceiverToRendezvousClose`.

use crate::registry::MailboxRegistry;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// periodically sweep mailboxes idle longer than `timeout`, logging what
/// was reaped. runs for the lifetime of the server.
pub async fn run_idle_sweeper(registry: Arc<MailboxRegistry>, timeout: Duration) {
    let mut interval = tokio::time::interval(timeout.max(Duration::from_secs(1)));
    interval.tick().await; // first tick fires immediately; skip it

    loop {
        interval.tick().await;
        let reaped = registry.sweep_idle(timeout);
        if !reaped.is_empty() {
            info!(count = reaped.len(), ids = ?reaped, "reaped idle mailboxes");
        }
    }
}
