//! the mailbox registry: one entry per in-flight pairing, keyed by the
//! session id handed out in the sender's password. mirrors the
//! `Arc<Mutex<HashMap<..>>>` peer-registry shape this corpus uses for
//! connection bookkeeping, generalized from a peer set to a two-party
//! mailbox with explicit pairing state.

use axum::extract::ws::Message;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

/// where a mailbox sits in the pairing/transfer lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    WaitingForReceiver,
    PakeExchange,
    Probing,
    Relaying,
    Closed,
}

/// one pairing in flight. `to_sender`/`to_receiver` forward frames between
/// the two websocket tasks without either task seeing the other's socket.
struct MailboxSession {
    state: SessionState,
    to_sender: Option<UnboundedSender<Message>>,
    to_receiver: Option<UnboundedSender<Message>>,
    last_active: Instant,
}

impl MailboxSession {
    fn new() -> Self {
        Self {
            state: SessionState::WaitingForReceiver,
            to_sender: None,
            to_receiver: None,
            last_active: Instant::now(),
        }
    }
}

/// registry of live mailboxes. every method takes the lock only for the
/// duration of the map operation, never across an `.await`.
pub struct MailboxRegistry {
    sessions: Mutex<HashMap<u32, MailboxSession>>,
}

impl MailboxRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// allocate the lowest unused positive id and register a fresh mailbox
    /// under it in `WaitingForReceiver`.
    pub fn allocate(&self) -> u32 {
        let mut sessions = self.sessions.lock().unwrap();
        let mut id = 1u32;
        while sessions.contains_key(&id) {
            id += 1;
        }
        sessions.insert(id, MailboxSession::new());
        id
    }

    /// attach the sender's forwarding channel.
    pub fn attach_sender(&self, id: u32, tx: UnboundedSender<Message>) {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.get_mut(&id) {
            session.to_sender = Some(tx);
            session.last_active = Instant::now();
        }
    }

    /// attach the receiver's forwarding channel, advancing the mailbox from
    /// `WaitingForReceiver` to `PakeExchange`. returns `false` if the
    /// mailbox doesn't exist or already has a receiver.
    pub fn attach_receiver(&self, id: u32, tx: UnboundedSender<Message>) -> bool {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get_mut(&id) {
            Some(session) if session.state == SessionState::WaitingForReceiver => {
                session.to_receiver = Some(tx);
                session.state = SessionState::PakeExchange;
                session.last_active = Instant::now();
                true
            }
            _ => false,
        }
    }

    pub fn state(&self, id: u32) -> Option<SessionState> {
        self.sessions.lock().unwrap().get(&id).map(|s| s.state)
    }

    pub fn set_state(&self, id: u32, state: SessionState) {
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.get_mut(&id) {
            session.state = state;
            session.last_active = Instant::now();
        }
    }

    /// forward `msg` to the sender's socket. `false` if there's no sender
    /// attached (the send raced a disconnect, or never paired). counts as
    /// activity, so a session mid-relay isn't reaped as idle.
    pub fn send_to_sender(&self, id: u32, msg: Message) -> bool {
        let mut sessions = self.sessions.lock().unwrap();
        let Some(session) = sessions.get_mut(&id) else {
            return false;
        };
        let Some(tx) = session.to_sender.as_ref() else {
            return false;
        };
        let sent = tx.send(msg).is_ok();
        if sent {
            session.last_active = Instant::now();
        }
        sent
    }

    /// forward `msg` to the receiver's socket. same activity bookkeeping as
    /// `send_to_sender`.
    pub fn send_to_receiver(&self, id: u32, msg: Message) -> bool {
        let mut sessions = self.sessions.lock().unwrap();
        let Some(session) = sessions.get_mut(&id) else {
            return false;
        };
        let Some(tx) = session.to_receiver.as_ref() else {
            return false;
        };
        let sent = tx.send(msg).is_ok();
        if sent {
            session.last_active = Instant::now();
        }
        sent
    }

    /// tear down a mailbox, e.g. once the relay finishes or either side
    /// disconnects mid-pairing.
    pub fn retire(&self, id: u32) {
        self.sessions.lock().unwrap().remove(&id);
    }

    /// drop mailboxes that have been idle past `timeout`, returning their
    /// ids so the caller can log what was reaped.
    pub fn sweep_idle(&self, timeout: Duration) -> Vec<u32> {
        let mut sessions = self.sessions.lock().unwrap();
        let now = Instant::now();
        let stale: Vec<u32> = sessions
            .iter()
            .filter(|(_, s)| now.duration_since(s.last_active) > timeout)
            .map(|(id, _)| *id)
            .collect();
        for id in &stale {
            sessions.remove(id);
        }
        stale
    }
}

impl Default for MailboxRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_reuses_the_lowest_free_id() {
        let registry = MailboxRegistry::new();
        let a = registry.allocate();
        let b = registry.allocate();
        assert_eq!(a, 1);
        assert_eq!(b, 2);

        registry.retire(a);
        let c = registry.allocate();
        assert_eq!(c, 1);
    }

    #[test]
    fn attach_receiver_requires_waiting_state() {
        let registry = MailboxRegistry::new();
        let id = registry.allocate();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();

        assert!(registry.attach_receiver(id, tx.clone()));
        assert_eq!(registry.state(id), Some(SessionState::PakeExchange));
        assert!(!registry.attach_receiver(id, tx));
    }

    #[test]
    fn forwarding_frames_resets_the_idle_clock() {
        let registry = MailboxRegistry::new();
        let active = registry.allocate();
        let idle = registry.allocate();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        registry.attach_sender(active, tx.clone());
        registry.attach_sender(idle, tx);

        std::thread::sleep(Duration::from_millis(20));
        assert!(registry.send_to_sender(active, Message::Text("ping".into())));

        // `idle` hasn't been forwarded to since attach, so it reaps; `active`
        // just forwarded a frame and survives the same sweep.
        let reaped = registry.sweep_idle(Duration::from_millis(10));
        assert_eq!(reaped, vec![idle]);
        assert_eq!(registry.state(active), Some(SessionState::WaitingForReceiver));
    }

    #[test]
    fn sweep_idle_reaps_stale_sessions_only() {
        let registry = MailboxRegistry::new();
        let id = registry.allocate();
        let reaped = registry.sweep_idle(Duration::from_secs(600));
        assert!(reaped.is_empty());
        assert_eq!(registry.state(id), Some(SessionState::WaitingForReceiver));

        let reaped = registry.sweep_idle(Duration::from_secs(0));
        assert_eq!(reaped, vec![id]);
        assert_eq!(registry.state(id), None);
    }
}
