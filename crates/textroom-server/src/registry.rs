//! Session registry: identity to live-connection bindings.
//!
//! The registry owns the `Session` records: which identities are
//! connected, each one's outbound delivery handle, and its current room.
//! It enforces at most one live binding per identity - two concurrent
//! logins for the same name cannot both succeed because the whole
//! registry sits behind one lock and `register` checks-and-inserts in a
//! single call.
//!
//! The outbound handle is the only delivery capability other components
//! ever see; nothing outside a connection's own handler touches the
//! socket.

use std::collections::HashMap;

use tokio::sync::mpsc;

/// Delivery handle for one connection: lines pushed here are written to
/// the client's socket by its writer task, one write per line.
pub type Outbound = mpsc::UnboundedSender<String>;

/// A live binding for one authenticated identity.
#[derive(Debug)]
struct Session {
    /// Outbound delivery handle.
    sender: Outbound,
    /// Current room, if the identity has joined one.
    current_room: Option<String>,
}

/// `register` failed because the identity already has a live session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("already logged in")]
pub struct AlreadyLoggedIn;

/// Registry of live sessions, keyed by identity.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: HashMap<String, Session>,
}

impl SessionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `identity` to `sender` with no current room.
    ///
    /// # Errors
    ///
    /// - `AlreadyLoggedIn` if the identity already has a live session;
    ///   the existing binding is untouched.
    pub fn register(&mut self, identity: String, sender: Outbound) -> Result<(), AlreadyLoggedIn> {
        if self.sessions.contains_key(&identity) {
            return Err(AlreadyLoggedIn);
        }
        self.sessions.insert(identity, Session { sender, current_room: None });
        Ok(())
    }

    /// Remove the binding for `identity`. Idempotent: unbinding an
    /// absent identity is a no-op.
    pub fn unbind(&mut self, identity: &str) {
        self.sessions.remove(identity);
    }

    /// Outbound handle for `identity`. `None` if not connected.
    #[must_use]
    pub fn lookup(&self, identity: &str) -> Option<&Outbound> {
        self.sessions.get(identity).map(|s| &s.sender)
    }

    /// Set (or clear) the current room for `identity`.
    ///
    /// No-op if the identity is not connected.
    pub fn set_room(&mut self, identity: &str, room: Option<String>) {
        if let Some(session) = self.sessions.get_mut(identity) {
            session.current_room = room;
        }
    }

    /// Current room of `identity`. `None` if not connected or roomless.
    #[must_use]
    pub fn current_room(&self, identity: &str) -> Option<&String> {
        self.sessions.get(identity).and_then(|s| s.current_room.as_ref())
    }

    /// Whether `identity` has a live session.
    #[must_use]
    pub fn is_connected(&self, identity: &str) -> bool {
        self.sessions.contains_key(identity)
    }

    /// All connected identities, sorted for deterministic output.
    #[must_use]
    pub fn connected_users(&self) -> Vec<String> {
        let mut users: Vec<String> = self.sessions.keys().cloned().collect();
        users.sort();
        users
    }

    /// Number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no sessions are bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outbound() -> Outbound {
        let (tx, _rx) = mpsc::unbounded_channel();
        tx
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = SessionRegistry::new();

        assert!(registry.register("alice".to_string(), outbound()).is_ok());
        assert!(registry.is_connected("alice"));
        assert!(registry.lookup("alice").is_some());
        assert!(registry.lookup("bob").is_none());
    }

    #[test]
    fn second_binding_for_same_identity_fails() {
        let mut registry = SessionRegistry::new();

        assert!(registry.register("alice".to_string(), outbound()).is_ok());
        assert_eq!(registry.register("alice".to_string(), outbound()), Err(AlreadyLoggedIn));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unbind_is_idempotent() {
        let mut registry = SessionRegistry::new();

        registry.register("alice".to_string(), outbound()).ok();
        registry.unbind("alice");
        registry.unbind("alice");

        assert!(registry.is_empty());
        assert!(registry.register("alice".to_string(), outbound()).is_ok());
    }

    #[test]
    fn register_starts_with_no_room() {
        let mut registry = SessionRegistry::new();

        registry.register("alice".to_string(), outbound()).ok();
        assert_eq!(registry.current_room("alice"), None);
    }

    #[test]
    fn set_room_round_trips() {
        let mut registry = SessionRegistry::new();

        registry.register("alice".to_string(), outbound()).ok();
        registry.set_room("alice", Some("#welcome".to_string()));
        assert_eq!(registry.current_room("alice"), Some(&"#welcome".to_string()));

        registry.set_room("alice", None);
        assert_eq!(registry.current_room("alice"), None);
    }

    #[test]
    fn set_room_for_unknown_identity_is_noop() {
        let mut registry = SessionRegistry::new();
        registry.set_room("ghost", Some("#welcome".to_string()));
        assert!(registry.is_empty());
    }

    #[test]
    fn connected_users_is_sorted() {
        let mut registry = SessionRegistry::new();

        registry.register("carol".to_string(), outbound()).ok();
        registry.register("alice".to_string(), outbound()).ok();
        registry.register("bob".to_string(), outbound()).ok();

        assert_eq!(registry.connected_users(), vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn delivery_reaches_registered_sender() {
        let mut registry = SessionRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        registry.register("alice".to_string(), tx).ok();
        if let Some(sender) = registry.lookup("alice") {
            sender.send("hi".to_string()).ok();
        }

        assert_eq!(rx.try_recv().ok(), Some("hi".to_string()));
    }
}
