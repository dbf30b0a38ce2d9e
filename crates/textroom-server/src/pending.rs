//! Pending message store: queues awaiting an explicit pull.
//!
//! Every room and direct message is appended here at send time, in
//! addition to any immediate push delivery, so a recipient who was
//! offline still observes it - exactly once - on its next `/msgs` or
//! `/pmsgs`.
//!
//! Drain contract: FIFO, snapshot-and-clear in one critical section (the
//! store sits behind a single lock). A drained message is never returned
//! twice; messages enqueued after the drain started are simply in the
//! next drain.

use std::collections::{HashMap, VecDeque};

/// Per-room and per-identity FIFO queues of formatted message lines.
#[derive(Debug, Default)]
pub struct PendingStore {
    /// Room name -> queued lines.
    rooms: HashMap<String, VecDeque<String>>,
    /// Identity -> queued direct-message lines.
    direct: HashMap<String, VecDeque<String>>,
}

impl PendingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line to a room's queue.
    pub fn enqueue_room(&mut self, room: &str, line: String) {
        self.rooms.entry(room.to_string()).or_default().push_back(line);
    }

    /// Append a line to an identity's direct queue.
    pub fn enqueue_direct(&mut self, identity: &str, line: String) {
        self.direct.entry(identity.to_string()).or_default().push_back(line);
    }

    /// Take and clear a room's queue, oldest first.
    #[must_use]
    pub fn drain_room(&mut self, room: &str) -> Vec<String> {
        self.rooms.remove(room).map(Vec::from).unwrap_or_default()
    }

    /// Take and clear an identity's direct queue, oldest first.
    #[must_use]
    pub fn drain_direct(&mut self, identity: &str) -> Vec<String> {
        self.direct.remove(identity).map(Vec::from).unwrap_or_default()
    }

    /// Queued line count for a room.
    #[must_use]
    pub fn room_len(&self, room: &str) -> usize {
        self.rooms.get(room).map_or(0, VecDeque::len)
    }

    /// Queued direct-message count for an identity.
    #[must_use]
    pub fn direct_len(&self, identity: &str) -> usize {
        self.direct.get(identity).map_or(0, VecDeque::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_fifo_order() {
        let mut store = PendingStore::new();

        store.enqueue_room("#a", "alice: m1".to_string());
        store.enqueue_room("#a", "bob: m2".to_string());

        assert_eq!(store.drain_room("#a"), vec!["alice: m1", "bob: m2"]);
    }

    #[test]
    fn drain_is_idempotent_when_empty() {
        let mut store = PendingStore::new();

        store.enqueue_room("#a", "alice: m1".to_string());
        assert_eq!(store.drain_room("#a").len(), 1);
        assert!(store.drain_room("#a").is_empty());
        assert!(store.drain_room("#never").is_empty());
    }

    #[test]
    fn room_queues_are_independent() {
        let mut store = PendingStore::new();

        store.enqueue_room("#a", "alice: a".to_string());
        store.enqueue_room("#b", "bob: b".to_string());

        assert_eq!(store.drain_room("#a"), vec!["alice: a"]);
        assert_eq!(store.room_len("#b"), 1);
        assert_eq!(store.drain_room("#b"), vec!["bob: b"]);
    }

    #[test]
    fn direct_queue_drains_per_identity() {
        let mut store = PendingStore::new();

        store.enqueue_direct("bob", "alice: hi".to_string());
        store.enqueue_direct("bob", "carol: yo".to_string());
        store.enqueue_direct("dave", "alice: hey".to_string());

        assert_eq!(store.drain_direct("bob"), vec!["alice: hi", "carol: yo"]);
        assert!(store.drain_direct("bob").is_empty());
        assert_eq!(store.direct_len("dave"), 1);
    }
}
