//! In-memory store implementation.
//!
//! HashMaps behind one std `Mutex`; every method locks, mutates, and
//! returns without awaiting, so the async trait methods never actually
//! suspend. A poisoned mutex surfaces as `StoreError::Backend` rather
//! than panicking the connection task.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;

use super::{RoomRecord, Store, StoreError, StoredMessage, UserRecord, hash_password};

#[derive(Debug, Default)]
struct Inner {
    /// Username -> password hash.
    users: HashMap<String, String>,
    /// Room name -> joined users (multi-room join history).
    rooms: HashMap<String, HashSet<String>>,
    /// Room name -> message history.
    messages: HashMap<String, Vec<StoredMessage>>,
    /// Recipient -> private-message history.
    private: HashMap<String, Vec<StoredMessage>>,
}

/// In-memory [`Store`]. Clones share the same underlying state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Backend("store mutex poisoned".to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user(&self, name: &str) -> Result<Option<UserRecord>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.users.contains_key(name).then(|| UserRecord { name: name.to_string() }))
    }

    async fn create_user(&self, name: &str, password_hash: &str) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner.users.contains_key(name) {
            return Err(StoreError::Conflict(name.to_string()));
        }
        inner.users.insert(name.to_string(), password_hash.to_string());
        Ok(())
    }

    async fn verify_password(&self, name: &str, password: &str) -> Result<bool, StoreError> {
        let inner = self.lock()?;
        Ok(inner.users.get(name).is_some_and(|stored| *stored == hash_password(password)))
    }

    async fn find_room(&self, name: &str) -> Result<Option<RoomRecord>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.rooms.contains_key(name).then(|| RoomRecord { name: name.to_string() }))
    }

    async fn create_room(&self, name: &str) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner.rooms.contains_key(name) {
            return Err(StoreError::Conflict(name.to_string()));
        }
        inner.rooms.insert(name.to_string(), HashSet::new());
        Ok(())
    }

    async fn add_room_member(&self, room: &str, user: &str) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        match inner.rooms.get_mut(room) {
            Some(members) => {
                members.insert(user.to_string());
                Ok(())
            },
            None => Err(StoreError::NotFound(room.to_string())),
        }
    }

    async fn append_message(&self, room: &str, user: &str, text: &str) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if !inner.rooms.contains_key(room) {
            return Err(StoreError::NotFound(room.to_string()));
        }
        inner
            .messages
            .entry(room.to_string())
            .or_default()
            .push(StoredMessage { from: user.to_string(), body: text.to_string() });
        Ok(())
    }

    async fn list_messages(&self, room: &str) -> Result<Vec<StoredMessage>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.messages.get(room).cloned().unwrap_or_default())
    }

    async fn append_private_message(
        &self,
        to: &str,
        from: &str,
        text: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner
            .private
            .entry(to.to_string())
            .or_default()
            .push(StoredMessage { from: from.to_string(), body: text.to_string() });
        Ok(())
    }

    async fn list_private_messages(&self, to: &str) -> Result<Vec<StoredMessage>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.private.get(to).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_user_rejects_duplicates() {
        let store = MemoryStore::new();

        assert!(store.create_user("alice", &hash_password("pw")).await.is_ok());
        assert_eq!(
            store.create_user("alice", &hash_password("pw2")).await,
            Err(StoreError::Conflict("alice".to_string()))
        );
    }

    #[tokio::test]
    async fn verify_password_checks_hash() {
        let store = MemoryStore::new();
        store.create_user("alice", &hash_password("secret")).await.ok();

        assert_eq!(store.verify_password("alice", "secret").await, Ok(true));
        assert_eq!(store.verify_password("alice", "wrong").await, Ok(false));
        assert_eq!(store.verify_password("nobody", "secret").await, Ok(false));
    }

    #[tokio::test]
    async fn find_user_after_create() {
        let store = MemoryStore::new();

        assert_eq!(store.find_user("alice").await, Ok(None));
        store.create_user("alice", &hash_password("pw")).await.ok();
        assert_eq!(
            store.find_user("alice").await,
            Ok(Some(UserRecord { name: "alice".to_string() }))
        );
    }

    #[tokio::test]
    async fn room_history_round_trip() {
        let store = MemoryStore::new();

        store.create_room("#a").await.ok();
        assert_eq!(
            store.create_room("#a").await,
            Err(StoreError::Conflict("#a".to_string()))
        );

        store.append_message("#a", "alice", "m1").await.ok();
        store.append_message("#a", "bob", "m2").await.ok();

        let history = store.list_messages("#a").await.unwrap_or_default();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], StoredMessage { from: "alice".to_string(), body: "m1".to_string() });
        assert_eq!(history[1].from, "bob");
    }

    #[tokio::test]
    async fn append_message_to_unknown_room_fails() {
        let store = MemoryStore::new();
        assert_eq!(
            store.append_message("#ghost", "alice", "m").await,
            Err(StoreError::NotFound("#ghost".to_string()))
        );
    }

    #[tokio::test]
    async fn room_membership_history_accumulates() {
        let store = MemoryStore::new();

        store.create_room("#a").await.ok();
        store.create_room("#b").await.ok();
        store.add_room_member("#a", "alice").await.ok();
        store.add_room_member("#b", "alice").await.ok();

        // The persisted view keeps both joins; the live current-room
        // model is tracked separately by the room registry.
        assert!(store.add_room_member("#a", "alice").await.is_ok());
        assert_eq!(
            store.add_room_member("#ghost", "alice").await,
            Err(StoreError::NotFound("#ghost".to_string()))
        );
    }

    #[tokio::test]
    async fn private_history_is_per_recipient() {
        let store = MemoryStore::new();

        store.append_private_message("bob", "alice", "hi").await.ok();
        store.append_private_message("carol", "alice", "yo").await.ok();

        let bobs = store.list_private_messages("bob").await.unwrap_or_default();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].body, "hi");
        assert!(store.list_private_messages("dave").await.unwrap_or_default().is_empty());
    }
}
