//! Persistence collaborator for accounts, rooms, and message history.
//!
//! The live routing core treats this boundary as a set of fallible
//! remote calls: the trait is async, every method returns a `Result`,
//! and nothing in the core assumes a call is instantaneous or succeeds.
//! Component locks are never held across a store call.
//!
//! Password handling lives entirely on this side of the boundary: the
//! core hands a hash to `create_user` (via [`hash_password`]) and
//! plaintext to `verify_password`; the scheme is the collaborator's
//! business.

mod memory;

use async_trait::async_trait;
pub use memory::MemoryStore;
use sha2::{Digest, Sha256};

/// Errors from persistence operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Create hit an existing record (username or room name taken).
    #[error("record already exists: {0}")]
    Conflict(String),

    /// A referenced record does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Backend failure (I/O, poisoned state, remote error).
    #[error("store backend error: {0}")]
    Backend(String),
}

/// A stored user account, as much of it as the core ever sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Unique username.
    pub name: String,
}

/// A stored room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRecord {
    /// Unique room name, including the leading `#`.
    pub name: String,
}

/// One persisted message, room or direct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    /// Sender identity.
    pub from: String,
    /// Message body.
    pub body: String,
}

/// Persistence operations the core depends on.
///
/// Implementations must be safe to share across connection tasks.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Look up a user account by name.
    async fn find_user(&self, name: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Create a user account with an already-hashed password.
    ///
    /// # Errors
    ///
    /// - `StoreError::Conflict` if the username is taken
    async fn create_user(&self, name: &str, password_hash: &str) -> Result<(), StoreError>;

    /// Check a plaintext password against the stored hash.
    ///
    /// Returns `false` for unknown users as well as wrong passwords, so
    /// callers cannot distinguish the two (and neither can clients).
    async fn verify_password(&self, name: &str, password: &str) -> Result<bool, StoreError>;

    /// Look up a room by name.
    async fn find_room(&self, name: &str) -> Result<Option<RoomRecord>, StoreError>;

    /// Create a room.
    ///
    /// # Errors
    ///
    /// - `StoreError::Conflict` if the room name is taken
    async fn create_room(&self, name: &str) -> Result<(), StoreError>;

    /// Record that `user` joined `room` (multi-room join history; not
    /// load-bearing for live delivery).
    async fn add_room_member(&self, room: &str, user: &str) -> Result<(), StoreError>;

    /// Append a room message to history.
    async fn append_message(&self, room: &str, user: &str, text: &str) -> Result<(), StoreError>;

    /// Full message history of a room, oldest first.
    async fn list_messages(&self, room: &str) -> Result<Vec<StoredMessage>, StoreError>;

    /// Append a private message to the recipient's history.
    async fn append_private_message(
        &self,
        to: &str,
        from: &str,
        text: &str,
    ) -> Result<(), StoreError>;

    /// Full private-message history for a recipient, oldest first.
    async fn list_private_messages(&self, to: &str) -> Result<Vec<StoredMessage>, StoreError>;
}

/// Hash a plaintext password for `create_user`.
#[must_use]
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}
