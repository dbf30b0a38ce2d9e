//! Room registry: room names to member sets.
//!
//! Maintains bidirectional mappings: room -> members (for broadcast and
//! `/users`) and identity -> room (for the current-room model). An
//! identity is in at most one room at a time; `join` moves it out of the
//! previous room in the same call, so both rooms' member sets mutate
//! atomically under the registry's lock.
//!
//! Rooms are created explicitly - there is no lazy creation on join.

use std::collections::{HashMap, HashSet};

/// Errors from room membership operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// `create` found an existing room with the same name.
    #[error("room already exists: {0}")]
    AlreadyExists(String),

    /// `join` or `members` referenced a room that was never created.
    #[error("no such room: {0}")]
    NoSuchRoom(String),

    /// `join` found the identity already in the target room.
    #[error("already a member of {0}")]
    AlreadyMember(String),
}

/// Registry of rooms and the membership relation.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Room name -> member identities.
    members: HashMap<String, HashSet<String>>,
    /// Identity -> the one room it currently occupies.
    occupancy: HashMap<String, String>,
    /// Room names in creation order, for deterministic `list()`.
    order: Vec<String>,
}

impl RoomRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a room with no members.
    ///
    /// # Errors
    ///
    /// - `RoomError::AlreadyExists` if the name is taken.
    pub fn create(&mut self, name: &str) -> Result<(), RoomError> {
        if self.members.contains_key(name) {
            return Err(RoomError::AlreadyExists(name.to_string()));
        }
        self.members.insert(name.to_string(), HashSet::new());
        self.order.push(name.to_string());
        Ok(())
    }

    /// Whether a room exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    /// Move `identity` into `name`, leaving its previous room if any.
    ///
    /// # Errors
    ///
    /// - `RoomError::NoSuchRoom` if the room was never created
    /// - `RoomError::AlreadyMember` if the identity is already there;
    ///   membership is unchanged
    pub fn join(&mut self, name: &str, identity: &str) -> Result<(), RoomError> {
        if !self.members.contains_key(name) {
            return Err(RoomError::NoSuchRoom(name.to_string()));
        }
        if self.occupancy.get(identity).is_some_and(|current| current == name) {
            return Err(RoomError::AlreadyMember(name.to_string()));
        }

        if let Some(previous) = self.occupancy.remove(identity) {
            if let Some(set) = self.members.get_mut(&previous) {
                set.remove(identity);
            }
        }

        if let Some(set) = self.members.get_mut(name) {
            set.insert(identity.to_string());
        }
        self.occupancy.insert(identity.to_string(), name.to_string());
        Ok(())
    }

    /// Remove `identity` from `name`. Returns whether it was a member.
    pub fn leave(&mut self, name: &str, identity: &str) -> bool {
        let removed = self.members.get_mut(name).is_some_and(|set| set.remove(identity));
        if removed {
            self.occupancy.remove(identity);
        }
        removed
    }

    /// Member set of a room. `None` if the room does not exist.
    #[must_use]
    pub fn members(&self, name: &str) -> Option<&HashSet<String>> {
        self.members.get(name)
    }

    /// Members of a room, sorted for deterministic output.
    #[must_use]
    pub fn members_sorted(&self, name: &str) -> Option<Vec<String>> {
        self.members.get(name).map(|set| {
            let mut list: Vec<String> = set.iter().cloned().collect();
            list.sort();
            list
        })
    }

    /// Room `identity` currently occupies, if any.
    #[must_use]
    pub fn room_of(&self, identity: &str) -> Option<&String> {
        self.occupancy.get(identity)
    }

    /// All room names in creation order.
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Number of rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether no rooms exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
