//! Room name validation.
//!
//! Room names carry a leading `#` so they can never collide with
//! usernames on the wire. Validation happens once, at the protocol
//! boundary; everything behind it trades in already-checked names.

use std::{fmt, str::FromStr};

/// A syntactically valid room name: `#` followed by at least one
/// non-whitespace character.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomName(String);

/// The candidate string is not a valid room name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid room name: {0:?}")]
pub struct InvalidRoomName(pub String);

impl RoomName {
    /// The validated name, including the leading `#`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the owned name.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl FromStr for RoomName {
    type Err = InvalidRoomName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = s.len() > 1
            && s.starts_with('#')
            && !s.chars().any(char::is_whitespace);
        if valid { Ok(Self(s.to_string())) } else { Err(InvalidRoomName(s.to_string())) }
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
