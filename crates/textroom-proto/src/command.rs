//! Client command parsing.
//!
//! A command line is `/<keyword>[ <args...>]`. Keywords and argument
//! shapes are fixed; parsing validates the shape, the server validates
//! semantics (room exists, user registered, and so on). Message bodies
//! (`/msg`, `/pmsg`) keep the rest of the line verbatim, including
//! internal whitespace.

/// The closed set of client commands.
///
/// Every wire keyword maps to exactly one variant, so server dispatch is
/// an exhaustive `match` - an unhandled command is a compile error, not a
/// runtime fallthrough.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/register <user> <pass>` - create an account. Does not log in.
    Register {
        /// Requested username.
        user: String,
        /// Plaintext password (hashed by the persistence collaborator).
        pass: String,
    },
    /// `/login <user> <pass>` - authenticate and bind this connection.
    Login {
        /// Username to authenticate as.
        user: String,
        /// Plaintext password.
        pass: String,
    },
    /// `/create <#room>` - create a new room.
    Create {
        /// Room name, unvalidated at parse time.
        room: String,
    },
    /// `/join <#room>` - make a room the caller's current room.
    Join {
        /// Room name, unvalidated at parse time.
        room: String,
    },
    /// `/msg <text>` - broadcast to the caller's current room.
    Msg {
        /// Message body, the unsplit remainder of the line.
        text: String,
    },
    /// `/msgs` - drain pending messages for the caller's current room.
    Msgs,
    /// `/pmsg <user> <text>` - direct message another user.
    Pmsg {
        /// Recipient username.
        to: String,
        /// Message body, the unsplit remainder of the line.
        text: String,
    },
    /// `/pmsgs` - drain the caller's pending direct messages.
    Pmsgs,
    /// `/users [#room]` - list members of a room (default: current room).
    Users {
        /// Room name, or `None` for the caller's current room.
        room: Option<String>,
    },
    /// `/allusers` - list currently connected users.
    AllUsers,
    /// `/rooms` - list rooms in creation order.
    Rooms,
    /// `/room` - show the caller's current room.
    Room,
    /// `/help` - command summary.
    Help,
    /// `/exit` - close the connection after acknowledging.
    Exit,
}

/// Why a client line failed to parse into a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Keyword is not in the command set (or the line has no `/` prefix).
    #[error("unknown command")]
    Unknown,

    /// Known keyword, wrong argument shape.
    #[error("{keyword} {token}")]
    BadArgs {
        /// Wire keyword of the command that was attempted.
        keyword: &'static str,
        /// Error token the client receives (`invalid`, `usage`, ...).
        token: &'static str,
    },
}

impl ParseError {
    /// Wire line informing the client of the parse failure.
    #[must_use]
    pub fn wire_line(&self) -> String {
        match self {
            Self::Unknown => "unknown_command".to_string(),
            Self::BadArgs { keyword, token } => format!("{keyword} {token}"),
        }
    }
}

impl Command {
    /// Wire keyword of this command, including the leading `/`.
    #[must_use]
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Register { .. } => "/register",
            Self::Login { .. } => "/login",
            Self::Create { .. } => "/create",
            Self::Join { .. } => "/join",
            Self::Msg { .. } => "/msg",
            Self::Msgs => "/msgs",
            Self::Pmsg { .. } => "/pmsg",
            Self::Pmsgs => "/pmsgs",
            Self::Users { .. } => "/users",
            Self::AllUsers => "/allusers",
            Self::Rooms => "/rooms",
            Self::Room => "/room",
            Self::Help => "/help",
            Self::Exit => "/exit",
        }
    }

    /// Whether the command is accepted before authentication.
    ///
    /// Everything else yields `login_required` while unauthenticated.
    #[must_use]
    pub fn allowed_unauthenticated(&self) -> bool {
        matches!(self, Self::Register { .. } | Self::Login { .. } | Self::Help)
    }

    /// Parse one client line into a command.
    ///
    /// The line must already be stripped of its trailing newline. Leading
    /// and trailing whitespace is ignored.
    ///
    /// # Errors
    ///
    /// - `ParseError::Unknown` for an unrecognized keyword
    /// - `ParseError::BadArgs` for a recognized keyword with the wrong
    ///   argument shape (token matches the command's error vocabulary)
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        if !line.starts_with('/') {
            return Err(ParseError::Unknown);
        }

        let (keyword, rest) = match line.split_once(char::is_whitespace) {
            Some((k, r)) => (k, r.trim_start()),
            None => (line, ""),
        };

        match keyword {
            "/register" => two_words(rest)
                .map(|(user, pass)| Self::Register { user, pass })
                .ok_or(ParseError::BadArgs { keyword: "/register", token: "invalid" }),

            "/login" => two_words(rest)
                .map(|(user, pass)| Self::Login { user, pass })
                .ok_or(ParseError::BadArgs { keyword: "/login", token: "invalid" }),

            "/create" => one_word(rest)
                .map(|room| Self::Create { room })
                .ok_or(ParseError::BadArgs { keyword: "/create", token: "invalid" }),

            "/join" => one_word(rest)
                .map(|room| Self::Join { room })
                .ok_or(ParseError::BadArgs { keyword: "/join", token: "nonexistent" }),

            "/msg" => {
                if rest.is_empty() {
                    Err(ParseError::BadArgs { keyword: "/msg", token: "failed" })
                } else {
                    Ok(Self::Msg { text: rest.to_string() })
                }
            },

            "/msgs" => Ok(Self::Msgs),

            "/pmsg" => match rest.split_once(char::is_whitespace) {
                Some((to, text)) if !to.is_empty() && !text.trim().is_empty() => {
                    Ok(Self::Pmsg { to: to.to_string(), text: text.trim_start().to_string() })
                },
                _ => Err(ParseError::BadArgs { keyword: "/pmsg", token: "usage" }),
            },

            "/pmsgs" => Ok(Self::Pmsgs),

            "/users" => match rest {
                "" => Ok(Self::Users { room: None }),
                args => one_word(args)
                    .map(|room| Self::Users { room: Some(room) })
                    .ok_or(ParseError::BadArgs { keyword: "/users", token: "invalid" }),
            },

            "/allusers" => Ok(Self::AllUsers),
            "/rooms" => Ok(Self::Rooms),
            "/room" => Ok(Self::Room),
            "/help" => Ok(Self::Help),
            "/exit" => Ok(Self::Exit),

            _ => Err(ParseError::Unknown),
        }
    }
}

/// Exactly one whitespace-free word.
fn one_word(args: &str) -> Option<String> {
    let mut words = args.split_whitespace();
    match (words.next(), words.next()) {
        (Some(w), None) => Some(w.to_string()),
        _ => None,
    }
}

/// Exactly two whitespace-free words.
fn two_words(args: &str) -> Option<(String, String)> {
    let mut words = args.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some(a), Some(b), None) => Some((a.to_string(), b.to_string())),
        _ => None,
    }
}
