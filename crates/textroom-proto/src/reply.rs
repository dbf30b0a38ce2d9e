//! Server reply rendering.
//!
//! A reply is a single logical message: either one status line
//! `/<command> <token>` or a multi-line payload whose first line is the
//! `/<command>` keyword. The caller performs one socket write per reply,
//! so internal newlines never straddle a write boundary.

use std::fmt;

/// One logical server-to-client message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Fixed status line: `/<command> <token>`.
    Status {
        /// Wire keyword, including the leading `/`.
        keyword: &'static str,
        /// Success or error token (`ok`, `sent`, `nonexistent`, ...).
        token: &'static str,
    },

    /// Status line with a dynamic value, e.g. `/room #welcome`.
    Value {
        /// Wire keyword, including the leading `/`.
        keyword: &'static str,
        /// Rendered value.
        value: String,
    },

    /// Multi-line payload: the keyword line followed by content lines.
    /// Renders as `/<command> none` when there are no lines.
    Lines {
        /// Wire keyword, including the leading `/`.
        keyword: &'static str,
        /// Content lines, already formatted.
        lines: Vec<String>,
    },
}

impl Reply {
    /// Status reply for `keyword` with `token`.
    #[must_use]
    pub fn status(keyword: &'static str, token: &'static str) -> Self {
        Self::Status { keyword, token }
    }

    /// Value reply for `keyword`.
    #[must_use]
    pub fn value(keyword: &'static str, value: impl Into<String>) -> Self {
        Self::Value { keyword, value: value.into() }
    }

    /// Multi-line reply for `keyword`; empty `lines` renders as `none`.
    #[must_use]
    pub fn lines(keyword: &'static str, lines: Vec<String>) -> Self {
        Self::Lines { keyword, lines }
    }

    /// The `/help` command summary.
    #[must_use]
    pub fn help() -> Self {
        let lines = [
            "/register <user> <pass> - create an account",
            "/login <user> <pass> - log in with existing credentials",
            "/create <#room> - create a new room",
            "/join <#room> - join a room (leaves the previous one)",
            "/msg <text> - send a message to the current room",
            "/msgs - fetch pending messages for the current room",
            "/pmsg <user> <text> - send a private message",
            "/pmsgs - fetch pending private messages",
            "/users [#room] - list members of a room",
            "/allusers - list connected users",
            "/rooms - list all rooms",
            "/room - show the current room",
            "/exit - leave the server",
        ];
        Self::Lines { keyword: "/help", lines: lines.iter().map(ToString::to_string).collect() }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { keyword, token } => write!(f, "{keyword} {token}"),
            Self::Value { keyword, value } => write!(f, "{keyword} {value}"),
            Self::Lines { keyword, lines } => {
                if lines.is_empty() {
                    write!(f, "{keyword} none")
                } else {
                    write!(f, "{keyword}")?;
                    for line in lines {
                        write!(f, "\n{line}")?;
                    }
                    Ok(())
                }
            },
        }
    }
}
