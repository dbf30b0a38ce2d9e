//! Wire protocol for the textroom chat service.
//!
//! The protocol is newline-terminated UTF-8 text. Each client line is
//! `/<command>[ <args...>]`; each server line is either a status line
//! `/<command> <token>` or a multi-line payload whose first line is the
//! `/<command>` keyword. Message bodies are never split on whitespace -
//! they are the unsplit remainder of the line.
//!
//! This crate is pure data: parsing, validation, and rendering. No I/O,
//! no async. The command set is a closed enum so the server dispatches
//! with an exhaustive `match` instead of a runtime keyword table.

mod command;
mod reply;
mod room;

pub use command::{Command, ParseError};
pub use reply::Reply;
pub use room::{InvalidRoomName, RoomName};

/// Line sent to every client immediately after the connection is accepted.
pub const GREETING: &str = "/register or /login required";

/// Room every deployment creates before accepting the first connection.
pub const WELCOME_ROOM: &str = "#welcome";
