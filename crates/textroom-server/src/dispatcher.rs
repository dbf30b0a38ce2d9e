//! Command dispatcher.
//!
//! Routes a parsed [`Command`] to its handler with the caller's identity
//! (or `None` before login) and the connection's outbound handle. All
//! shared-state mutation goes through the session registry, room
//! registry, and pending store, acquired in that fixed order whenever a
//! handler needs more than one; no lock is ever held across a store
//! call or any other await point that can suspend on I/O.
//!
//! Handlers return a [`Dispatch`]: the reply for the caller plus the
//! connection-state transition (log in, close, or nothing).

use textroom_proto::{Command, Reply, RoomName};

use crate::{
    Shared,
    registry::Outbound,
    rooms::RoomError,
    store::{StoreError, hash_password},
};

/// Connection-state change requested by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Transition {
    /// Stay in the current state.
    None,
    /// The caller authenticated as this identity.
    LoggedIn(String),
    /// Close the connection after writing the reply.
    Close,
}

/// Result of dispatching one command.
#[derive(Debug)]
pub(crate) struct Dispatch {
    /// Reply for the originating connection.
    pub reply: Reply,
    /// Requested connection-state change.
    pub transition: Transition,
}

impl Dispatch {
    fn reply(reply: Reply) -> Self {
        Self { reply, transition: Transition::None }
    }

    fn status(keyword: &'static str, token: &'static str) -> Self {
        Self::reply(Reply::status(keyword, token))
    }
}

/// Dispatch one command for a connection.
///
/// `caller` is `None` until the connection authenticates; `sender` is
/// the connection's outbound handle, registered on successful login.
pub(crate) async fn dispatch(
    shared: &Shared,
    cmd: Command,
    caller: Option<&str>,
    sender: &Outbound,
) -> Dispatch {
    // Auth gate: before login only register/login/help are live.
    let Some(caller) = caller else {
        if !cmd.allowed_unauthenticated() {
            return Dispatch::status(cmd.keyword(), "login_required");
        }
        return match cmd {
            Command::Register { user, pass } => handle_register(shared, &user, &pass).await,
            Command::Login { user, pass } => handle_login(shared, &user, &pass, sender).await,
            _ => Dispatch::reply(Reply::help()),
        };
    };

    match cmd {
        Command::Register { user, pass } => handle_register(shared, &user, &pass).await,
        // A connection carries at most one identity for its lifetime;
        // rebinding would orphan the current session's registry entries.
        Command::Login { .. } => Dispatch::status("/login", "already_logged_in"),
        Command::Create { room } => handle_create(shared, &room).await,
        Command::Join { room } => handle_join(shared, &room, caller).await,
        Command::Msg { text } => handle_msg(shared, caller, &text).await,
        Command::Msgs => handle_msgs(shared, caller).await,
        Command::Pmsg { to, text } => handle_pmsg(shared, caller, &to, &text).await,
        Command::Pmsgs => handle_pmsgs(shared, caller).await,
        Command::Users { room } => handle_users(shared, caller, room.as_deref()).await,
        Command::AllUsers => {
            let users = shared.sessions.lock().await.connected_users();
            Dispatch::reply(Reply::lines("/allusers", users))
        },
        Command::Rooms => {
            let rooms = shared.rooms.lock().await.list();
            Dispatch::reply(Reply::lines("/rooms", rooms))
        },
        Command::Room => {
            let current = shared.sessions.lock().await.current_room(caller).cloned();
            Dispatch::reply(Reply::value("/room", current.unwrap_or_else(|| "none".to_string())))
        },
        Command::Help => Dispatch::reply(Reply::help()),
        Command::Exit => {
            Dispatch { reply: Reply::status("/exit", "ok"), transition: Transition::Close }
        },
    }
}

async fn handle_register(shared: &Shared, user: &str, pass: &str) -> Dispatch {
    // Usernames must stay distinguishable from room names on the wire.
    if user.starts_with('#') {
        return Dispatch::status("/register", "invalid");
    }

    match shared.store.create_user(user, &hash_password(pass)).await {
        Ok(()) => Dispatch::status("/register", "ok"),
        Err(StoreError::Conflict(_)) => Dispatch::status("/register", "username_taken"),
        Err(e) => {
            tracing::error!(user, error = %e, "register failed in store");
            Dispatch::status("/register", "invalid")
        },
    }
}

async fn handle_login(shared: &Shared, user: &str, pass: &str, sender: &Outbound) -> Dispatch {
    match shared.store.verify_password(user, pass).await {
        Ok(true) => {
            // Check-and-insert under the registry lock: of two racing
            // logins for one identity, exactly one lands here first.
            let mut sessions = shared.sessions.lock().await;
            match sessions.register(user.to_string(), sender.clone()) {
                Ok(()) => Dispatch {
                    reply: Reply::status("/login", "ok"),
                    transition: Transition::LoggedIn(user.to_string()),
                },
                Err(_) => Dispatch::status("/login", "already_logged_in"),
            }
        },
        Ok(false) => Dispatch::status("/login", "invalid"),
        Err(e) => {
            tracing::error!(user, error = %e, "login verification failed in store");
            Dispatch::status("/login", "invalid")
        },
    }
}

async fn handle_create(shared: &Shared, room: &str) -> Dispatch {
    let Ok(name) = room.parse::<RoomName>() else {
        return Dispatch::status("/create", "invalid");
    };

    // The room registry is authoritative for existence; the persisted
    // record is history, written after the live create succeeds.
    let created = shared.rooms.lock().await.create(name.as_str());
    match created {
        Ok(()) => {
            if let Err(e) = shared.store.create_room(name.as_str()).await {
                tracing::warn!(room = %name, error = %e, "room not persisted");
            }
            Dispatch::status("/create", "ok")
        },
        Err(RoomError::AlreadyExists(_)) => Dispatch::status("/create", "exists"),
        Err(e) => {
            tracing::error!(room = %name, error = %e, "unexpected create failure");
            Dispatch::status("/create", "invalid")
        },
    }
}

async fn handle_join(shared: &Shared, room: &str, caller: &str) -> Dispatch {
    let Ok(name) = room.parse::<RoomName>() else {
        // A syntactically invalid name can never have been created.
        return Dispatch::status("/join", "nonexistent");
    };

    let joined = {
        let mut sessions = shared.sessions.lock().await;
        let mut rooms = shared.rooms.lock().await;
        match rooms.join(name.as_str(), caller) {
            Ok(()) => {
                sessions.set_room(caller, Some(name.as_str().to_string()));
                Ok(())
            },
            Err(e) => Err(e),
        }
    };

    match joined {
        Ok(()) => {
            if let Err(e) = shared.store.add_room_member(name.as_str(), caller).await {
                tracing::warn!(room = %name, user = caller, error = %e, "join not persisted");
            }
            Dispatch::status("/join", "ok")
        },
        Err(RoomError::NoSuchRoom(_)) => Dispatch::status("/join", "nonexistent"),
        Err(RoomError::AlreadyMember(_)) => Dispatch::status("/join", "already_member"),
        Err(e) => {
            tracing::error!(room = %name, error = %e, "unexpected join failure");
            Dispatch::status("/join", "nonexistent")
        },
    }
}

async fn handle_msg(shared: &Shared, caller: &str, text: &str) -> Dispatch {
    let Some(room) = shared.sessions.lock().await.current_room(caller).cloned() else {
        return Dispatch::status("/msg", "failed");
    };

    // History write is best-effort: a store failure must not abort live
    // delivery or fail the sender's acknowledgment.
    if let Err(e) = shared.store.append_message(&room, caller, text).await {
        tracing::warn!(%room, user = caller, error = %e, "message not persisted");
    }

    let line = format!("{caller}: {text}");
    {
        // One critical section for enqueue plus fan-out gives a total
        // delivery order per room. Lock order: sessions, rooms, pending.
        let sessions = shared.sessions.lock().await;
        let rooms = shared.rooms.lock().await;
        let mut pending = shared.pending.lock().await;

        pending.enqueue_room(&room, line.clone());

        if let Some(members) = rooms.members(&room) {
            for member in members {
                if member == caller {
                    continue;
                }
                if let Some(outbound) = sessions.lookup(member) {
                    if outbound.send(line.clone()).is_err() {
                        // Receiver gone mid-broadcast; its cleanup will
                        // unbind it. Other recipients still get the line.
                        tracing::warn!(%room, member, "push delivery failed");
                    }
                }
            }
        }
    }

    Dispatch::status("/msg", "sent")
}

async fn handle_msgs(shared: &Shared, caller: &str) -> Dispatch {
    let room = shared.sessions.lock().await.current_room(caller).cloned();
    let lines = match room {
        Some(room) => shared.pending.lock().await.drain_room(&room),
        None => Vec::new(),
    };
    Dispatch::reply(Reply::lines("/msgs", lines))
}

async fn handle_pmsg(shared: &Shared, caller: &str, to: &str, text: &str) -> Dispatch {
    match shared.store.find_user(to).await {
        Ok(Some(_)) => {},
        Ok(None) => return Dispatch::status("/pmsg", "nonexistent"),
        Err(e) => {
            tracing::error!(to, error = %e, "recipient lookup failed in store");
            return Dispatch::status("/pmsg", "nonexistent");
        },
    }

    if let Err(e) = shared.store.append_private_message(to, caller, text).await {
        tracing::warn!(to, from = caller, error = %e, "private message not persisted");
    }

    let line = format!("{caller}: {text}");
    {
        let sessions = shared.sessions.lock().await;
        let mut pending = shared.pending.lock().await;

        pending.enqueue_direct(to, line.clone());

        if let Some(outbound) = sessions.lookup(to) {
            if outbound.send(line).is_err() {
                tracing::warn!(to, "push delivery failed");
            }
        }
    }

    Dispatch::status("/pmsg", "sent")
}

async fn handle_pmsgs(shared: &Shared, caller: &str) -> Dispatch {
    let lines = shared.pending.lock().await.drain_direct(caller);
    Dispatch::reply(Reply::lines("/pmsgs", lines))
}

async fn handle_users(shared: &Shared, caller: &str, room: Option<&str>) -> Dispatch {
    let target = match room {
        Some(arg) => match arg.parse::<RoomName>() {
            Ok(name) => Some(name.into_string()),
            Err(_) => return Dispatch::status("/users", "invalid"),
        },
        None => shared.sessions.lock().await.current_room(caller).cloned(),
    };

    match target {
        None => Dispatch::reply(Reply::lines("/users", Vec::new())),
        Some(room) => match shared.rooms.lock().await.members_sorted(&room) {
            Some(members) => Dispatch::reply(Reply::lines("/users", members)),
            None => Dispatch::status("/users", "nonexistent"),
        },
    }
}
