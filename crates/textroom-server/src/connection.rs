//! Per-connection task.
//!
//! Each accepted socket gets one task running [`handle`]: a buffered
//! line-read loop feeding the dispatcher, plus a dedicated writer task
//! that owns the write half. All output for the connection - command
//! replies and pushed messages alike - funnels through one unbounded
//! channel into the writer, so every logical message is exactly one
//! socket write and interleaved writers cannot tear lines.
//!
//! Cleanup runs exactly once, after the read loop exits for any reason
//! (clean `/exit`, EOF, or a socket error): the identity is unbound and
//! removed from its current room.

use std::{net::SocketAddr, sync::Arc};

use textroom_proto::{Command, GREETING};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpStream, tcp::OwnedWriteHalf},
    sync::mpsc,
};
use tracing::{debug, info};

use crate::{
    Shared,
    dispatcher::{self, Transition},
};

/// Drive one client connection from greeting to cleanup.
pub(crate) async fn handle(shared: Arc<Shared>, stream: TcpStream, peer: SocketAddr) {
    let (reader, writer) = stream.into_split();
    let (outbound, outbox) = mpsc::unbounded_channel::<String>();
    let writer_task = tokio::spawn(write_loop(writer, outbox));

    let mut identity: Option<String> = None;

    if outbound.send(GREETING.to_string()).is_ok() {
        let mut lines = BufReader::new(reader).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    debug!(%peer, error = %e, "read failed");
                    break;
                },
            };

            let cmd = match Command::parse(&line) {
                Ok(cmd) => cmd,
                Err(e) => {
                    if outbound.send(e.wire_line()).is_err() {
                        break;
                    }
                    continue;
                },
            };

            let out = dispatcher::dispatch(&shared, cmd, identity.as_deref(), &outbound).await;
            if outbound.send(out.reply.to_string()).is_err() {
                break;
            }
            match out.transition {
                Transition::None => {},
                Transition::LoggedIn(name) => {
                    info!(%peer, user = %name, "logged in");
                    identity = Some(name);
                },
                Transition::Close => break,
            }
        }
    }

    if let Some(name) = identity {
        // Lock order: sessions before rooms, same as the dispatcher.
        let mut sessions = shared.sessions.lock().await;
        let mut rooms = shared.rooms.lock().await;
        if let Some(room) = sessions.current_room(&name).cloned() {
            rooms.leave(&room, &name);
        }
        sessions.unbind(&name);
        info!(%peer, user = %name, "session closed");
    } else {
        debug!(%peer, "connection closed before login");
    }

    // Dropping the sender lets the writer drain queued output and exit.
    drop(outbound);
    writer_task.await.ok();
}

/// Sole owner of the write half: one `write_all` per logical message.
async fn write_loop(mut writer: OwnedWriteHalf, mut outbox: mpsc::UnboundedReceiver<String>) {
    while let Some(line) = outbox.recv().await {
        let framed = format!("{line}\n");
        if writer.write_all(framed.as_bytes()).await.is_err() {
            break;
        }
    }
    writer.shutdown().await.ok();
}
