//! Concurrent text-line chat server.
//!
//! The server speaks a newline-delimited UTF-8 protocol over TCP: clients
//! send `/<command>` lines, the server answers with status lines or
//! multi-line payloads and pushes room and private messages as `from:
//! body` lines. One task per connection; shared state lives in three
//! registries behind async mutexes plus a pluggable persistence
//! collaborator.
//!
//! Locking discipline: when a code path needs more than one registry it
//! acquires them in the fixed order sessions, rooms, pending, and no
//! registry lock is ever held across a [`store::Store`] call or a socket
//! operation.

mod connection;
mod dispatcher;
pub mod error;
pub mod pending;
pub mod registry;
pub mod rooms;
pub mod store;

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

pub use error::ServerError;
use pending::PendingStore;
use registry::SessionRegistry;
use rooms::RoomRegistry;
use store::Store;
use textroom_proto::WELCOME_ROOM;
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, ToSocketAddrs},
    sync::Mutex,
};
use tracing::{info, warn};

/// State shared by all connection tasks.
pub(crate) struct Shared {
    /// Logged-in identities and their outbound handles.
    pub(crate) sessions: Mutex<SessionRegistry>,
    /// Rooms and the membership relation.
    pub(crate) rooms: Mutex<RoomRegistry>,
    /// Queued messages awaiting `/msgs` and `/pmsgs` pulls.
    pub(crate) pending: Mutex<PendingStore>,
    /// Persistence collaborator.
    pub(crate) store: Arc<dyn Store>,
    /// Live connection count, against `max_connections`.
    active: AtomicUsize,
    max_connections: usize,
}

impl Shared {
    pub(crate) fn new(store: Arc<dyn Store>, max_connections: usize) -> Self {
        Self {
            sessions: Mutex::new(SessionRegistry::new()),
            rooms: Mutex::new(RoomRegistry::new()),
            pending: Mutex::new(PendingStore::new()),
            store,
            active: AtomicUsize::new(0),
            max_connections,
        }
    }

    /// Reserve a connection slot; `false` when the cap is reached.
    fn try_acquire_slot(&self) -> bool {
        self.active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.max_connections).then_some(n + 1)
            })
            .is_ok()
    }

    fn release_slot(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A bound TCP chat server.
///
/// [`Server::bind`] reserves the listening socket and seeds the default
/// room; [`Server::run`] accepts connections until the listener fails.
pub struct Server {
    listener: TcpListener,
    shared: Arc<Shared>,
}

impl Server {
    /// Bind the listener and prepare shared state.
    ///
    /// The default room `#welcome` always exists after a successful bind.
    ///
    /// # Errors
    ///
    /// - `ServerError::Config` if `max_connections` is zero
    /// - `ServerError::Io` if the address cannot be bound
    pub async fn bind(
        addr: impl ToSocketAddrs,
        store: Arc<dyn Store>,
        max_connections: usize,
    ) -> Result<Self, ServerError> {
        if max_connections == 0 {
            return Err(ServerError::Config("max_connections must be at least 1".to_string()));
        }

        let listener = TcpListener::bind(addr).await?;
        let shared = Arc::new(Shared::new(store, max_connections));

        shared.rooms.lock().await.create(WELCOME_ROOM).ok();
        if let Err(e) = shared.store.create_room(WELCOME_ROOM).await {
            // An existing persisted record is the normal restart case.
            if !matches!(e, store::StoreError::Conflict(_)) {
                return Err(e.into());
            }
        }

        Ok(Self { listener, shared })
    }

    /// Address the listener is bound to.
    ///
    /// # Errors
    ///
    /// - `ServerError::Io` if the socket has been invalidated
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the listener errors.
    ///
    /// Each accepted socket gets its own task; sockets beyond the
    /// connection cap are dropped immediately with a log line.
    ///
    /// # Errors
    ///
    /// - `ServerError::Io` if `accept` fails
    pub async fn run(self) -> Result<(), ServerError> {
        info!(addr = ?self.listener.local_addr(), "accepting connections");
        loop {
            let (stream, peer) = self.listener.accept().await?;
            if !self.shared.try_acquire_slot() {
                warn!(%peer, limit = self.shared.max_connections, "connection limit reached");
                // Off the accept loop: a stalled peer must not block accepts.
                tokio::spawn(async move {
                    let mut stream = stream;
                    stream.write_all(b"server_full\n").await.ok();
                    stream.shutdown().await.ok();
                });
                continue;
            }

            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move {
                connection::handle(Arc::clone(&shared), stream, peer).await;
                shared.release_slot();
            });
        }
    }
}
