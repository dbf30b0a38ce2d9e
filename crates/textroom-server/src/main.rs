//! Chat server binary: argument parsing, logging setup, accept loop.

use std::sync::Arc;

use clap::Parser;
use textroom_server::{Server, ServerError, store::MemoryStore};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "textroom-server", about = "Text-line TCP chat server", version)]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:7878")]
    listen: String,

    /// Maximum concurrent client connections.
    #[arg(long, default_value_t = 1024)]
    max_connections: usize,

    /// Log level (trace, debug, info, warn, error); `RUST_LOG` overrides.
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let server = Server::bind(&args.listen, Arc::new(MemoryStore::new()), args.max_connections)
        .await?;
    info!(addr = %args.listen, max_connections = args.max_connections, "server starting");
    server.run().await
}
