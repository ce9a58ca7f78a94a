//! Error types for the link server.

use std::net::SocketAddr;

/// Errors produced by the link server.
///
/// Only startup failures surface here; a failing client session is
/// logged and the server goes back to accepting.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}
