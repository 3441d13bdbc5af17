//! Infrastructure error type.

use std::net::SocketAddr;

/// The error type returned by the server's fallible operations.
///
/// Application-level failures (404, 400, 500 from a handler) are
/// [`Response`](crate::Response) values by the time they leave the
/// pipeline. This type only surfaces failures of the server itself:
/// binding the listening socket or reading its address.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
