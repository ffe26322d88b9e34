//! Server errors.

use std::{io, net::SocketAddr};

use thiserror::Error;

/// Failure starting or running the HTTP server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Listening socket could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address
        addr: SocketAddr,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Accept loop failed
    #[error("server error: {0}")]
    Serve(#[from] io::Error),

    /// Log filter directive could not be parsed
    #[error("invalid log filter {filter:?}: {reason}")]
    LogFilter {
        /// Directive as given
        filter: String,
        /// Parser message
        reason: String,
    },
}
