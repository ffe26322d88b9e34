//! Error types for the core runtime.
//!
//! Every error here is contained at the session boundary. None of them
//! terminates the process; the worst outcome is an error view on the
//! affected tab or a refused connection.

use liveframe_proto::{DecodeError, Frame};
use thiserror::Error;

use crate::{session::SessionId, view};

/// Failure reported by a message handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Argument payload did not match what the handler expects
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Handler panicked; the panic was caught at the dispatch boundary
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// Application-defined failure
    #[error("{0}")]
    Failed(String),
}

impl HandlerError {
    /// Application-defined failure with a human-readable message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Failure while serializing a view.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Application render returned an error
    #[error("render failed: {0}")]
    Failed(String),

    /// Application render panicked
    #[error("render panicked: {0}")]
    Panicked(String),
}

impl RenderError {
    /// Render failure with a human-readable message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Why a message was not applied.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Session's connection is gone; nothing is resolved or rendered
    #[error("connection closed for session {session}")]
    ConnectionClosed {
        /// Session the message was addressed to
        session: SessionId,
    },

    /// No handler is registered under this name
    #[error("could not process message {name}: message does not exist")]
    UnknownMessage {
        /// Unresolved message name
        name: String,
    },

    /// Handler returned an error or panicked; state was not committed
    #[error("could not process message {name}: {source}")]
    Handler {
        /// Message whose handler failed
        name: String,
        /// Handler failure
        #[source]
        source: HandlerError,
    },
}

impl DispatchError {
    /// Frame shown to the client for this failure, if it has one.
    ///
    /// Only handler failures are visible. Unknown messages are logged and
    /// otherwise ignored; a closed connection has nobody to show anything to.
    pub fn error_frame(&self) -> Option<Frame> {
        match self {
            Self::Handler { .. } => Some(Frame::error(view::error_page(&self.to_string()))),
            Self::ConnectionClosed { .. } | Self::UnknownMessage { .. } => None,
        }
    }
}

/// Handler registry construction errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two maps register the same message name
    #[error("duplicate handler registered for message {name}")]
    DuplicateHandler {
        /// Colliding message name
        name: String,
    },
}

/// A session could not be created.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Live session limit reached; the connection is refused
    #[error("session limit of {limit} reached")]
    SessionLimitReached {
        /// Configured limit
        limit: usize,
    },

    /// Generated session id is already registered
    #[error("session {0} already registered")]
    DuplicateSession(SessionId),

    /// Application `init` or initial route change panicked
    #[error("session initialisation failed: {0}")]
    InitFailed(String),

    /// Rendering the initial document failed
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Session no longer accepts commands.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// Session task has shut down
    #[error("session {0} is closed")]
    Closed(SessionId),
}

/// Outbound frame could not be delivered.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("connection closed")]
pub struct ConnectionClosed;
