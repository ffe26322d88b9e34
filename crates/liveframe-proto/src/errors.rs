//! Error types for wire decoding.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding or encoding a frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Inbound frame exceeds the configured size limit.
    #[error("frame of {size} bytes exceeds limit of {max} bytes")]
    FrameTooLarge {
        /// Size of the rejected frame
        size: usize,
        /// Configured limit
        max: usize,
    },

    /// Frame is not a valid message envelope.
    #[error("malformed message envelope: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Envelope carries an empty message name.
    #[error("message name must not be empty")]
    EmptyName,

    /// Envelope could not be serialized.
    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Argument payload does not have the shape a handler expects.
#[derive(Debug, Error)]
#[error("cannot decode args as {expected}: {source}")]
pub struct DecodeError {
    /// Type the handler asked for
    pub expected: &'static str,
    /// Underlying serde failure
    #[source]
    pub source: serde_json::Error,
}
