//! Message envelope.
//!
//! A message is a flat name plus an opaque argument payload. Names are plain
//! string keys; reusable components namespace them by convention
//! (`"<component-id>_<action>"`).
//!
//! # Wire format
//!
//! ```json
//! {"message": "INCREMENT_COUNTER", "args": 1}
//! ```
//!
//! `args` may be any JSON value or omitted entirely.

use serde::{Deserialize, Serialize};

use crate::{
    args::Args,
    errors::{ProtocolError, Result},
};

/// Default upper bound on the size of one inbound frame (1 MiB).
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// A named event with an opaque payload.
///
/// Decoded from an inbound frame, or constructed by a handler as a follow-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Handler lookup key
    #[serde(rename = "message")]
    pub name: String,

    /// Handler-specific payload
    #[serde(default)]
    pub args: Args,
}

impl Message {
    /// Create a message with a payload.
    pub fn new(name: impl Into<String>, args: impl Into<Args>) -> Self {
        Self { name: name.into(), args: args.into() }
    }

    /// Create a message with a `null` payload.
    pub fn without_args(name: impl Into<String>) -> Self {
        Self { name: name.into(), args: Args::null() }
    }

    /// Decode an inbound frame.
    ///
    /// # Errors
    ///
    /// - `FrameTooLarge` if `bytes` is longer than `max_size`
    /// - `Malformed` if the frame is not a message envelope
    /// - `EmptyName` if the envelope has an empty message name
    pub fn decode(bytes: &[u8], max_size: usize) -> Result<Self> {
        if bytes.len() > max_size {
            return Err(ProtocolError::FrameTooLarge { size: bytes.len(), max: max_size });
        }

        let message: Self = serde_json::from_slice(bytes).map_err(ProtocolError::Malformed)?;
        if message.name.is_empty() {
            return Err(ProtocolError::EmptyName);
        }

        Ok(message)
    }

    /// Encode this message as an envelope.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(ProtocolError::Encode)
    }
}
