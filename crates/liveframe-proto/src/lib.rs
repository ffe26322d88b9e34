//! Wire format for the liveframe protocol.
//!
//! Every browser tab holds one persistent duplex connection. Traffic in each
//! direction has exactly one shape:
//!
//! ```text
//! client ──{"message": "INCREMENT_COUNTER", "args": 1}──▶ server
//! client ◀──────────── full rendered view (text) ──────── server
//! ```
//!
//! The server never diffs. It sends the complete render output after every
//! state change and the client reconciles its DOM against it.
//!
//! Argument payloads are opaque JSON values. Handlers decode them on demand
//! through the typed decoders on [`Args`], which fail with a [`DecodeError`]
//! instead of panicking on a shape mismatch.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod args;
pub mod errors;
pub mod frame;
pub mod js;
pub mod message;

pub use args::Args;
pub use errors::{DecodeError, ProtocolError, Result};
pub use frame::{Frame, FrameKind};
pub use message::{MAX_FRAME_SIZE, Message};
