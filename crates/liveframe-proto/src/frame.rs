//! Server-to-client frames.

use std::borrow::Cow;

use bytes::Bytes;

/// What a frame's body represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// Render output of the session's current state
    View,
    /// Fallback error view replacing the session's render
    Error,
}

/// One server-to-client payload: the full serialized view.
///
/// The body is sent as a single text message. The kind never goes on the
/// wire; it exists so the runtime and tests can tell fallback error views
/// apart from regular renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    kind: FrameKind,
    body: Bytes,
}

impl Frame {
    /// Frame carrying a regular render.
    pub fn view(body: impl Into<Bytes>) -> Self {
        Self { kind: FrameKind::View, body: body.into() }
    }

    /// Frame carrying an error view.
    pub fn error(body: impl Into<Bytes>) -> Self {
        Self { kind: FrameKind::Error, body: body.into() }
    }

    /// Frame kind.
    pub fn kind(&self) -> FrameKind {
        self.kind
    }

    /// Whether this is an error view.
    pub fn is_error(&self) -> bool {
        self.kind == FrameKind::Error
    }

    /// Raw body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Consume the frame into an owned text payload for the socket.
    pub fn into_text(self) -> String {
        match String::from_utf8(self.body.to_vec()) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }
    }
}
