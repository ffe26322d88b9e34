//! Outbound side of a session's connection.
//!
//! The runtime never touches sockets. A [`Connection`] is the sending half of
//! a frame channel; the connection adapter owns the receiving half and writes
//! whatever arrives to the socket. Once the adapter drops the receiver the
//! session tears itself down, whether or not it has anything left to send.

use liveframe_proto::Frame;
use tokio::sync::mpsc;

use crate::error::ConnectionClosed;

/// Handle for pushing frames to one client.
#[derive(Debug, Clone)]
pub struct Connection {
    frames: mpsc::UnboundedSender<Frame>,
}

impl Connection {
    /// Wrap the sending half of a frame channel.
    pub fn new(frames: mpsc::UnboundedSender<Frame>) -> Self {
        Self { frames }
    }

    /// Create a connection and the receiver its frames arrive on.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Frame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Push a frame.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionClosed` if the receiving side is gone.
    pub fn send(&self, frame: Frame) -> Result<(), ConnectionClosed> {
        self.frames.send(frame).map_err(|_| ConnectionClosed)
    }

    /// Whether the receiving side is gone.
    pub fn is_closed(&self) -> bool {
        self.frames.is_closed()
    }

    /// Wait until the receiving side is gone.
    pub async fn closed(&self) {
        self.frames.closed().await;
    }
}
