//! In-process client for live sessions.
//!
//! A [`LiveClient`] stands where the connection adapter would: it owns the
//! receiving end of a session's frame channel and feeds messages into the
//! session's queue. No socket is involved, so tests stay deterministic under
//! tokio's paused clock.

use std::time::Duration;

use liveframe_core::{
    ConnectRequest, Connection, Environment, Frame, Message, Runtime, RuntimeError, SessionError,
    SessionHandle, SessionId, State,
};
use serde_json::Value;
use tokio::sync::mpsc;

/// How long [`LiveClient::next_frame`] waits before giving up.
pub const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

/// Client side of one live session.
#[derive(Debug)]
pub struct LiveClient {
    handle: SessionHandle,
    frames: mpsc::UnboundedReceiver<Frame>,
}

impl LiveClient {
    /// Open a session on `runtime` at `route`.
    ///
    /// # Errors
    ///
    /// Returns the runtime's refusal (session limit, init failure).
    pub fn connect<S: State, E: Environment>(
        runtime: &Runtime<S, E>,
        route: &str,
    ) -> Result<Self, RuntimeError> {
        Self::connect_with(runtime, &ConnectRequest::new(route))
    }

    /// Open a session with a full connect request.
    ///
    /// # Errors
    ///
    /// Returns the runtime's refusal (session limit, init failure).
    pub fn connect_with<S: State, E: Environment>(
        runtime: &Runtime<S, E>,
        request: &ConnectRequest,
    ) -> Result<Self, RuntimeError> {
        let (connection, frames) = Connection::channel();
        let handle = runtime.open_session(request, connection)?;
        Ok(Self { handle, frames })
    }

    /// Session id.
    pub fn id(&self) -> SessionId {
        self.handle.id()
    }

    /// Session handle.
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// Send `name` with JSON `args`.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the session has shut down.
    pub fn send(&self, name: &str, args: Value) -> Result<(), SessionError> {
        self.handle.dispatch(Message::new(name, args))
    }

    /// Wait for the next frame.
    ///
    /// Returns `None` if the session closed or nothing arrived within
    /// [`FRAME_TIMEOUT`].
    pub async fn next_frame(&mut self) -> Option<Frame> {
        self.next_frame_within(FRAME_TIMEOUT).await
    }

    /// Wait up to `timeout` for the next frame.
    pub async fn next_frame_within(&mut self, timeout: Duration) -> Option<Frame> {
        tokio::time::timeout(timeout, self.frames.recv()).await.ok().flatten()
    }

    /// Wait for the next frame and return its body as text.
    pub async fn next_text(&mut self) -> Option<String> {
        self.next_frame().await.map(Frame::into_text)
    }

    /// Whether no frame arrives for `duration`.
    pub async fn expect_silence(&mut self, duration: Duration) -> bool {
        self.next_frame_within(duration).await.is_none()
    }

    /// Take every frame that has already arrived without waiting.
    pub fn drain(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.frames.try_recv() {
            frames.push(frame);
        }
        frames
    }

    /// Close the session and wait for its teardown.
    pub async fn disconnect(self) {
        self.handle.close();
        self.handle.closed().await;
    }

    /// Drop the receiving side without telling the session, as a network
    /// failure would. The session notices without further traffic.
    pub fn drop_connection(self) -> SessionHandle {
        self.handle
    }
}
