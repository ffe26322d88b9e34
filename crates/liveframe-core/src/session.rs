//! Session task.
//!
//! Each session runs as one tokio task that owns its [`Processor`] and its
//! [`Connection`]. Everything that can touch the session's state arrives on
//! one command queue, so handler invocations for a session never overlap:
//!
//! ```text
//!   adapter ── Dispatch ──┐
//!   timers ─── FollowUp ──┼──> queue ──> SessionRunner ──> Processor
//!   broadcast ─ Rerender ─┤                    │
//!   close ──── Close ─────┘                    └──> Connection
//! ```
//!
//! Follow-up timers are separate tasks holding only a weak sender to the
//! queue. They never keep a session alive, and the runner aborts every
//! pending timer when the session tears down.

use std::{collections::HashMap, fmt, time::Duration};

use liveframe_proto::{Frame, Message};
use tokio::{sync::mpsc, task::AbortHandle};

use crate::{
    connection::Connection,
    env::Environment,
    error::{DispatchError, SessionError},
    processor::{Processor, SessionAction},
    registry::SessionRegistry,
    response::FollowUp,
    state::State,
};

/// Session identifier, drawn from the runtime's environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// Wrap a raw id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw id.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Debug)]
pub(crate) enum SessionCommand {
    Dispatch(Message),
    FollowUp { timer: u64, message: Message },
    Rerender,
    Close,
}

/// Cloneable handle to a live session.
///
/// All methods are non-blocking: they enqueue a command for the session task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    commands: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    pub(crate) fn channel(id: SessionId) -> (Self, mpsc::UnboundedReceiver<SessionCommand>) {
        let (commands, rx) = mpsc::unbounded_channel();
        (Self { id, commands }, rx)
    }

    /// Session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Queue an inbound message.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the session task has shut down.
    pub fn dispatch(&self, message: Message) -> Result<(), SessionError> {
        self.send(SessionCommand::Dispatch(message))
    }

    /// Queue a re-render of the current state.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the session task has shut down.
    pub fn rerender(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Rerender)
    }

    /// Ask the session to shut down. Idempotent.
    pub fn close(&self) {
        let _ = self.send(SessionCommand::Close);
    }

    /// Whether the session task has shut down.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    /// Wait until the session task has shut down and left the registry.
    pub async fn closed(&self) {
        self.commands.closed().await;
    }

    fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands.send(command).map_err(|_| SessionError::Closed(self.id))
    }
}

/// Owns one session's processor and connection for the life of the session.
pub(crate) struct SessionRunner<S: State, E: Environment> {
    processor: Processor<S>,
    connection: Option<Connection>,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    loopback: mpsc::WeakUnboundedSender<SessionCommand>,
    timers: HashMap<u64, AbortHandle>,
    next_timer: u64,
    env: E,
    registry: SessionRegistry,
    max_pending_follow_ups: usize,
}

impl<S: State, E: Environment> SessionRunner<S, E> {
    pub(crate) fn new(
        processor: Processor<S>,
        connection: Connection,
        handle: &SessionHandle,
        commands: mpsc::UnboundedReceiver<SessionCommand>,
        env: E,
        registry: SessionRegistry,
        max_pending_follow_ups: usize,
    ) -> Self {
        Self {
            processor,
            connection: Some(connection),
            commands,
            loopback: handle.commands.downgrade(),
            timers: HashMap::new(),
            next_timer: 0,
            env,
            registry,
            max_pending_follow_ups,
        }
    }

    fn session_id(&self) -> SessionId {
        self.processor.session_id()
    }

    /// Push the first render, then process commands until the session closes.
    pub(crate) async fn run(mut self) {
        tracing::info!(session = %self.session_id(), "session live");

        let initial = self.processor.render();
        self.send(initial);

        while !self.processor.is_closed() {
            let command = tokio::select! {
                command = self.commands.recv() => command,
                () = connection_closed(self.connection.as_ref()) => {
                    tracing::debug!(session = %self.processor.session_id(), "connection gone");
                    break;
                },
            };
            let Some(command) = command else {
                break;
            };

            match command {
                SessionCommand::Dispatch(message) => self.dispatch(&message),
                SessionCommand::FollowUp { timer, message } => {
                    self.timers.remove(&timer);
                    self.dispatch(&message);
                },
                SessionCommand::Rerender => {
                    let frame = self.processor.render();
                    self.send(frame);
                },
                SessionCommand::Close => break,
            }
        }

        self.teardown();
    }

    fn dispatch(&mut self, message: &Message) {
        match self.processor.process(message) {
            Ok(actions) => {
                for action in actions {
                    match action {
                        SessionAction::Send(frame) => self.send(frame),
                        SessionAction::Schedule(follow_up) => self.schedule(follow_up),
                    }
                }
            },
            Err(err @ DispatchError::UnknownMessage { .. }) => {
                tracing::warn!(session = %self.session_id(), error = %err, "message ignored");
            },
            Err(err @ DispatchError::Handler { .. }) => {
                tracing::warn!(session = %self.session_id(), error = %err, "handler failed");
                if let Some(frame) = err.error_frame() {
                    self.send(frame);
                }
            },
            Err(err @ DispatchError::ConnectionClosed { .. }) => {
                tracing::debug!(session = %self.session_id(), error = %err, "dispatch skipped");
            },
        }
    }

    fn send(&mut self, frame: Frame) {
        let Some(connection) = &self.connection else {
            return;
        };

        if connection.send(frame).is_err() {
            tracing::debug!(session = %self.session_id(), "connection gone");
            self.connection = None;
            self.processor.close();
        }
    }

    fn schedule(&mut self, follow_up: FollowUp) {
        let session = self.session_id();
        let FollowUp { message, delay } = follow_up;

        if self.processor.is_closed() {
            tracing::debug!(session = %session, name = %message.name, "follow-up dropped: session closed");
            return;
        }

        if self.timers.len() >= self.max_pending_follow_ups {
            tracing::warn!(
                session = %session,
                name = %message.name,
                limit = self.max_pending_follow_ups,
                "follow-up dropped: too many pending"
            );
            return;
        }

        let timer = self.next_timer;
        self.next_timer += 1;

        let env = self.env.clone();
        let loopback = self.loopback.clone();
        let task = tokio::spawn(async move {
            if delay > Duration::ZERO {
                env.sleep(delay).await;
            } else {
                tokio::task::yield_now().await;
            }

            let name = message.name.clone();
            let delivered = loopback
                .upgrade()
                .is_some_and(|tx| tx.send(SessionCommand::FollowUp { timer, message }).is_ok());
            if !delivered {
                tracing::debug!(session = %session, name = %name, "follow-up dropped: session closed");
            }
        });

        self.timers.insert(timer, task.abort_handle());
    }

    fn teardown(&mut self) {
        let session = self.session_id();
        self.processor.close();
        self.connection = None;

        let pending = self.timers.len();
        for (_, timer) in self.timers.drain() {
            timer.abort();
        }

        // Leave the registry before closing the queue: `SessionHandle::closed`
        // resolves on queue close.
        self.registry.remove(session);
        self.commands.close();
        tracing::info!(session = %session, cancelled_follow_ups = pending, "session closed");
    }
}

/// Resolves once the client side of `connection` is gone; never resolves
/// without a connection.
async fn connection_closed(connection: Option<&Connection>) {
    match connection {
        Some(connection) => connection.closed().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_displays_as_fixed_width_hex() {
        assert_eq!(SessionId::new(255).to_string(), "00000000000000ff");
    }

    #[tokio::test]
    async fn handle_reports_closed_after_receiver_drop() {
        let (handle, rx) = SessionHandle::channel(SessionId::new(7));
        assert!(handle.dispatch(Message::without_args("A")).is_ok());

        drop(rx);
        handle.closed().await;
        assert!(handle.is_closed());
        assert_eq!(handle.rerender(), Err(SessionError::Closed(SessionId::new(7))));
    }
}
