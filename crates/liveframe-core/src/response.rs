//! Handler outcomes.
//!
//! A handler mutates the state it is given and returns a [`Response`] telling
//! the processor what happens next. The enum shape carries the contract: an
//! error can never come with a follow-up, and a delay only exists attached to
//! a follow-up message.

use std::time::Duration;

use liveframe_proto::Message;

use crate::error::HandlerError;

/// Message a handler schedules for its own session.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowUp {
    /// Message to dispatch
    pub message: Message,
    /// Time to wait before dispatching. Zero yields once and continues.
    pub delay: Duration,
}

/// Result of one handler invocation.
#[derive(Debug)]
pub enum Response {
    /// Commit the state and render
    Done,
    /// Commit, render, then dispatch a follow-up after its delay
    Next(FollowUp),
    /// Discard the state changes and show an error view
    Failed(HandlerError),
}

impl Response {
    /// Successful response with no follow-up.
    pub fn ok() -> Self {
        Self::Done
    }

    /// Error response.
    pub fn error(err: impl Into<HandlerError>) -> Self {
        Self::Failed(err.into())
    }

    /// Follow up immediately with `message`.
    pub fn next(message: Message) -> Self {
        Self::next_after(message, Duration::ZERO)
    }

    /// Follow up with `message` once `delay` has elapsed.
    pub fn next_after(message: Message, delay: Duration) -> Self {
        Self::Next(FollowUp { message, delay })
    }

    /// Whether this response reports an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Scheduled follow-up, if any.
    pub fn follow_up(&self) -> Option<&FollowUp> {
        match self {
            Self::Next(follow_up) => Some(follow_up),
            Self::Done | Self::Failed(_) => None,
        }
    }
}

impl<E: Into<HandlerError>> From<Result<(), E>> for Response {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::Done,
            Err(err) => Self::Failed(err.into()),
        }
    }
}
