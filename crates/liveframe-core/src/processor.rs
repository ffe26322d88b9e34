//! Dispatch state machine.
//!
//! A [`Processor`] owns one session's committed state and applies messages to
//! it. It performs no I/O: each call returns [`SessionAction`]s describing
//! what the caller must do (push a frame, arm a follow-up timer). This keeps
//! the dispatch rules testable without a runtime and lets the session task and
//! the synchronous test harness share them.
//!
//! # Dispatch
//!
//! ```text
//!   Idle ──> Resolving ──> Executing ──> Committing ──> Scheduling ──> Idle
//!               │              │
//!               │ unknown      │ error / panic
//!               ▼              ▼
//!             Idle           Idle (state untouched)
//!
//!   close() ──> Closed (terminal, every dispatch is refused)
//! ```
//!
//! Handlers run against a working copy of the state. The copy replaces the
//! committed state only when the handler succeeds, so a failing or panicking
//! handler can never leave a half-applied mutation behind.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};

use liveframe_proto::{Frame, Message};

use crate::{
    error::{DispatchError, HandlerError, RenderError},
    handler::{Handler, MessageMap},
    response::{FollowUp, Response},
    routing,
    session::SessionId,
    state::State,
    view,
};

/// Where a processor is in the dispatch sequence.
///
/// Between calls a processor is always `Idle` or `Closed`. The intermediate
/// phases are observable only from inside a handler's panic or through
/// tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
    /// Waiting for a message
    Idle,
    /// Looking up the handler
    Resolving,
    /// Handler running against the working copy
    Executing,
    /// Working copy committed, render in progress
    Committing,
    /// Follow-up being handed to the caller
    Scheduling,
    /// Connection gone
    Closed,
}

/// Side effect requested by the processor.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Push a frame to the session's connection
    Send(Frame),
    /// Dispatch a message to this session after a delay
    Schedule(FollowUp),
}

/// Dispatch state machine for one session.
pub struct Processor<S: State> {
    session_id: SessionId,
    state: S,
    system: MessageMap<S>,
    phase: DispatchPhase,
}

impl<S: State> Processor<S> {
    /// Processor for an already initialised state.
    pub fn new(session_id: SessionId, state: S) -> Self {
        Self { session_id, state, system: routing::system_messages(), phase: DispatchPhase::Idle }
    }

    /// Apply one message.
    ///
    /// On success the returned actions always start with exactly one
    /// `Send` carrying the render of the newly committed state, followed by
    /// at most one `Schedule`.
    ///
    /// # Errors
    ///
    /// - `ConnectionClosed` if the processor was closed. Nothing is resolved
    ///   or rendered.
    /// - `UnknownMessage` if neither the system map nor the state's map binds
    ///   the message name. State is untouched and nothing is rendered.
    /// - `Handler` if the handler returned an error or panicked. State is
    ///   untouched; use [`DispatchError::error_frame`] for the view to show.
    pub fn process(&mut self, message: &Message) -> Result<Vec<SessionAction>, DispatchError> {
        if self.phase == DispatchPhase::Closed {
            return Err(DispatchError::ConnectionClosed { session: self.session_id });
        }

        self.phase = DispatchPhase::Resolving;
        let handler = match self.resolve(&message.name) {
            Ok(Some(handler)) => handler,
            Ok(None) => {
                self.phase = DispatchPhase::Idle;
                return Err(DispatchError::UnknownMessage { name: message.name.clone() });
            },
            Err(source) => {
                self.phase = DispatchPhase::Idle;
                return Err(DispatchError::Handler { name: message.name.clone(), source });
            },
        };

        self.phase = DispatchPhase::Executing;
        let mut working = self.state.clone();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(message, &mut working)));
        let response = match outcome {
            Ok(response) => response,
            Err(payload) => Response::Failed(HandlerError::Panicked(panic_message(payload.as_ref()))),
        };

        let follow_up = match response {
            Response::Failed(source) => {
                self.phase = DispatchPhase::Idle;
                return Err(DispatchError::Handler { name: message.name.clone(), source });
            },
            Response::Done => None,
            Response::Next(follow_up) => Some(follow_up),
        };

        self.phase = DispatchPhase::Committing;
        self.state = working;
        let mut actions = vec![SessionAction::Send(self.render())];

        if let Some(follow_up) = follow_up {
            self.phase = DispatchPhase::Scheduling;
            actions.push(SessionAction::Schedule(follow_up));
        }

        self.phase = DispatchPhase::Idle;
        Ok(actions)
    }

    /// System map first, then the state's own map.
    fn resolve(&self, name: &str) -> Result<Option<Handler<S>>, HandlerError> {
        if let Some(handler) = self.system.get(name) {
            return Ok(Some(handler.clone()));
        }

        let state = &self.state;
        let handlers = panic::catch_unwind(AssertUnwindSafe(|| state.update()))
            .map_err(|payload| HandlerError::Panicked(panic_message(payload.as_ref())))?;
        Ok(handlers.get(name).cloned())
    }

    /// Render the committed state.
    ///
    /// Render errors and panics produce the fallback error view instead.
    pub fn render(&self) -> Frame {
        match render_state(&self.state) {
            Ok(body) => Frame::view(body),
            Err(err) => {
                tracing::error!(session = %self.session_id, error = %err, "render failed");
                Frame::error(view::error_page(&err.to_string()))
            },
        }
    }

    /// Refuse every further dispatch.
    pub fn close(&mut self) {
        self.phase = DispatchPhase::Closed;
    }

    /// Whether [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.phase == DispatchPhase::Closed
    }

    /// Current dispatch phase.
    pub fn phase(&self) -> DispatchPhase {
        self.phase
    }

    /// Committed state.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Session this processor belongs to.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }
}

/// Render `state`, converting a panic into a `RenderError`.
///
/// # Errors
///
/// Returns the state's own render error, or `Panicked` if render panicked.
pub fn render_state<S: State>(state: &S) -> Result<Vec<u8>, RenderError> {
    panic::catch_unwind(AssertUnwindSafe(|| state.render()))
        .unwrap_or_else(|payload| Err(RenderError::Panicked(panic_message(payload.as_ref()))))
}

/// Text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use serde_json::json;

    use super::*;
    use crate::{registry::SessionRegistry, routing::CHANGE_ROUTE, state::RequestContext};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Counter {
        count: i64,
        route: String,
        route_changes: Vec<(String, String)>,
        fail_render: bool,
    }

    impl State for Counter {
        type Shared = ();

        fn init(request: &RequestContext, _shared: &()) -> Self {
            Self { route: request.route().to_string(), ..Self::default() }
        }

        fn update(&self) -> MessageMap<Self> {
            MessageMap::new()
                .with("INCREMENT_COUNTER", |message, state: &mut Self| {
                    match message.args.decode_int() {
                        Ok(step) => {
                            state.count += step;
                            Response::ok()
                        },
                        Err(err) => Response::error(err),
                    }
                })
                .with("TICK", |_, state: &mut Self| {
                    state.count += 1;
                    Response::next_after(Message::without_args("TICK"), Duration::from_millis(33))
                })
                .with("FAIL_AFTER_MUTATION", |_, state: &mut Self| {
                    state.count = 999;
                    Response::error(HandlerError::msg("rejected"))
                })
                .with("BREAK_RENDER", |_, state: &mut Self| {
                    state.fail_render = true;
                    Response::ok()
                })
                .with("CRASH_ME", |_, state: &mut Self| {
                    state.count = 999;
                    panic!("boom")
                })
        }

        fn render(&self) -> Result<Vec<u8>, RenderError> {
            if self.fail_render {
                return Err(RenderError::msg("template missing"));
            }
            Ok(format!("<p>{}</p>", self.count).into_bytes())
        }

        fn route(&self) -> &str {
            &self.route
        }

        fn set_route(&mut self, route: &str) {
            self.route = route.to_string();
        }

        fn on_route_change(&mut self, new_route: &str) {
            self.route_changes.push((self.route.clone(), new_route.to_string()));
        }
    }

    fn processor() -> Processor<Counter> {
        let ctx = RequestContext::new(SessionId::new(1), "/", HashMap::new(), SessionRegistry::new());
        Processor::new(SessionId::new(1), Counter::init(&ctx, &()))
    }

    fn sent_text(actions: &[SessionAction]) -> String {
        match &actions[0] {
            SessionAction::Send(frame) => frame.text().into_owned(),
            other => panic!("expected send, got {other:?}"),
        }
    }

    #[test]
    fn increment_commits_and_renders() {
        let mut processor = processor();

        let actions = processor.process(&Message::new("INCREMENT_COUNTER", json!(1))).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(sent_text(&actions), "<p>1</p>");
        assert_eq!(processor.state().count, 1);

        processor.process(&Message::new("INCREMENT_COUNTER", json!(-1))).unwrap();
        assert_eq!(processor.state().count, 0);
        assert_eq!(processor.phase(), DispatchPhase::Idle);
    }

    #[test]
    fn unknown_message_leaves_state_alone() {
        let mut processor = processor();
        let before = processor.state().clone();

        let err = processor.process(&Message::without_args("NOPE")).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownMessage { ref name } if name == "NOPE"));
        assert!(err.error_frame().is_none());
        assert_eq!(processor.state(), &before);
    }

    #[test]
    fn decode_error_is_handler_error() {
        let mut processor = processor();

        let err = processor.process(&Message::new("INCREMENT_COUNTER", json!("one"))).unwrap_err();
        assert!(matches!(err, DispatchError::Handler { source: HandlerError::Decode(_), .. }));
        assert!(err.error_frame().unwrap().is_error());
        assert_eq!(processor.state().count, 0);
    }

    #[test]
    fn failed_handler_discards_mutation() {
        let mut processor = processor();

        let err = processor.process(&Message::without_args("FAIL_AFTER_MUTATION")).unwrap_err();
        assert!(matches!(err, DispatchError::Handler { .. }));
        assert_eq!(processor.state().count, 0);
    }

    #[test]
    fn panic_is_contained() {
        let mut processor = processor();

        let err = processor.process(&Message::without_args("CRASH_ME")).unwrap_err();
        match &err {
            DispatchError::Handler { source: HandlerError::Panicked(message), .. } => {
                assert_eq!(message, "boom");
            },
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(processor.state().count, 0);
        assert_eq!(processor.phase(), DispatchPhase::Idle);

        processor.process(&Message::new("INCREMENT_COUNTER", json!(2))).unwrap();
        assert_eq!(processor.state().count, 2);
    }

    #[test]
    fn follow_up_is_scheduled_after_render() {
        let mut processor = processor();

        let actions = processor.process(&Message::without_args("TICK")).unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(sent_text(&actions), "<p>1</p>");
        assert_eq!(
            actions[1],
            SessionAction::Schedule(FollowUp {
                message: Message::without_args("TICK"),
                delay: Duration::from_millis(33),
            })
        );
    }

    #[test]
    fn closed_processor_refuses_everything() {
        let mut processor = processor();
        processor.close();

        let err = processor.process(&Message::new("INCREMENT_COUNTER", json!(1))).unwrap_err();
        assert!(matches!(err, DispatchError::ConnectionClosed { .. }));
        assert!(processor.is_closed());
        assert_eq!(processor.state().count, 0);
    }

    #[test]
    fn change_route_runs_hook_first() {
        let mut processor = processor();

        processor.process(&Message::new(CHANGE_ROUTE, json!("/chat"))).unwrap();
        assert_eq!(processor.state().route, "/chat");
        assert_eq!(processor.state().route_changes, vec![("/".to_string(), "/chat".to_string())]);
    }

    #[test]
    fn change_route_requires_string() {
        let mut processor = processor();

        let err = processor.process(&Message::new(CHANGE_ROUTE, json!(3))).unwrap_err();
        assert!(matches!(err, DispatchError::Handler { .. }));
        assert_eq!(processor.state().route, "/");
    }

    #[test]
    fn render_failure_yields_error_frame() {
        let mut processor = processor();

        let actions = processor.process(&Message::without_args("BREAK_RENDER")).unwrap();
        match &actions[0] {
            SessionAction::Send(frame) => {
                assert!(frame.is_error());
                assert!(frame.text().contains("template missing"));
            },
            other => panic!("expected send, got {other:?}"),
        }
    }

    #[test]
    fn render_is_idempotent() {
        let mut processor = processor();
        processor.process(&Message::new("INCREMENT_COUNTER", json!(5))).unwrap();

        assert_eq!(processor.render(), processor.render());
    }
}
