//! Synchronous session driver.
//!
//! Wraps a [`Processor`] and records what a real session would have done with
//! its actions: frames are kept in order, follow-ups are queued instead of
//! armed on a timer.

use std::collections::VecDeque;

use liveframe_core::{
    ConnectRequest, DispatchError, FollowUp, Frame, Message, Processor, RequestContext,
    SessionAction, SessionId, SessionRegistry, State, routing,
};
use serde_json::Value;

/// Result of one dispatch.
pub type DispatchResult = Result<Vec<SessionAction>, DispatchError>;

/// A session without a runtime.
pub struct TestSession<S: State> {
    processor: Processor<S>,
    registry: SessionRegistry,
    frames: Vec<Frame>,
    follow_ups: VecDeque<FollowUp>,
}

impl<S: State> TestSession<S> {
    /// Session over an already built state.
    pub fn new(state: S) -> Self {
        Self::from_parts(state, SessionRegistry::new())
    }

    /// Session built the way the runtime builds one: `init` with a request
    /// context, then the connect route applied.
    pub fn init(request: &ConnectRequest, shared: &S::Shared) -> Self {
        let registry = SessionRegistry::new();
        let context = RequestContext::new(
            SessionId::new(1),
            request.route.clone(),
            request.query.clone(),
            registry.clone(),
        );

        let mut state = S::init(&context, shared);
        if !request.route.is_empty() {
            routing::change_route(&mut state, &request.route);
        }
        Self::from_parts(state, registry)
    }

    fn from_parts(state: S, registry: SessionRegistry) -> Self {
        Self {
            processor: Processor::new(SessionId::new(1), state),
            registry,
            frames: Vec::new(),
            follow_ups: VecDeque::new(),
        }
    }

    /// Dispatch `name` with JSON `args`.
    pub fn dispatch(&mut self, name: &str, args: Value) -> DispatchResult {
        self.dispatch_message(&Message::new(name, args))
    }

    /// Dispatch a prepared message.
    pub fn dispatch_message(&mut self, message: &Message) -> DispatchResult {
        let result = self.processor.process(message);
        match &result {
            Ok(actions) => {
                for action in actions {
                    match action {
                        SessionAction::Send(frame) => self.frames.push(frame.clone()),
                        SessionAction::Schedule(follow_up) => {
                            self.follow_ups.push_back(follow_up.clone());
                        },
                    }
                }
            },
            Err(err) => {
                if let Some(frame) = err.error_frame() {
                    self.frames.push(frame);
                }
            },
        }
        result
    }

    /// Dispatch the oldest queued follow-up, ignoring its delay.
    ///
    /// Returns `None` when nothing is queued.
    pub fn run_next_follow_up(&mut self) -> Option<DispatchResult> {
        let follow_up = self.follow_ups.pop_front()?;
        Some(self.dispatch_message(&follow_up.message))
    }

    /// Follow-ups queued and not yet run.
    pub fn pending_follow_ups(&self) -> impl Iterator<Item = &FollowUp> {
        self.follow_ups.iter()
    }

    /// Committed state.
    pub fn state(&self) -> &S {
        self.processor.state()
    }

    /// Render the committed state as text.
    pub fn render_string(&self) -> String {
        self.processor.render().into_text()
    }

    /// Every frame pushed so far, oldest first.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Most recent frame.
    pub fn last_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Registry handed to `init`. Broadcasts from handlers land here; with no
    /// live sessions registered they reach nobody.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Close the session; later dispatches fail with `ConnectionClosed`.
    pub fn close(&mut self) {
        self.processor.close();
        self.follow_ups.clear();
    }
}
