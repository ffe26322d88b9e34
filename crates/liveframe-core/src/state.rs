//! Application state contract.
//!
//! An application is one type implementing [`State`]. The runtime creates a
//! value per session with [`State::init`], routes every message through the
//! map returned by [`State::update`] and turns the state into bytes with
//! [`State::render`].
//!
//! # Lifecycle
//!
//! ```text
//!   connect ──> init(ctx, shared) ──> set initial route ──> render
//!                                                             │
//!        ┌────────────────────────────────────────────────────┘
//!        ▼
//!   message ──> update()[name](msg, &mut copy) ──> commit ──> render
//! ```
//!
//! `Shared` is application state that outlives sessions and is handed to
//! every `init` call. It is where a chat log or a shared canvas lives.

use std::collections::HashMap;

use crate::{
    error::RenderError, handler::MessageMap, registry::SessionRegistry, session::SessionId,
};

/// Per-session application state.
pub trait State: Clone + Send + 'static {
    /// Cross-session data shared by every session of this application.
    type Shared: Clone + Send + Sync + 'static;

    /// Build the initial state for a new session.
    fn init(request: &RequestContext, shared: &Self::Shared) -> Self;

    /// Handlers this state responds to.
    ///
    /// Called once per dispatch, so the map may depend on the current state
    /// (for example, only the visible page's handlers).
    fn update(&self) -> MessageMap<Self>;

    /// Serialize the current view.
    ///
    /// Must be side-effect free: rendering twice without an intervening
    /// mutation yields identical bytes.
    ///
    /// # Errors
    ///
    /// Returns `RenderError` if the view cannot be produced. The runtime
    /// substitutes an error view.
    fn render(&self) -> Result<Vec<u8>, RenderError>;

    /// Current route.
    fn route(&self) -> &str;

    /// Replace the current route.
    fn set_route(&mut self, route: &str);

    /// Hook run before the route changes.
    ///
    /// `route()` still returns the old route while this runs.
    fn on_route_change(&mut self, _new_route: &str) {}
}

/// Information about the connection that created a session.
#[derive(Debug, Clone)]
pub struct RequestContext {
    session_id: SessionId,
    route: String,
    query: HashMap<String, String>,
    registry: SessionRegistry,
}

impl RequestContext {
    /// Build a request context.
    pub fn new(
        session_id: SessionId,
        route: impl Into<String>,
        query: HashMap<String, String>,
        registry: SessionRegistry,
    ) -> Self {
        Self { session_id, route: route.into(), query, registry }
    }

    /// Session being initialised.
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Route the client connected from.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Query parameter from the connection request.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Live session table. Handlers that change shared data keep a clone to
    /// broadcast afterwards.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }
}
