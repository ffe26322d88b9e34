//! Runtime context.
//!
//! A [`Runtime`] is constructed once per application and passed to whatever
//! accepts connections. It owns the configuration, the environment, the live
//! session table and the application's shared data. Nothing in the crate is
//! process-global; two runtimes in one process are fully independent.

use std::{
    collections::HashMap,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use tracing::Instrument;

use crate::{
    config::RuntimeConfig,
    connection::Connection,
    env::{Environment, SystemEnv},
    error::RuntimeError,
    processor::{self, Processor},
    registry::SessionRegistry,
    routing,
    session::{SessionHandle, SessionId, SessionRunner},
    state::{RequestContext, State},
};

/// What a client sent when it connected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectRequest {
    /// Route the client is displaying. Empty keeps the state's own route.
    pub route: String,
    /// Remaining query parameters
    pub query: HashMap<String, String>,
}

impl ConnectRequest {
    /// Request for `route` with no query parameters.
    pub fn new(route: impl Into<String>) -> Self {
        Self { route: route.into(), query: HashMap::new() }
    }

    /// Add a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }
}

struct Inner<S: State, E> {
    config: RuntimeConfig,
    env: E,
    registry: SessionRegistry,
    shared: S::Shared,
}

/// Application runtime.
///
/// Cheap to clone; clones share sessions and configuration.
pub struct Runtime<S: State, E: Environment = SystemEnv> {
    inner: Arc<Inner<S, E>>,
}

impl<S: State, E: Environment> Clone for Runtime<S, E> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<S: State> Runtime<S> {
    /// Runtime on the system clock.
    pub fn new(config: RuntimeConfig, shared: S::Shared) -> Self {
        Self::with_env(config, SystemEnv, shared)
    }
}

impl<S: State, E: Environment> Runtime<S, E> {
    /// Runtime on a caller-supplied environment.
    pub fn with_env(config: RuntimeConfig, env: E, shared: S::Shared) -> Self {
        let inner = Inner { config, env, registry: SessionRegistry::new(), shared };
        Self { inner: Arc::new(inner) }
    }

    /// Accept a connection.
    ///
    /// Initialises the state, applies the connect route, registers the
    /// session and spawns its task. The first render is pushed to
    /// `connection` by the task. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - `SessionLimitReached` if `max_sessions` sessions are live
    /// - `InitFailed` if the application's `init` or route hook panicked
    pub fn open_session(
        &self,
        request: &ConnectRequest,
        connection: Connection,
    ) -> Result<SessionHandle, RuntimeError> {
        let limit = self.inner.config.max_sessions;
        if self.inner.registry.len() >= limit {
            tracing::warn!(limit, "session refused: limit reached");
            return Err(RuntimeError::SessionLimitReached { limit });
        }

        let id = self.fresh_id();
        let state = self.initial_state(id, request)?;

        let (handle, commands) = SessionHandle::channel(id);
        self.inner.registry.try_insert(handle.clone(), limit)?;

        let runner = SessionRunner::new(
            Processor::new(id, state),
            connection,
            &handle,
            commands,
            self.inner.env.clone(),
            self.inner.registry.clone(),
            self.inner.config.max_pending_follow_ups,
        );
        let span = tracing::info_span!("session", session = %id, route = %request.route);
        tokio::spawn(runner.run().instrument(span));

        Ok(handle)
    }

    /// Render the document for a plain page load.
    ///
    /// Runs `init` and the route change, renders once, and discards the
    /// state. No session is registered.
    ///
    /// # Errors
    ///
    /// - `InitFailed` if `init` or the route hook panicked
    /// - `Render` if the view could not be produced
    pub fn render_document(&self, request: &ConnectRequest) -> Result<Vec<u8>, RuntimeError> {
        let id = self.fresh_id();
        let state = self.initial_state(id, request)?;
        Ok(processor::render_state(&state)?)
    }

    /// Queue a re-render on every live session. Returns how many were reached.
    pub fn broadcast(&self) -> usize {
        self.inner.registry.broadcast()
    }

    /// Close every live session and wait for them to tear down.
    pub async fn shutdown(&self) {
        let handles = self.inner.registry.close_all();
        tracing::info!(sessions = handles.len(), "shutting down");
        for handle in handles {
            handle.closed().await;
        }
    }

    /// Live session table.
    pub fn registry(&self) -> &SessionRegistry {
        &self.inner.registry
    }

    /// Application shared data.
    pub fn shared(&self) -> &S::Shared {
        &self.inner.shared
    }

    /// Active configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    /// Environment sessions run on.
    pub fn env(&self) -> &E {
        &self.inner.env
    }

    fn fresh_id(&self) -> SessionId {
        loop {
            let id = SessionId::new(self.inner.env.random_u64());
            if !self.inner.registry.contains(id) {
                return id;
            }
        }
    }

    fn initial_state(&self, id: SessionId, request: &ConnectRequest) -> Result<S, RuntimeError> {
        let context = RequestContext::new(
            id,
            request.route.clone(),
            request.query.clone(),
            self.inner.registry.clone(),
        );
        let shared = &self.inner.shared;

        panic::catch_unwind(AssertUnwindSafe(|| {
            let mut state = S::init(&context, shared);
            if !request.route.is_empty() {
                routing::change_route(&mut state, &request.route);
            }
            state
        }))
        .map_err(|payload| {
            let reason = processor::panic_message(payload.as_ref());
            tracing::error!(session = %id, error = %reason, "session init panicked");
            RuntimeError::InitFailed(reason)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_request_builder() {
        let request = ConnectRequest::new("/chat").with_query("user", "ada");
        assert_eq!(request.route, "/chat");
        assert_eq!(request.query.get("user").map(String::as_str), Some("ada"));
    }
}
