//! liveframe core runtime
//!
//! Application state lives entirely on the server. Every browser tab is a
//! session holding one [`State`] value; each inbound message runs one handler
//! against it, commits the result and pushes a fresh render down the session's
//! connection.
//!
//! # Architecture
//!
//! ```text
//!            inbound frames           follow-up timers      broadcast
//!                  │                        │                   │
//!                  ▼                        ▼                   ▼
//!          ┌──────────────────────────────────────────────────────────┐
//!          │           per-session command queue (single consumer)    │
//!          └──────────────────────────────────────────────────────────┘
//!                                   │
//!                                   ▼
//!          ┌──────────────┐   SessionAction   ┌──────────────────────┐
//!          │  Processor   │──────────────────>│  session task        │
//!          │ (pure logic) │                   │  sends frames,       │
//!          └──────────────┘                   │  arms timers         │
//!                                             └──────────────────────┘
//! ```
//!
//! The [`processor`] is a deterministic state machine: resolve a handler,
//! run it against a working copy of the state, commit, render, and describe
//! any follow-up as an action. The [`session`] task owns the processor and is
//! the only writer of its state, so handler invocations for one session never
//! overlap. Sessions are independent tokio tasks and run in parallel.
//!
//! # Components
//!
//! - [`state`]: State contract and the request context handed to `init`
//! - [`response`]: Handler outcome (done, follow-up, error)
//! - [`handler`]: Message handler registry
//! - [`namespace`]: Component message namespacing
//! - [`routing`]: Built-in route-change message
//! - [`processor`]: Dispatch state machine
//! - [`session`]: Session task and handle
//! - [`registry`]: Live session table and broadcast
//! - [`runtime`]: Runtime context owning config, environment and registry
//! - [`connection`]: Outbound frame channel for one session
//! - [`mod@env`]: Environment abstraction (time, RNG)
//! - [`view`]: Fallback error view
//! - [`error`]: Error types

pub mod config;
pub mod connection;
pub mod env;
pub mod error;
pub mod handler;
pub mod namespace;
pub mod processor;
pub mod registry;
pub mod response;
pub mod routing;
pub mod runtime;
pub mod session;
pub mod state;
pub mod view;

pub use config::RuntimeConfig;
pub use connection::Connection;
pub use env::{Environment, SystemEnv};
pub use error::{
    ConnectionClosed, DispatchError, HandlerError, RegistryError, RenderError, RuntimeError,
    SessionError,
};
pub use handler::{Handler, MessageMap};
pub use liveframe_proto::{Args, DecodeError, Frame, FrameKind, Message};
pub use namespace::Namespace;
pub use processor::{DispatchPhase, Processor, SessionAction};
pub use registry::SessionRegistry;
pub use response::{FollowUp, Response};
pub use runtime::{ConnectRequest, Runtime};
pub use session::{SessionHandle, SessionId};
pub use state::{RequestContext, State};
