//! Test harness for liveframe applications.
//!
//! Two levels of testing:
//!
//! - [`TestSession`] drives a state through the dispatch processor
//!   synchronously. No runtime, no timers: follow-ups are queued and run on
//!   demand, so handler logic can be tested step by step.
//! - [`LiveClient`] opens a real session on a [`Runtime`](liveframe_core::Runtime)
//!   and reads the frames it pushes. Combined with tokio's paused clock this
//!   tests timers, broadcast and teardown end to end without a socket.
//!
//! [`SimEnv`] gives the runtime seeded randomness and tokio-driven time, and
//! [`fixtures`] provides a model exercising every runtime feature.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod live;
pub mod sim_env;
pub mod test_session;

pub use live::LiveClient;
pub use sim_env::SimEnv;
pub use test_session::TestSession;
