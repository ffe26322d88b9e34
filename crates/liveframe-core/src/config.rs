//! Runtime configuration.

use liveframe_proto::MAX_FRAME_SIZE;

/// Limits applied by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Maximum number of concurrently live sessions. Connections beyond this
    /// are refused.
    pub max_sessions: usize,
    /// Maximum size of one inbound frame in bytes
    pub max_frame_size: usize,
    /// Maximum number of follow-up messages waiting on a timer per session.
    /// Follow-ups beyond this are dropped with a warning.
    pub max_pending_follow_ups: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { max_sessions: 10_000, max_frame_size: MAX_FRAME_SIZE, max_pending_follow_ups: 64 }
    }
}
