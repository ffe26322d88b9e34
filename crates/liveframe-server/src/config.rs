//! Command-line configuration.

use std::net::SocketAddr;

use clap::Parser;
use liveframe_core::RuntimeConfig;
use liveframe_proto::MAX_FRAME_SIZE;

use crate::{adapter::CLIENT_SCRIPT_PATH, document::DocumentShell};

/// liveframe demo server
#[derive(Debug, Clone, Parser)]
#[command(name = "liveframe-server", version, about)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub bind: SocketAddr,

    /// Document title
    #[arg(long, default_value = "liveframe")]
    pub title: String,

    /// URL of the client script the document loads
    #[arg(long, default_value = CLIENT_SCRIPT_PATH)]
    pub script_src: String,

    /// Maximum number of live sessions
    #[arg(long, default_value_t = 10_000)]
    pub max_sessions: usize,

    /// Maximum inbound frame size in bytes
    #[arg(long, default_value_t = MAX_FRAME_SIZE)]
    pub max_frame_size: usize,

    /// Maximum follow-ups waiting on a timer per session
    #[arg(long, default_value_t = 64)]
    pub max_pending_follow_ups: usize,

    /// Log filter directive, used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    pub log_filter: String,
}

impl ServerConfig {
    /// Runtime limits from the command line.
    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            max_sessions: self.max_sessions,
            max_frame_size: self.max_frame_size,
            max_pending_follow_ups: self.max_pending_follow_ups,
        }
    }

    /// Document shell from the command line.
    pub fn document_shell(&self) -> DocumentShell {
        DocumentShell::new(self.title.clone(), self.script_src.clone())
    }
}
