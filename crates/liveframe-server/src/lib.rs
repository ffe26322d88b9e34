//! liveframe server
//!
//! Serves a liveframe application over HTTP and websockets:
//!
//! ```text
//!   browser ── GET /anything ──────────> document (init + render, no session)
//!   browser ── GET /liveframe.js ──────> client script
//!   browser ══ WS  /server?whence=/r ══> session (frames out, messages in)
//! ```
//!
//! The library half builds the router and runs it; the binary wires it to the
//! command line and the demo application.

pub mod adapter;
pub mod config;
pub mod demo;
pub mod document;
pub mod error;
pub mod html;

use std::future::Future;

use liveframe_core::{Environment, Runtime, State};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

pub use adapter::router;
pub use config::ServerConfig;
pub use demo::{DemoModel, DemoShared};
pub use document::DocumentShell;
pub use error::ServerError;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over `default_filter` when set.
///
/// # Errors
///
/// - `LogFilter` if `default_filter` is not a valid directive
pub fn init_tracing(default_filter: &str) -> Result<(), ServerError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter).map_err(|err| ServerError::LogFilter {
            filter: default_filter.to_string(),
            reason: err.to_string(),
        })?,
    };

    // A subscriber already installed (tests, embedding) is not an error.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
    Ok(())
}

/// Serve `runtime` on `listener` until `shutdown` resolves, then close every
/// session.
///
/// # Errors
///
/// - `Serve` if the accept loop fails
pub async fn serve<S, E>(
    listener: TcpListener,
    runtime: Runtime<S, E>,
    shell: DocumentShell,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError>
where
    S: State,
    E: Environment,
{
    let app = router(runtime.clone(), shell);

    // Sessions are closed before axum waits on in-flight connections, so open
    // sockets see their session end instead of holding shutdown open.
    let sessions = runtime.clone();
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            sessions.shutdown().await;
        })
        .await;

    runtime.shutdown().await;
    result.map_err(ServerError::from)
}

/// Run the demo application with `config` until ctrl-c.
///
/// # Errors
///
/// - `Bind` if the listen address is unavailable
/// - `Serve` if the accept loop fails
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|source| ServerError::Bind { addr: config.bind, source })?;
    let addr = listener.local_addr()?;

    let runtime: Runtime<DemoModel> = Runtime::new(config.runtime_config(), DemoShared::default());
    tracing::info!(%addr, max_sessions = config.max_sessions, "liveframe listening");

    serve(listener, runtime, config.document_shell(), async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "ctrl-c handler failed");
        }
    })
    .await
}
