use std::process::ExitCode;

use clap::Parser;
use liveframe_server::{ServerConfig, init_tracing, run};

#[tokio::main]
async fn main() -> ExitCode {
    let config = ServerConfig::parse();

    if let Err(err) = init_tracing(&config.log_filter) {
        let _ = init_tracing("info");
        tracing::error!(error = %err, "falling back to info logging");
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "server stopped");
            ExitCode::FAILURE
        },
    }
}
