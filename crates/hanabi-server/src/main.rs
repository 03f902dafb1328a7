//! Hanabi game server.
//!
//! Hosts a single cooperative game over plain TCP.  Clients connect with any
//! line-oriented tool (or the `hanabi` client), are seated in arrival order,
//! and answer the prompts sent to them on their turn.
//!
//! Configuration comes from the command line or `HANABI_*` environment
//! variables; see `--help`.

mod acceptor;
mod config;
mod coordinator;
mod mailbox;
mod server;
mod session;
mod table;
#[cfg(test)]
mod test_support;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use config::Config;
use server::GameServer;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialise tracing (respects RUST_LOG env var).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    match GameServer::new(config).run().await {
        Ok(summary) => {
            match serde_json::to_string(&summary) {
                Ok(json) => tracing::info!(summary = %json, "Server finished"),
                Err(e) => tracing::warn!(error = %e, "Could not encode game summary"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}
