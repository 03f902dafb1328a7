//! Wiring for one hosted game: listener, table, acceptor and coordinator.

use std::time::Duration;

use hanabi_core::cards::new_deck;
use hanabi_core::game_state::{GameState, GameSummary};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::acceptor;
use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::table::Table;

/// How long shutdown waits for sessions to flush their last messages.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("could not listen on {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct GameServer {
    config: Config,
}

impl GameServer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Bind, host a single game to completion, and shut down.
    pub async fn run(self) -> Result<GameSummary, ServerError> {
        let address = self.config.address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })?;
        tracing::info!(address = %listener.local_addr()?, players = self.config.players, "Hanabi server listening");

        self.host(listener).await
    }

    /// Host a game on an already bound listener.
    pub async fn host(&self, listener: TcpListener) -> Result<GameSummary, ServerError> {
        let players = self.config.players;
        let state = GameState::new(players, new_deck(players));
        let table = Table::shared(state);

        let accepting = tokio::spawn(acceptor::run(listener, table.clone()));
        let summary = Coordinator::new(table.clone(), self.config.turn_timeout())
            .run()
            .await;
        accepting.abort();

        let writers = table.lock().await.close_all();
        for writer in writers {
            if tokio::time::timeout(FLUSH_TIMEOUT, writer).await.is_err() {
                tracing::warn!("Session writer did not finish in time");
            }
        }
        Ok(summary)
    }
}
