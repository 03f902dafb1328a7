//! Connection admission.
//!
//! Accepts connections until every seat is taken, giving each one the next
//! player id, a mailbox, and a session.  Each admission bumps the table's
//! admitted count, which is what the coordinator's start barrier watches.
//! Later connections are told the game is full and closed.

use std::time::Duration;

use hanabi_core::game_state::PlayerId;
use hanabi_core::line_transport::TcpTransport;
use hanabi_core::protocol;
use hanabi_core::transport::{Transport, TransportWriter};
use tokio::net::TcpListener;

use crate::session::spawn_session;
use crate::table::SharedTable;

/// Admit one connection to the table.
///
/// Returns the new player's id, or `None` if the roster was already full (in
/// which case the connection has been closed).
pub async fn admit<T: Transport>(table: &SharedTable, transport: T) -> Option<PlayerId> {
    let mut guard = table.lock().await;
    let Some((player, outbound)) = guard.admit() else {
        drop(guard);
        reject(transport).await;
        return None;
    };

    let welcome = protocol::welcome(player, guard.state.player_count());
    guard.send_to_player(player, &welcome);
    let missing = guard.seats() - guard.admitted();
    if missing > 0 {
        guard.broadcast(&protocol::waiting_for_players(missing));
    }

    let writer = spawn_session(table.clone(), player, transport, outbound);
    guard.attach_writer(writer);
    Some(player)
}

async fn reject<T: Transport>(transport: T) {
    let (_reader, mut writer) = transport.split();
    if let Err(e) = writer.send(protocol::GAME_FULL).await {
        tracing::debug!(error = %e, "Could not notify rejected connection");
    }
}

const ACCEPT_BACKOFF_START: Duration = Duration::from_millis(50);
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Pause after `failures` consecutive accept errors: doubles from 50ms up to
/// one second.
fn accept_backoff(failures: u32) -> Duration {
    let shift = failures.saturating_sub(1).min(5);
    (ACCEPT_BACKOFF_START * (1 << shift)).min(ACCEPT_BACKOFF_MAX)
}

/// Accept TCP connections for the lifetime of the game.
pub async fn run(listener: TcpListener, table: SharedTable) {
    let mut failures: u32 = 0;
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => {
                failures = 0;
                accepted
            }
            Err(e) => {
                // Errors like EMFILE persist until something is released.
                failures = failures.saturating_add(1);
                let pause = accept_backoff(failures);
                tracing::warn!(error = %e, failures, ?pause, "Accept failed");
                tokio::time::sleep(pause).await;
                continue;
            }
        };

        match admit(&table, TcpTransport::from_stream(stream)).await {
            Some(player) => tracing::info!(player, %addr, "Player admitted"),
            None => tracing::info!(%addr, "Roster full, connection refused"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;
    use crate::test_support::pipe;
    use hanabi_core::game_state::GameState;
    use hanabi_core::transport::TransportReader;

    #[tokio::test]
    async fn admits_in_order_and_reports_progress() {
        let table = Table::shared(GameState::new(3, Vec::new()));
        let (side1, mut client1) = pipe();
        let (side2, mut client2) = pipe();

        assert_eq!(admit(&table, side1).await, Some(1));
        client1.expect("you are player 1 of 3").await;
        client1.expect("Waiting for 2 more").await;

        assert_eq!(admit(&table, side2).await, Some(2));
        client2.expect("you are player 2 of 3").await;
        client1.expect("Waiting for 1 more").await;
        client2.expect("Waiting for 1 more").await;
    }

    #[tokio::test]
    async fn rejects_connections_beyond_the_roster() {
        let table = Table::shared(GameState::new(2, Vec::new()));
        let mut clients = Vec::new();
        for _ in 0..2 {
            let (side, client) = pipe();
            assert!(admit(&table, side).await.is_some());
            clients.push(client);
        }

        let (extra, mut late) = pipe();
        assert_eq!(admit(&table, extra).await, None);
        late.expect("The game is full.").await;
        late.expect_closed().await;
        assert_eq!(table.lock().await.admitted(), 2);
    }

    #[test]
    fn accept_failures_back_off() {
        assert_eq!(accept_backoff(1), Duration::from_millis(50));
        assert_eq!(accept_backoff(2), Duration::from_millis(100));
        assert_eq!(accept_backoff(4), Duration::from_millis(400));
        assert_eq!(accept_backoff(6), Duration::from_secs(1));
        assert_eq!(accept_backoff(u32::MAX), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn accepts_tcp_connections() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let table = Table::shared(GameState::new(2, Vec::new()));
        let acceptor = tokio::spawn(run(listener, table.clone()));

        let transport = TcpTransport::connect(&address).await.unwrap();
        let (mut rx, _tx) = transport.split();
        let line = rx.recv().await.unwrap().unwrap();
        assert_eq!(line, "Welcome, you are player 1 of 2.");
        assert_eq!(table.lock().await.admitted(), 1);

        acceptor.abort();
    }
}
