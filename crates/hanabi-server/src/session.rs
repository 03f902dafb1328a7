//! Per-connection session workers.
//!
//! Each admitted connection gets two tasks:
//!
//! 1. A write task that drains the player's outbound channel onto the
//!    connection.
//! 2. A read task that forwards every inbound line into the player's mailbox
//!    and, when the stream ends or fails, drops the player from the table so
//!    that any wait on their mailbox ends with a disconnect.

use hanabi_core::game_state::PlayerId;
use hanabi_core::protocol;
use hanabi_core::transport::{Transport, TransportReader, TransportWriter};
use tokio::task::JoinHandle;

use crate::table::{PlayerRx, SharedTable};

/// Spawn the read and write tasks for `player`.
///
/// Returns the write task's handle so shutdown can wait for queued messages
/// to go out.
pub fn spawn_session<T: Transport>(
    table: SharedTable,
    player: PlayerId,
    transport: T,
    mut outbound: PlayerRx,
) -> JoinHandle<()> {
    let (mut reader, mut writer) = transport.split();

    let write_handle = tokio::spawn(async move {
        while let Some(text) = outbound.recv().await {
            if let Err(e) = writer.send(&text).await {
                tracing::debug!(player, error = %e, "Write failed, closing session writer");
                break;
            }
        }
    });

    tokio::spawn(async move {
        loop {
            match reader.recv().await {
                Ok(Some(line)) => {
                    tracing::debug!(player, %line, "Received");
                    table.lock().await.deliver(player, line);
                }
                Ok(None) => {
                    tracing::info!(player, "Connection closed");
                    break;
                }
                Err(e) => {
                    tracing::warn!(player, error = %e, "Read failed");
                    break;
                }
            }
        }

        let mut table = table.lock().await;
        if table.disconnect(player) {
            table.broadcast(&protocol::disconnected(player));
        }
    });

    write_handle
}
