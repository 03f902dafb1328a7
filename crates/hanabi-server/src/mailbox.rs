//! Single-slot response mailboxes.
//!
//! Each player owns one [`Mailbox`].  The player's session writes every
//! inbound line into it, overwriting anything unread, and the coordinator
//! takes the value out when it needs an answer to the prompt it just sent.
//! Slots live inside the [`Table`](crate::table::Table) and are only touched
//! under the table lock; waiting happens on the mailbox's [`Notify`] after
//! the lock is released.

use std::sync::Arc;
use std::time::Duration;

use hanabi_core::game_state::PlayerId;
use thiserror::Error;
use tokio::sync::Notify;

use crate::table::SharedTable;

/// Reasons a wait for a player's answer ended without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MailboxError {
    #[error("player {0} disconnected")]
    Disconnected(PlayerId),

    #[error("player {0} did not answer in time")]
    TimedOut(PlayerId),

    #[error("player {0} has no mailbox")]
    UnknownPlayer(PlayerId),
}

/// What a waiter finds in a mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Message(String),
    /// The session ended; nothing more will arrive.
    Disconnected,
}

#[derive(Debug, Default)]
pub struct Mailbox {
    slot: Option<String>,
    closed: bool,
    signal: Arc<Notify>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `line`, replacing any unread value, and wake the waiter.
    pub fn put(&mut self, line: String) {
        self.slot = Some(line);
        self.signal.notify_one();
    }

    /// Mark the mailbox closed and wake the waiter.
    pub fn close(&mut self) {
        self.closed = true;
        self.signal.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Take the pending value.  A message still in the slot is handed out
    /// before the disconnect.
    pub fn take(&mut self) -> Option<Delivery> {
        if let Some(line) = self.slot.take() {
            return Some(Delivery::Message(line));
        }
        self.closed.then_some(Delivery::Disconnected)
    }

    /// Drop any unread value.
    pub fn clear(&mut self) {
        self.slot = None;
    }

    fn signal(&self) -> Arc<Notify> {
        Arc::clone(&self.signal)
    }
}

/// Wait for `player`'s next message, optionally bounded by `timeout`.
///
/// The first value present in the slot is the answer; the caller is the only
/// consumer of this mailbox while it waits.
pub async fn await_response(
    table: &SharedTable,
    player: PlayerId,
    timeout: Option<Duration>,
) -> Result<String, MailboxError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, wait(table, player))
            .await
            .map_err(|_| MailboxError::TimedOut(player))?,
        None => wait(table, player).await,
    }
}

async fn wait(table: &SharedTable, player: PlayerId) -> Result<String, MailboxError> {
    loop {
        let signal = {
            let mut table = table.lock().await;
            let mailbox = table
                .mailbox_mut(player)
                .ok_or(MailboxError::UnknownPlayer(player))?;
            match mailbox.take() {
                Some(Delivery::Message(line)) => return Ok(line),
                Some(Delivery::Disconnected) => return Err(MailboxError::Disconnected(player)),
                None => mailbox.signal(),
            }
        };
        // A put between the unlock and this await leaves a permit behind, so
        // the wake-up is not lost.  Stale permits just cause another check.
        signal.notified().await;
    }
}
