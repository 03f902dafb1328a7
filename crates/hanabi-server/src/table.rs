//! The single shared table.
//!
//! One [`Table`] holds everything the workers share: the [`GameState`], the
//! session registry (per-player outbound senders), the response mailboxes, and
//! the start barrier.  It sits behind one [`Mutex`]; callers hold the lock for
//! a single read-modify-write step and never across a wait.

use std::collections::BTreeMap;
use std::sync::Arc;

use hanabi_core::game_state::{GameState, PlayerId};
use hanabi_core::protocol;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;

use crate::mailbox::Mailbox;

/// Handle to a per-player outbound channel.
///
/// The session's write task drains the receiver and writes each message to
/// the connection.
pub type PlayerTx = mpsc::UnboundedSender<String>;
pub type PlayerRx = mpsc::UnboundedReceiver<String>;

pub type SharedTable = Arc<Mutex<Table>>;

pub struct Table {
    pub state: GameState,
    /// Connected players, keyed by their admission id.
    senders: BTreeMap<PlayerId, PlayerTx>,
    mailboxes: BTreeMap<PlayerId, Mailbox>,
    /// Session write tasks, joined at shutdown so final messages go out.
    writers: Vec<JoinHandle<()>>,
    next_player_id: PlayerId,
    /// Number of admitted players; the coordinator waits for it to reach the
    /// seat count.
    admitted_tx: watch::Sender<usize>,
    waiting_on: Option<PlayerId>,
}

impl Table {
    pub fn new(state: GameState) -> Self {
        let (admitted_tx, _) = watch::channel(0);
        Self {
            state,
            senders: BTreeMap::new(),
            mailboxes: BTreeMap::new(),
            writers: Vec::new(),
            next_player_id: 1,
            admitted_tx,
            waiting_on: None,
        }
    }

    pub fn shared(state: GameState) -> SharedTable {
        Arc::new(Mutex::new(Self::new(state)))
    }

    /// Seats in this game.
    pub fn seats(&self) -> usize {
        usize::from(self.state.player_count())
    }

    pub fn admitted(&self) -> usize {
        *self.admitted_tx.borrow()
    }

    pub fn is_full(&self) -> bool {
        self.admitted() >= self.seats()
    }

    /// Register a new connection under the next player id.
    ///
    /// Returns `None` once every seat is taken.  Ids are handed out once and
    /// never reused, even if the player later disconnects.
    pub fn admit(&mut self) -> Option<(PlayerId, PlayerRx)> {
        if self.is_full() {
            return None;
        }
        let player_id = self.next_player_id;
        self.next_player_id += 1;

        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(player_id, tx);
        self.mailboxes.insert(player_id, Mailbox::new());
        self.admitted_tx.send_modify(|n| *n += 1);
        Some((player_id, rx))
    }

    /// Watch the admitted-player count (the start barrier).
    pub fn subscribe_admissions(&self) -> watch::Receiver<usize> {
        self.admitted_tx.subscribe()
    }

    pub fn attach_writer(&mut self, handle: JoinHandle<()>) {
        self.writers.push(handle);
    }

    pub fn is_connected(&self, player: PlayerId) -> bool {
        self.senders.contains_key(&player)
    }

    pub fn connected_players(&self) -> Vec<PlayerId> {
        self.senders.keys().copied().collect()
    }

    pub fn mailbox_mut(&mut self, player: PlayerId) -> Option<&mut Mailbox> {
        self.mailboxes.get_mut(&player)
    }

    /// Hand an inbound line to `player`'s mailbox.
    ///
    /// A player typing while someone else holds the turn is told who the
    /// game is waiting on; the line is still stored.
    pub fn deliver(&mut self, player: PlayerId, line: String) {
        if let Some(mailbox) = self.mailboxes.get_mut(&player)
            && !mailbox.is_closed()
        {
            mailbox.put(line);
        }
        if let Some(acting) = self.waiting_on
            && acting != player
        {
            self.send_to_player(player, &protocol::waiting_on(acting));
        }
    }

    /// Drop `player` from the registry and close their mailbox.
    ///
    /// Returns `true` if the player was still registered.
    pub fn disconnect(&mut self, player: PlayerId) -> bool {
        if let Some(mailbox) = self.mailboxes.get_mut(&player) {
            mailbox.close();
        }
        self.senders.remove(&player).is_some()
    }

    pub fn set_waiting_on(&mut self, player: Option<PlayerId>) {
        self.waiting_on = player;
    }

    /// Send a message to a specific player.
    pub fn send_to_player(&mut self, player: PlayerId, text: &str) {
        let failed = self
            .senders
            .get(&player)
            .is_some_and(|tx| tx.send(text.to_string()).is_err());
        if failed {
            tracing::warn!(player, "Send failed, dropping player from the table");
            self.disconnect(player);
        }
    }

    /// Broadcast a message to **all** connected players.
    ///
    /// A recipient whose connection is gone is removed; the rest still get
    /// the message.
    pub fn broadcast(&mut self, text: &str) {
        self.broadcast_filtered(text, |_| true);
    }

    /// Broadcast a message to all connected players **except** `exclude`.
    pub fn broadcast_except(&mut self, text: &str, exclude: PlayerId) {
        self.broadcast_filtered(text, |pid| pid != exclude);
    }

    fn broadcast_filtered(&mut self, text: &str, include: impl Fn(PlayerId) -> bool) {
        let failed: Vec<PlayerId> = self
            .senders
            .iter()
            .filter(|&(&pid, _)| include(pid))
            .filter(|(_, tx)| tx.send(text.to_string()).is_err())
            .map(|(&pid, _)| pid)
            .collect();
        for player in failed {
            tracing::warn!(player, "Broadcast failed, dropping player from the table");
            self.disconnect(player);
        }
    }

    /// Close every outbound channel and hand back the write tasks.
    ///
    /// Write tasks finish once they have flushed what was already queued.
    pub fn close_all(&mut self) -> Vec<JoinHandle<()>> {
        let players: Vec<PlayerId> = self.senders.keys().copied().collect();
        for player in players {
            self.disconnect(player);
        }
        std::mem::take(&mut self.writers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(players: u8) -> Table {
        Table::new(GameState::new(players, Vec::new()))
    }

    #[test]
    fn admits_sequential_ids_until_full() {
        let mut table = table(2);
        let (first, _rx1) = table.admit().unwrap();
        let (second, _rx2) = table.admit().unwrap();
        assert_eq!((first, second), (1, 2));
        assert!(table.is_full());
        assert!(table.admit().is_none());
        assert_eq!(table.admitted(), 2);
    }

    #[test]
    fn ids_are_not_reused_after_disconnect() {
        let mut table = table(3);
        let (first, _rx1) = table.admit().unwrap();
        assert!(table.disconnect(first));
        assert!(!table.disconnect(first));
        let (second, _rx2) = table.admit().unwrap();
        assert_eq!(second, 2);
        assert!(!table.is_connected(first));
        assert!(table.mailbox_mut(first).unwrap().is_closed());
    }

    #[test]
    fn broadcast_reaches_everyone_and_drops_dead_recipients() {
        let mut table = table(3);
        let (p1, mut rx1) = table.admit().unwrap();
        let (p2, rx2) = table.admit().unwrap();
        let (p3, mut rx3) = table.admit().unwrap();
        drop(rx2);

        table.broadcast("Round 1");
        assert_eq!(rx1.try_recv().unwrap(), "Round 1");
        assert_eq!(rx3.try_recv().unwrap(), "Round 1");
        assert_eq!(table.connected_players(), vec![p1, p3]);
        assert!(table.mailbox_mut(p2).unwrap().is_closed());
    }

    #[test]
    fn broadcast_except_skips_one_player() {
        let mut table = table(2);
        let (p1, mut rx1) = table.admit().unwrap();
        let (_p2, mut rx2) = table.admit().unwrap();

        table.broadcast_except("It is player 1's turn.", p1);
        assert!(rx1.try_recv().is_err());
        assert_eq!(rx2.try_recv().unwrap(), "It is player 1's turn.");
    }

    #[test]
    fn out_of_turn_input_gets_waiting_notice() {
        let mut table = table(2);
        let (p1, _rx1) = table.admit().unwrap();
        let (p2, mut rx2) = table.admit().unwrap();
        table.set_waiting_on(Some(p1));

        table.deliver(p2, "1".to_string());
        assert_eq!(rx2.try_recv().unwrap(), "Waiting on player 1...");
        assert!(table.mailbox_mut(p2).unwrap().take().is_some());
    }

    #[tokio::test]
    async fn admission_count_releases_watchers() {
        let table = Table::shared(GameState::new(2, Vec::new()));
        let mut rx = table.lock().await.subscribe_admissions();
        let _a = table.lock().await.admit();
        assert_eq!(*rx.borrow_and_update(), 1);
        let _b = table.lock().await.admit();
        let released = rx.wait_for(|&n| n >= 2).await.map(|n| *n);
        assert_eq!(released.unwrap(), 2);
    }
}
