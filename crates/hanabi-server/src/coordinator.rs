//! Turn coordinator: the game's single thread of control.
//!
//! The coordinator waits on the start barrier until every seat is filled,
//! then runs rounds.  In each round every connected player takes one turn in
//! seat order.  A turn is a short dialogue: the coordinator sends a prompt,
//! waits on that player's mailbox for the answer, and repeats until it has a
//! complete, valid action, which it applies through [`rules`] in one locked
//! step.  Because only the coordinator mutates the game state and it handles
//! one mailbox at a time, actions are strictly ordered no matter how client
//! messages interleave on the wire.
//!
//! End conditions are checked after every turn, so a win or loss stops the
//! game mid-round.

use std::time::Duration;

use hanabi_core::game_state::{GameSummary, Phase, PlayerId};
use hanabi_core::protocol::{self, Action};
use hanabi_core::rules::{self, Hint, RuleError};

use crate::mailbox::{MailboxError, await_response};
use crate::table::SharedTable;

pub struct Coordinator {
    table: SharedTable,
    /// Time a player has for a whole turn, re-prompts included.  `None`
    /// waits indefinitely.
    turn_timeout: Option<Duration>,
}

impl Coordinator {
    pub fn new(table: SharedTable, turn_timeout: Option<Duration>) -> Self {
        Self {
            table,
            turn_timeout,
        }
    }

    /// Run the whole game and return its summary.
    pub async fn run(&self) -> GameSummary {
        self.wait_for_roster().await;

        {
            let mut table = self.table.lock().await;
            table.state.phase = Phase::InProgress;
            table.broadcast("All players are here. The game begins!");
        }
        tracing::info!("Game started");

        let phase = self.play_rounds().await;

        let mut table = self.table.lock().await;
        table.state.phase = phase;
        table.state.current_player = None;
        table.set_waiting_on(None);
        let summary = table.state.summary();
        table.broadcast(&protocol::conclusion(&summary));
        tracing::info!(
            phase = ?summary.phase,
            score = summary.score,
            rounds = summary.rounds,
            "Game over"
        );
        summary
    }

    /// Block until every seat has been admitted.
    async fn wait_for_roster(&self) {
        let (mut admissions, seats) = {
            let table = self.table.lock().await;
            (table.subscribe_admissions(), table.seats())
        };
        tracing::info!(seats, "Waiting for players");
        // The sender lives in the table, which we keep alive, so this only
        // returns once the count is reached.
        let _ = admissions.wait_for(|&admitted| admitted >= seats).await;
    }

    async fn play_rounds(&self) -> Phase {
        let roster: Vec<PlayerId> = self.table.lock().await.state.roster().collect();
        let mut round = 0;
        loop {
            round += 1;
            let mut anyone_connected = false;
            let mut anyone_could_act = false;

            for &player in &roster {
                let connected = self.table.lock().await.is_connected(player);
                if !connected {
                    continue;
                }
                anyone_connected = true;

                self.begin_turn(round, player).await;
                let outcome = match self.turn_timeout {
                    Some(limit) => tokio::time::timeout(limit, self.play_turn(player))
                        .await
                        .unwrap_or(Err(MailboxError::TimedOut(player))),
                    None => self.play_turn(player).await,
                };
                match outcome {
                    Ok(could_act) => anyone_could_act |= could_act,
                    Err(e) => {
                        anyone_could_act = true;
                        let reason = match e {
                            MailboxError::TimedOut(_) => "out of time",
                            MailboxError::Disconnected(_) | MailboxError::UnknownPlayer(_) => {
                                "disconnected"
                            }
                        };
                        tracing::info!(player, round, reason, "Turn passed");
                        let mut table = self.table.lock().await;
                        table.set_waiting_on(None);
                        table.broadcast(&protocol::passed(player, reason));
                    }
                }

                let phase = rules::check_terminal(&self.table.lock().await.state);
                if phase.is_terminal() {
                    return phase;
                }
            }

            if !anyone_connected {
                tracing::warn!(round, "Every player has disconnected");
                return Phase::Abandoned;
            }
            // Nobody still at the table can play or inform, and only their
            // own actions could change that.
            if !anyone_could_act {
                tracing::info!(round, "No connected player can act");
                return Phase::Lost;
            }
        }
    }

    /// Announce the turn: status to everyone, each player's view of the
    /// other hands, and whose turn it is.
    async fn begin_turn(&self, round: u32, player: PlayerId) {
        let mut table = self.table.lock().await;
        table.state.round = round;
        table.state.current_player = Some(player);

        let status = protocol::status_line(&table.state);
        table.broadcast(&status);
        for viewer in table.connected_players() {
            let view = protocol::hand_view(&table.state, viewer);
            table.send_to_player(viewer, &view);
        }
        table.broadcast_except(&protocol::turn_notice(player), player);

        // Anything typed before the turn started is not an answer.
        if let Some(mailbox) = table.mailbox_mut(player) {
            mailbox.clear();
        }
        tracing::debug!(round, player, "Turn started");
    }

    /// Drive one player's turn to a completed action.
    ///
    /// Returns `Ok(false)` if the player had no legal action and passed.
    /// Cancelling this future between prompts leaves the state untouched:
    /// every mutation happens inside a single lock with no await.
    async fn play_turn(&self, player: PlayerId) -> Result<bool, MailboxError> {
        {
            let mut table = self.table.lock().await;
            if !table.state.has_legal_action(player) {
                table.broadcast(&protocol::passed(
                    player,
                    "no cards to play and no information tokens",
                ));
                return Ok(false);
            }
        }

        loop {
            let answer = self.ask(player, protocol::ACTION_PROMPT).await?;
            let done = match Action::parse(&answer) {
                Ok(Action::PlayCard) => self.play_card(player).await?,
                Ok(Action::GiveInfo) => self.give_info(player).await?,
                Err(e) => {
                    self.tell(player, &e.to_string()).await;
                    false
                }
            };
            if done {
                return Ok(true);
            }
        }
    }

    /// Returns `Ok(false)` if the player has nothing to play and must choose
    /// another action.
    async fn play_card(&self, player: PlayerId) -> Result<bool, MailboxError> {
        loop {
            let prompt = {
                let table = self.table.lock().await;
                table
                    .state
                    .hand(player)
                    .filter(|hand| !hand.is_empty())
                    .map(protocol::slot_prompt)
            };
            let Some(prompt) = prompt else {
                self.tell(player, "You have no cards left to play.").await;
                return Ok(false);
            };

            let answer = self.ask(player, &prompt).await?;
            let slot = match protocol::parse_slot(&answer) {
                Ok(slot) => slot,
                Err(e) => {
                    self.tell(player, &e.to_string()).await;
                    continue;
                }
            };

            let mut table = self.table.lock().await;
            match rules::apply_play(&mut table.state, player, slot) {
                Ok(result) => {
                    tracing::info!(
                        player,
                        card = %result.card,
                        success = result.success,
                        fuse = result.tokens.fuse,
                        info = result.tokens.info,
                        "Card played"
                    );
                    table.broadcast(&protocol::play_outcome(player, &result));
                    return Ok(true);
                }
                Err(e) => table.send_to_player(player, &e.to_string()),
            }
        }
    }

    /// Returns `Ok(false)` if no information token is available.
    async fn give_info(&self, player: PlayerId) -> Result<bool, MailboxError> {
        let players = {
            let mut table = self.table.lock().await;
            if table.state.tokens.info == 0 {
                table.send_to_player(player, &RuleError::NoTokens.to_string());
                return Ok(false);
            }
            table.state.player_count()
        };

        loop {
            let target = self.ask_target(player, players).await?;
            let hint = self.ask_hint(player, players).await?;

            let mut table = self.table.lock().await;
            match rules::apply_information(&mut table.state, player, target, hint) {
                Ok(result) => {
                    tracing::info!(
                        player,
                        target,
                        hint = %hint,
                        slots = ?result.slots,
                        info = result.tokens.info,
                        "Information given"
                    );
                    table.send_to_player(target, &protocol::info_reveal(&result));
                    table.broadcast(&protocol::info_given(&result));
                    return Ok(true);
                }
                Err(RuleError::NoMatch) => {
                    table.send_to_player(player, &protocol::no_match(target, hint));
                }
                Err(RuleError::NoTokens) => {
                    table.send_to_player(player, &RuleError::NoTokens.to_string());
                    return Ok(false);
                }
                Err(e) => table.send_to_player(player, &e.to_string()),
            }
        }
    }

    async fn ask_target(&self, player: PlayerId, players: u8) -> Result<PlayerId, MailboxError> {
        let prompt = protocol::target_prompt(players, player);
        loop {
            let answer = self.ask(player, &prompt).await?;
            match protocol::parse_target(&answer) {
                Ok(target) if target != player && target <= PlayerId::from(players) && target > 0 => {
                    return Ok(target);
                }
                Ok(_) => self.tell(player, &RuleError::InvalidTarget.to_string()).await,
                Err(e) => self.tell(player, &e.to_string()).await,
            }
        }
    }

    async fn ask_hint(&self, player: PlayerId, players: u8) -> Result<Hint, MailboxError> {
        let prompt = protocol::hint_prompt(players);
        loop {
            let answer = self.ask(player, &prompt).await?;
            match Hint::parse(&answer, players) {
                Ok(hint) => return Ok(hint),
                Err(e) => self.tell(player, &e.to_string()).await,
            }
        }
    }

    /// Prompt `player` and wait for the next line they send.
    async fn ask(&self, player: PlayerId, prompt: &str) -> Result<String, MailboxError> {
        {
            let mut table = self.table.lock().await;
            table.send_to_player(player, prompt);
            table.set_waiting_on(Some(player));
        }
        tracing::debug!(player, "Waiting on player");

        let answer = await_response(&self.table, player, None).await;
        self.table.lock().await.set_waiting_on(None);
        answer
    }

    async fn tell(&self, player: PlayerId, text: &str) {
        self.table.lock().await.send_to_player(player, text);
    }
}
