//! Plain-text wire protocol.
//!
//! Clients send one short token per line in answer to the server's prompts;
//! the server sends human-readable text.  Nothing on the wire identifies which
//! prompt a client line answers: the server pairs them by position.

use std::fmt::Write as _;

use thiserror::Error;

use crate::cards::{Color, HAND_SIZE, Hand, MAX_RANK, slot_letter};
use crate::game_state::{GameState, GameSummary, Phase, PlayerId};
use crate::rules::{Hint, InfoResult, PlayResult};

/// Client input that does not parse as the expected token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown action '{0}', answer 1 (play_card) or 2 (give_info)")]
    Action(String),

    #[error("'{0}' is not a card slot, answer a letter a-e")]
    Slot(String),

    #[error("'{0}' is not a player number")]
    Target(String),

    #[error("'{0}' is neither a rank 1-5 nor a colour in play")]
    Hint(String),
}

/// Turn action chosen by the acting player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PlayCard,
    GiveInfo,
}

impl Action {
    /// Accepts the numeric and named aliases, ignoring case.
    pub fn parse(input: &str) -> Result<Action, ParseError> {
        let token = input.trim();
        match token.to_ascii_lowercase().as_str() {
            "1" | "play_card" | "play" => Ok(Action::PlayCard),
            "2" | "give_info" | "info" => Ok(Action::GiveInfo),
            _ => Err(ParseError::Action(token.to_string())),
        }
    }
}

/// Parse a slot letter `a`–`e` into a hand index.
pub fn parse_slot(input: &str) -> Result<usize, ParseError> {
    let token = input.trim();
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) => {
            let slot = (ch.to_ascii_lowercase() as usize).wrapping_sub('a' as usize);
            if slot < HAND_SIZE {
                Ok(slot)
            } else {
                Err(ParseError::Slot(token.to_string()))
            }
        }
        _ => Err(ParseError::Slot(token.to_string())),
    }
}

/// Parse a decimal player id.  Roster membership is checked by the caller.
pub fn parse_target(input: &str) -> Result<PlayerId, ParseError> {
    let token = input.trim();
    token
        .parse::<PlayerId>()
        .map_err(|_| ParseError::Target(token.to_string()))
}

impl Hint {
    /// Parse a rank `1`–`5` or the name of a colour in play for `players`.
    pub fn parse(input: &str, players: u8) -> Result<Hint, ParseError> {
        let token = input.trim();
        if let Ok(rank) = token.parse::<u8>() {
            return if (1..=MAX_RANK).contains(&rank) {
                Ok(Hint::Rank(rank))
            } else {
                Err(ParseError::Hint(token.to_string()))
            };
        }
        Color::from_name(token)
            .filter(|c| Color::in_play(players).contains(c))
            .map(Hint::Color)
            .ok_or_else(|| ParseError::Hint(token.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Outbound text
// ---------------------------------------------------------------------------

pub const ACTION_PROMPT: &str = "Your turn. Choose an action: 1) play_card  2) give_info";

pub fn welcome(player: PlayerId, players: u8) -> String {
    format!("Welcome, you are player {player} of {players}.")
}

pub fn waiting_for_players(missing: usize) -> String {
    format!("Waiting for {missing} more player(s) to connect...")
}

pub const GAME_FULL: &str = "The game is full.";

/// Slot prompt listing only the occupied slots of `hand`.
pub fn slot_prompt(hand: &Hand) -> String {
    let slots: Vec<String> = hand.cards().map(|(s, _)| slot_letter(s).to_string()).collect();
    format!("Which card do you play? ({})", slots.join(", "))
}

pub fn target_prompt(players: u8, acting: PlayerId) -> String {
    let others: Vec<String> = (1..=PlayerId::from(players))
        .filter(|&p| p != acting)
        .map(|p| p.to_string())
        .collect();
    format!("Which player do you inform? ({})", others.join(", "))
}

pub fn hint_prompt(players: u8) -> String {
    let colors: Vec<&str> = Color::in_play(players).iter().map(|c| c.name()).collect();
    format!(
        "What do you tell them? (a rank 1-{MAX_RANK}, or one of {})",
        colors.join(", ")
    )
}

/// Round and token status, sent to everyone before each turn.
pub fn status_line(state: &GameState) -> String {
    let mut line = format!(
        "Round {} | Info tokens: {}/{} | Fuse tokens: {} | Deck: {} | Played:",
        state.round,
        state.tokens.info,
        state.tokens.max_info(),
        state.tokens.fuse,
        state.deck.len(),
    );
    for &color in state.colors() {
        let _ = write!(line, " {color} {}", state.played.top(color));
    }
    line
}

/// Every hand except the viewer's own.
pub fn hand_view(state: &GameState, viewer: PlayerId) -> String {
    state
        .hands
        .iter()
        .filter(|&(&id, _)| id != viewer)
        .map(|(id, hand)| format!("Player {id}: {hand}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn turn_notice(player: PlayerId) -> String {
    format!("It is player {player}'s turn.")
}

pub fn waiting_on(player: PlayerId) -> String {
    format!("Waiting on player {player}...")
}

pub fn play_outcome(player: PlayerId, result: &PlayResult) -> String {
    let mut text = if result.success {
        format!("Player {player} played {} successfully.", result.card)
    } else {
        format!(
            "Player {player} played {}, which does not fit. A fuse burns ({} left).",
            result.card, result.tokens.fuse
        )
    };
    if result.info_restored {
        let _ = write!(
            text,
            " Firework complete, an information token returns ({} now).",
            result.tokens.info
        );
    }
    if !result.drew {
        text.push_str(" The deck is empty, no card drawn.");
    }
    text
}

/// Private reveal sent only to the target.
pub fn info_reveal(result: &InfoResult) -> String {
    let what = match result.hint {
        Hint::Rank(rank) => format!("rank {rank}"),
        Hint::Color(color) => color.to_string(),
    };
    format!(
        "Player {} tells you: your cards {} are {what}.",
        result.giver,
        result.slot_letters()
    )
}

pub fn info_given(result: &InfoResult) -> String {
    format!(
        "Player {} gave information to player {}. Info tokens left: {}.",
        result.giver, result.target, result.tokens.info
    )
}

pub fn no_match(target: PlayerId, hint: Hint) -> String {
    format!("Player {target} holds no card matching {hint}. No token spent, try again.")
}

pub fn passed(player: PlayerId, reason: &str) -> String {
    format!("Player {player} passes: {reason}.")
}

pub fn disconnected(player: PlayerId) -> String {
    format!("Player {player} disconnected and will be skipped.")
}

/// Final broadcast.
pub fn conclusion(summary: &GameSummary) -> String {
    let headline = match summary.phase {
        Phase::Won => "Every firework is complete. You win!",
        Phase::Lost if summary.fuse_tokens == 0 => "The last fuse burned out. Game over.",
        Phase::Lost => "Nobody left at the table can make a move. Game over.",
        Phase::Abandoned => "Every player left. Game abandoned.",
        Phase::Admitting | Phase::InProgress => "The game stopped.",
    };
    format!(
        "{headline} Final score: {} after {} round(s).",
        summary.score, summary.rounds
    )
}
