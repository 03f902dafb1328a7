//! Shared game record: deck, hands, played pile, tokens, and phase.
//!
//! This module holds data only.  Every mutation during play goes through
//! [`crate::rules`], and the server keeps the single [`GameState`] behind its
//! table mutex.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cards::{Card, Color, HAND_SIZE, Hand, MAX_RANK};

/// Stable player identity, assigned sequentially from 1 at admission.
pub type PlayerId = u32;

/// Fuse tokens at the start of a game.
pub const MAX_FUSE: u8 = 3;

/// Lifecycle of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the roster to fill.
    Admitting,
    InProgress,
    Won,
    Lost,
    /// Every player disconnected.
    Abandoned,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Won | Phase::Lost | Phase::Abandoned)
    }
}

/// Shared information and fuse tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPool {
    pub info: u8,
    pub fuse: u8,
    max_info: u8,
}

impl TokenPool {
    /// Full pool for a game with `players` participants.
    pub fn new(players: u8) -> Self {
        let max_info = players + 3;
        Self {
            info: max_info,
            fuse: MAX_FUSE,
            max_info,
        }
    }

    pub fn max_info(&self) -> u8 {
        self.max_info
    }

    /// Spend one information token.  Returns `false` if none are left.
    pub fn spend_info(&mut self) -> bool {
        if self.info == 0 {
            return false;
        }
        self.info -= 1;
        true
    }

    /// Restore one information token, up to the cap.  Returns whether the
    /// count changed.
    pub fn restore_info(&mut self) -> bool {
        if self.info >= self.max_info {
            return false;
        }
        self.info += 1;
        true
    }

    pub fn burn_fuse(&mut self) {
        self.fuse = self.fuse.saturating_sub(1);
    }
}

/// Highest rank successfully played per colour (0 = nothing yet).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayedPile {
    tops: [u8; 5],
}

impl PlayedPile {
    pub fn top(&self, color: Color) -> u8 {
        self.tops[color.index()]
    }

    /// Raise `color` by one rank.  Callers check validity first.
    pub(crate) fn advance(&mut self, color: Color) {
        let top = &mut self.tops[color.index()];
        debug_assert!(*top < MAX_RANK);
        *top += 1;
    }

    /// Sum of the tops of the given colours.
    pub fn score(&self, colors: &[Color]) -> u32 {
        colors.iter().map(|&c| u32::from(self.top(c))).sum()
    }

    pub fn is_complete(&self, colors: &[Color]) -> bool {
        colors.iter().all(|&c| self.top(c) == MAX_RANK)
    }
}

/// The complete mutable game record.
#[derive(Debug, Clone)]
pub struct GameState {
    player_count: u8,
    /// Draw pile; the next card is at the end.
    pub deck: Vec<Card>,
    pub hands: BTreeMap<PlayerId, Hand>,
    pub played: PlayedPile,
    /// Misplayed cards, in order.
    pub discards: Vec<Card>,
    pub tokens: TokenPool,
    pub round: u32,
    pub current_player: Option<PlayerId>,
    pub phase: Phase,
}

impl GameState {
    /// Deal a new game for players `1..=player_count` from `deck`.
    ///
    /// Each player receives up to [`HAND_SIZE`] cards from the top of the
    /// deck, one player at a time.
    pub fn new(player_count: u8, mut deck: Vec<Card>) -> Self {
        let hands = (1..=PlayerId::from(player_count))
            .map(|id| {
                let take = HAND_SIZE.min(deck.len());
                let cards: Vec<Card> = (0..take).filter_map(|_| deck.pop()).collect();
                (id, Hand::from_cards(cards))
            })
            .collect();

        Self {
            player_count,
            deck,
            hands,
            played: PlayedPile::default(),
            discards: Vec::new(),
            tokens: TokenPool::new(player_count),
            round: 0,
            current_player: None,
            phase: Phase::Admitting,
        }
    }

    pub fn player_count(&self) -> u8 {
        self.player_count
    }

    /// Colours in use for this game.
    pub fn colors(&self) -> &'static [Color] {
        Color::in_play(self.player_count)
    }

    /// Player ids in seating order.
    pub fn roster(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.hands.keys().copied()
    }

    pub fn hand(&self, player: PlayerId) -> Option<&Hand> {
        self.hands.get(&player)
    }

    pub fn score(&self) -> u32 {
        self.played.score(self.colors())
    }

    /// Whether `player` can take any action at all.
    pub fn has_legal_action(&self, player: PlayerId) -> bool {
        let has_cards = self.hand(player).is_some_and(|h| !h.is_empty());
        has_cards || self.tokens.info > 0
    }

    /// Snapshot for logging and the final broadcast.
    pub fn summary(&self) -> GameSummary {
        GameSummary {
            phase: self.phase,
            rounds: self.round,
            score: self.score(),
            played: self
                .colors()
                .iter()
                .map(|&c| (c, self.played.top(c)))
                .collect(),
            info_tokens: self.tokens.info,
            fuse_tokens: self.tokens.fuse,
            deck_remaining: self.deck.len(),
        }
    }
}

/// Serializable end-of-game summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub phase: Phase,
    pub rounds: u32,
    pub score: u32,
    pub played: Vec<(Color, u8)>,
    pub info_tokens: u8,
    pub fuse_tokens: u8,
    pub deck_remaining: usize,
}
