//! Game rules: play validity, token accounting, and end conditions.
//!
//! Everything here is a pure function over [`GameState`].  The server calls
//! these one at a time while holding its table lock, so no two actions are
//! ever applied concurrently.

use thiserror::Error;

use crate::cards::{Card, Color, MAX_RANK, slot_letter};
use crate::game_state::{GameState, PlayedPile, PlayerId, Phase, TokenPool};

/// Rejected actions.  None of these mutate the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("no card in that slot")]
    InvalidSlot,

    #[error("no information tokens left")]
    NoTokens,

    #[error("not a valid target player")]
    InvalidTarget,

    #[error("information must be a rank 1-5 or a colour in play")]
    InvalidInfoType,

    #[error("no card in that hand matches")]
    NoMatch,
}

/// A piece of information about a target's hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    Rank(u8),
    Color(Color),
}

impl Hint {
    pub fn matches(self, card: Card) -> bool {
        match self {
            Hint::Rank(rank) => card.rank == rank,
            Hint::Color(color) => card.color == color,
        }
    }
}

impl std::fmt::Display for Hint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hint::Rank(rank) => write!(f, "{rank}"),
            Hint::Color(color) => write!(f, "{color}"),
        }
    }
}

/// Outcome of [`apply_play`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayResult {
    pub card: Card,
    pub slot: usize,
    /// `true` if the card extended its firework, `false` if it was discarded.
    pub success: bool,
    /// An information token came back from completing a firework.
    pub info_restored: bool,
    /// The slot was refilled from the deck.
    pub drew: bool,
    /// Token pool after the play.
    pub tokens: TokenPool,
}

/// Outcome of [`apply_information`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoResult {
    pub giver: PlayerId,
    pub target: PlayerId,
    pub hint: Hint,
    /// Slots in the target's hand that match, in ascending order.
    pub slots: Vec<usize>,
    pub tokens: TokenPool,
}

impl InfoResult {
    /// Matching slots as client letters, e.g. `"a, c"`.
    pub fn slot_letters(&self) -> String {
        self.slots
            .iter()
            .map(|&s| slot_letter(s).to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A card may be played only on top of the rank directly below it.
///
/// This also covers the opening card of a colour: a 1 is valid only while
/// nothing of that colour has been played.
pub fn is_play_valid(color: Color, rank: u8, played: &PlayedPile) -> bool {
    rank == played.top(color) + 1
}

/// Play the card in `slot` of `player`'s hand.
///
/// A valid card advances its firework (and a 5 restores an information
/// token); an invalid one is discarded and burns a fuse.  Either way the slot
/// is refilled in place from the deck if any cards remain.
pub fn apply_play(
    state: &mut GameState,
    player: PlayerId,
    slot: usize,
) -> Result<PlayResult, RuleError> {
    let hand = state.hands.get_mut(&player).ok_or(RuleError::InvalidSlot)?;
    let card = hand.take(slot).ok_or(RuleError::InvalidSlot)?;

    let drew = match state.deck.pop() {
        Some(next) => {
            hand.place(slot, next);
            true
        }
        None => false,
    };

    let success = is_play_valid(card.color, card.rank, &state.played);
    let mut info_restored = false;
    if success {
        state.played.advance(card.color);
        if card.rank == MAX_RANK {
            info_restored = state.tokens.restore_info();
        }
    } else {
        state.tokens.burn_fuse();
        state.discards.push(card);
    }

    Ok(PlayResult {
        card,
        slot,
        success,
        info_restored,
        drew,
        tokens: state.tokens,
    })
}

/// Tell `target` which of their cards match `hint`.
///
/// A token is spent only when at least one card matches; an empty match is
/// reported as [`RuleError::NoMatch`] and leaves the pool untouched.
pub fn apply_information(
    state: &mut GameState,
    giver: PlayerId,
    target: PlayerId,
    hint: Hint,
) -> Result<InfoResult, RuleError> {
    if state.tokens.info == 0 {
        return Err(RuleError::NoTokens);
    }
    if target == giver || !state.hands.contains_key(&target) {
        return Err(RuleError::InvalidTarget);
    }
    let hint_ok = match hint {
        Hint::Rank(rank) => (1..=MAX_RANK).contains(&rank),
        Hint::Color(color) => state.colors().contains(&color),
    };
    if !hint_ok {
        return Err(RuleError::InvalidInfoType);
    }

    let slots: Vec<usize> = state
        .hand(target)
        .map(|h| {
            h.cards()
                .filter(|&(_, card)| hint.matches(card))
                .map(|(slot, _)| slot)
                .collect()
        })
        .unwrap_or_default();
    if slots.is_empty() {
        return Err(RuleError::NoMatch);
    }

    state.tokens.spend_info();
    Ok(InfoResult {
        giver,
        target,
        hint,
        slots,
        tokens: state.tokens,
    })
}

/// Evaluate end conditions.  Run after every action.
///
/// Besides the fuse running out, the game is lost once no cards remain in the
/// deck or any hand, since nothing can change the played pile after that.
pub fn check_terminal(state: &GameState) -> Phase {
    if state.played.is_complete(state.colors()) {
        return Phase::Won;
    }
    if state.tokens.fuse == 0 {
        return Phase::Lost;
    }
    if state.deck.is_empty() && state.hands.values().all(|h| h.is_empty()) {
        return Phase::Lost;
    }
    Phase::InProgress
}
