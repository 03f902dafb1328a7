//! Card, colour, and hand types.
//!
//! A game uses one colour per player (at most five).  Each colour contributes
//! ten cards to the deck: three 1s, two each of 2–4, and a single 5.
//!
//! # Examples
//!
//! ```
//! use hanabi_core::cards::{Card, Color};
//!
//! let card = Card::new(Color::Red, 3);
//! assert_eq!(card.to_string(), "Red3");
//! ```

use rand::rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of slots in every hand.
pub const HAND_SIZE: usize = 5;

/// Highest rank of any colour.
pub const MAX_RANK: u8 = 5;

/// Rank multiset contributed by each colour.
const RANKS_PER_COLOR: [u8; 10] = [1, 1, 1, 2, 2, 3, 3, 4, 4, 5];

/// Firework colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    White,
}

impl Color {
    /// All colours, in the order they join the game.
    pub const ALL: [Color; 5] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::White,
    ];

    /// Colours used by a game with `players` participants.
    pub fn in_play(players: u8) -> &'static [Color] {
        let n = usize::from(players).min(Self::ALL.len());
        &Self::ALL[..n]
    }

    /// Position of this colour in [`Color::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "Red",
            Color::Blue => "Blue",
            Color::Green => "Green",
            Color::Yellow => "Yellow",
            Color::White => "White",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Option<Color> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub color: Color,
    pub rank: u8,
}

impl Card {
    pub fn new(color: Color, rank: u8) -> Self {
        Self { color, rank }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.color, self.rank)
    }
}

/// Build a shuffled deck for `players` participants.
///
/// The deck is consumed from the end, like a stack.
pub fn new_deck(players: u8) -> Vec<Card> {
    let mut deck = ordered_deck(players);
    let mut rng = rng();
    deck.shuffle(&mut rng);
    deck
}

/// Unshuffled deck, grouped by colour.
pub fn ordered_deck(players: u8) -> Vec<Card> {
    Color::in_play(players)
        .iter()
        .flat_map(|&color| RANKS_PER_COLOR.iter().map(move |&rank| Card::new(color, rank)))
        .collect()
}

/// Letter a client uses to address `slot`.
pub fn slot_letter(slot: usize) -> char {
    debug_assert!(slot < HAND_SIZE);
    (b'a' + slot as u8) as char
}

/// A player's hand.
///
/// Slots keep their position for the whole game: a played card is replaced
/// in place by the next card drawn, so the letter a client uses for a slot
/// never shifts onto a different card.  Once the deck runs out, played slots
/// stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    slots: [Option<Card>; HAND_SIZE],
}

impl Hand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a hand from up to [`HAND_SIZE`] cards, filling slots from `a`.
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut hand = Self::new();
        for (slot, card) in hand.slots.iter_mut().zip(cards) {
            *slot = Some(card);
        }
        hand
    }

    pub fn get(&self, slot: usize) -> Option<Card> {
        self.slots.get(slot).copied().flatten()
    }

    /// Remove and return the card in `slot`, leaving it empty.
    pub fn take(&mut self, slot: usize) -> Option<Card> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    /// Put `card` into `slot`, returning whatever was there.
    pub fn place(&mut self, slot: usize, card: Card) -> Option<Card> {
        self.slots.get_mut(slot).and_then(|s| s.replace(card))
    }

    /// Number of cards currently held.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Occupied slots in order, with their index.
    pub fn cards(&self) -> impl Iterator<Item = (usize, Card)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|c| (i, c)))
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (slot, card) in self.cards() {
            if !first {
                f.write_str(" ")?;
            }
            write!(f, "{}){}", slot_letter(slot), card)?;
            first = false;
        }
        if first {
            f.write_str("(empty)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_composition() {
        let deck = ordered_deck(3);
        assert_eq!(deck.len(), 30);
        for &color in Color::in_play(3) {
            let ranks: Vec<u8> = deck
                .iter()
                .filter(|c| c.color == color)
                .map(|c| c.rank)
                .collect();
            assert_eq!(ranks, RANKS_PER_COLOR);
        }
        assert!(deck.iter().all(|c| c.color != Color::Yellow));
    }

    #[test]
    fn test_shuffled_deck_keeps_cards() {
        let mut shuffled = new_deck(5);
        let mut ordered = ordered_deck(5);
        let key = |c: &Card| (c.color, c.rank);
        shuffled.sort_by_key(key);
        ordered.sort_by_key(key);
        assert_eq!(shuffled, ordered);
    }

    #[test]
    fn test_in_play_colors() {
        assert_eq!(Color::in_play(2), &[Color::Red, Color::Blue]);
        assert_eq!(Color::in_play(5).len(), 5);
    }

    #[test]
    fn test_color_from_name() {
        assert_eq!(Color::from_name("Green"), Some(Color::Green));
        assert_eq!(Color::from_name("white"), Some(Color::White));
        assert_eq!(Color::from_name("Purple"), None);
    }

    #[test]
    fn test_hand_slots_are_stable() {
        let mut hand = Hand::from_cards([
            Card::new(Color::Red, 1),
            Card::new(Color::Blue, 2),
            Card::new(Color::Green, 3),
        ]);
        assert_eq!(hand.take(1), Some(Card::new(Color::Blue, 2)));
        assert_eq!(hand.get(1), None);
        assert_eq!(hand.get(2), Some(Card::new(Color::Green, 3)));

        hand.place(1, Card::new(Color::Red, 5));
        assert_eq!(hand.get(1), Some(Card::new(Color::Red, 5)));
        assert_eq!(hand.len(), 3);
        assert_eq!(hand.take(7), None);
    }

    #[test]
    fn test_hand_display() {
        let mut hand = Hand::from_cards([Card::new(Color::Red, 1), Card::new(Color::Blue, 4)]);
        assert_eq!(hand.to_string(), "a)Red1 b)Blue4");
        hand.take(0);
        assert_eq!(hand.to_string(), "b)Blue4");
        hand.take(1);
        assert_eq!(hand.to_string(), "(empty)");
    }
}
