pub mod cards;
pub mod game_state;
pub mod line_transport;
pub mod protocol;
pub mod rules;
pub mod transport;
