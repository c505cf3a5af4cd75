use crate::chess::Square;
use serde::{Deserialize, Serialize};

/// The lasting magical state of one player.
///
/// Per-turn spell and item counters live in the [`TurnRecord`][`crate::game::TurnRecord`].
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct MagicState {
    /// Upcoming rolls that are taken with advantage.
    pub rage: u8,
    /// The player may move once more this turn.
    pub extra_move: bool,
    /// The king also moves like a queen until this player's next turn begins.
    pub queen_soul: bool,
    /// Pieces other than the king may cast spells until the next spell is cast.
    pub wand: bool,
    /// The piece on this square may climb over one piece this turn.
    pub ladder: Option<Square>,
}

impl MagicState {
    /// Clears the grants that only last for a single turn.
    pub fn begin_turn(&mut self) {
        self.queen_soul = false;
        self.ladder = None;
    }

    /// Clears the grants that expire as soon as the turn ends.
    pub fn end_turn(&mut self) {
        self.extra_move = false;
    }
}
