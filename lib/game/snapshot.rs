use crate::chess::{Board, Color, MoveRecord, Piece, Position, Status};
use crate::game::TurnRecord;
use crate::magic::MagicState;
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A read-only copy of the full game state.
///
/// Parses from and prints to [RON] verbatim.
///
/// [RON]: https://github.com/ron-rs/ron
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    pub position: Position,
    pub status: Status,
    pub turn: TurnRecord,
}

impl Snapshot {
    /// The board and its overlays.
    #[inline(always)]
    pub fn board(&self) -> &Board {
        self.position.board()
    }

    /// The player to move.
    #[inline(always)]
    pub fn current_player(&self) -> Color {
        self.position.turn()
    }

    /// The magical state of a player.
    #[inline(always)]
    pub fn magic(&self, side: Color) -> &MagicState {
        self.position.magic(side)
    }

    /// The pieces a player has lost.
    #[inline(always)]
    pub fn graveyard(&self, side: Color) -> &[Piece] {
        self.position.graveyard(side)
    }

    /// The moves played so far.
    #[inline(always)]
    pub fn history(&self) -> &[MoveRecord] {
        self.position.history()
    }
}

/// The reason why parsing [`Snapshot`] failed.
#[derive(Debug, Display, Eq, PartialEq, Error, From)]
#[display("failed to parse game snapshot")]
pub struct ParseSnapshotError(ron::de::SpannedError);

impl FromStr for Snapshot {
    type Err = ParseSnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ron::de::from_str(s)?)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&ron::ser::to_string(self).map_err(|_| fmt::Error)?)
    }
}
