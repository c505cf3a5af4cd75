use crate::chess::Color;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// The status of the game from the point of view of the side to move.
#[derive(Debug, Display, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    #[display("active")]
    Active,

    #[display("check")]
    Check,

    /// The side to move is checkmated.
    #[display("checkmate, the {_0} player lost")]
    Checkmate(Color),

    #[display("stalemate")]
    Stalemate,

    /// A player resigned.
    #[display("the {_0} player forfeited")]
    Forfeited(Color),
}

impl Status {
    /// Whether no further moves or effects are accepted.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Status::Checkmate(_) | Status::Stalemate | Status::Forfeited(_)
        )
    }

    /// The winning side, if the game is over and decisive.
    pub fn winner(&self) -> Option<Color> {
        match *self {
            Status::Checkmate(c) | Status::Forfeited(c) => Some(!c),
            _ => None,
        }
    }
}
