use crate::chess::{Castles, Piece, Square};
use bitflags::bitflags;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A chess move in [pure coordinate notation].
///
/// [pure coordinate notation]: https://www.chessprogramming.org/Algebraic_Chess_Notation#Pure_coordinate_notation
#[derive(
    derive_more::Debug,
    Display,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[debug("Move({self})")]
#[display("{_0}{_1}")]
pub struct Move(pub Square, pub Square);

impl Move {
    /// The source [`Square`].
    #[inline(always)]
    pub fn whence(&self) -> Square {
        self.0
    }

    /// The destination [`Square`].
    #[inline(always)]
    pub fn whither(&self) -> Square {
        self.1
    }
}

/// The reason why the string is not a valid move.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display("failed to parse move")]
pub struct ParseMoveError;

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (whence, whither) = s.split_at_checked(2).ok_or(ParseMoveError)?;
        let whence = whence.parse().map_err(|_| ParseMoveError)?;
        let whither = whither.parse().map_err(|_| ParseMoveError)?;
        Ok(Move(whence, whither))
    }
}

bitflags! {
    /// Characteristics of a played move.
    #[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
    pub struct MoveFlags: u8 {
        const CAPTURE = 0b0001;
        const CASTLE = 0b0010;
        const EN_PASSANT = 0b0100;
        const PROMOTION = 0b1000;
        const DOUBLE_PUSH = 0b1_0000;
    }
}

/// A played move along with everything needed to take it back.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct MoveRecord {
    pub whence: Square,
    pub whither: Square,
    /// The piece as it stood on `whence`, before any promotion.
    pub piece: Piece,
    /// The captured piece and the square it was captured on.
    pub capture: Option<(Piece, Square)>,
    pub flags: MoveFlags,
    /// The castling rights before this move.
    pub castles: Castles,
    /// The en passant target before this move.
    pub en_passant: Option<Square>,
}

impl MoveRecord {
    /// The [`Move`] played.
    #[inline(always)]
    pub fn to_move(&self) -> Move {
        Move(self.whence, self.whither)
    }

    /// Whether this was a castling move.
    #[inline(always)]
    pub fn is_castling(&self) -> bool {
        self.flags.contains(MoveFlags::CASTLE)
    }

    /// Whether this was an en passant capture.
    #[inline(always)]
    pub fn is_en_passant(&self) -> bool {
        self.flags.contains(MoveFlags::EN_PASSANT)
    }

    /// Whether this was a promotion.
    #[inline(always)]
    pub fn is_promotion(&self) -> bool {
        self.flags.contains(MoveFlags::PROMOTION)
    }

    /// Whether this was a capture.
    #[inline(always)]
    pub fn is_capture(&self) -> bool {
        self.capture.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn parsing_printed_move_is_an_identity(m: Move) {
        assert_eq!(m.to_string().parse(), Ok(m));
    }

    #[proptest]
    fn parsing_move_fails_if_length_not_four(#[filter(#s.len() != 4)] s: String) {
        assert_eq!(s.parse::<Move>(), Err(ParseMoveError));
    }

    #[test]
    fn move_prints_in_coordinate_notation() {
        let m: Move = "e2e4".parse().unwrap();
        assert_eq!(m.whence().to_string(), "e2");
        assert_eq!(m.whither().to_string(), "e4");
        assert_eq!(format!("{m:?}"), "Move(e2e4)");
    }
}
