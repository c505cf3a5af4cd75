use crate::chess::Square;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One of the eight compass directions, north pointing at rank 8.
#[derive(
    Debug, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[display("n")]
    N,
    #[display("ne")]
    NE,
    #[display("e")]
    E,
    #[display("se")]
    SE,
    #[display("s")]
    S,
    #[display("sw")]
    SW,
    #[display("w")]
    W,
    #[display("nw")]
    NW,
}

impl Direction {
    /// All directions, clockwise from north.
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        use Direction::*;
        [N, NE, E, SE, S, SW, W, NW].into_iter()
    }

    /// The `(row, col)` step in this direction.
    #[inline(always)]
    pub fn delta(&self) -> (i8, i8) {
        match self {
            Direction::N => (-1, 0),
            Direction::NE => (-1, 1),
            Direction::E => (0, 1),
            Direction::SE => (1, 1),
            Direction::S => (1, 0),
            Direction::SW => (1, -1),
            Direction::W => (0, -1),
            Direction::NW => (-1, -1),
        }
    }

    /// The squares from `origin`, exclusive, to the edge of the board.
    pub fn ray(self, origin: Square) -> impl Iterator<Item = Square> {
        let (dr, dc) = self.delta();
        std::iter::successors(origin.offset(dr, dc), move |sq| sq.offset(dr, dc))
    }
}

/// The reason why parsing [`Direction`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display("failed to parse direction")]
pub struct ParseDirectionError;

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Direction::iter()
            .find(|d| d.to_string() == s)
            .ok_or(ParseDirectionError)
    }
}

/// What an effect is aimed at.
///
/// Written as `-`, `e4`, `n`, `e4:n` or `e4>d5` respectively.
#[derive(Debug, Display, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum Target {
    /// Nothing in particular.
    #[default]
    #[display("-")]
    None,

    /// A single square.
    #[display("{_0}")]
    Square(Square),

    /// A direction away from the casting king.
    #[display("{_0}")]
    Direction(Direction),

    /// A direction away from an explicit caster.
    #[display("{_0}:{_1}")]
    Ray(Square, Direction),

    /// An acting piece and the square it acts upon.
    #[display("{_0}>{_1}")]
    Pair(Square, Square),
}

/// The reason why parsing [`Target`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display("failed to parse effect target")]
pub struct ParseTargetError;

impl FromStr for Target {
    type Err = ParseTargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            Ok(Target::None)
        } else if let Some((sq, dir)) = s.split_once(':') {
            let sq = sq.parse().map_err(|_| ParseTargetError)?;
            let dir = dir.parse().map_err(|_| ParseTargetError)?;
            Ok(Target::Ray(sq, dir))
        } else if let Some((a, b)) = s.split_once('>') {
            let a = a.parse().map_err(|_| ParseTargetError)?;
            let b = b.parse().map_err(|_| ParseTargetError)?;
            Ok(Target::Pair(a, b))
        } else if let Ok(dir) = s.parse() {
            Ok(Target::Direction(dir))
        } else {
            Ok(Target::Square(s.parse().map_err(|_| ParseTargetError)?))
        }
    }
}
