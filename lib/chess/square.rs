use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::ops::Sub;
use std::{fmt, str::FromStr};

/// A square on the chess board, addressed by `(row, col)`.
///
/// Row 0 is black's home rank (rank 8) and column 0 is the a-file, so `a1` is `(7, 0)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(try_from = "(u8, u8)", into = "(u8, u8)")]
pub struct Square {
    #[cfg_attr(test, strategy(0u8..8))]
    row: u8,
    #[cfg_attr(test, strategy(0u8..8))]
    col: u8,
}

impl Square {
    /// Constructs [`Square`] from a pair of coordinates, if both lie on the board.
    #[inline(always)]
    pub const fn new(row: u8, col: u8) -> Option<Self> {
        if row < 8 && col < 8 {
            Some(Square { row, col })
        } else {
            None
        }
    }

    /// This square's row, counted from black's home rank.
    #[inline(always)]
    pub fn row(&self) -> u8 {
        self.row
    }

    /// This square's column, counted from the a-file.
    #[inline(always)]
    pub fn col(&self) -> u8 {
        self.col
    }

    /// The square displaced by `(dr, dc)`, if it lies on the board.
    #[inline(always)]
    pub fn offset(&self, dr: i8, dc: i8) -> Option<Self> {
        let row = self.row as i8 + dr;
        let col = self.col as i8 + dc;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Square::new(row as u8, col as u8)
        } else {
            None
        }
    }

    /// The squares at most one step away, excluding this one.
    pub fn neighbors(&self) -> impl Iterator<Item = Square> + '_ {
        (-1..=1)
            .flat_map(|dr| (-1..=1).map(move |dc| (dr, dc)))
            .filter(|&d| d != (0, 0))
            .filter_map(|(dr, dc)| self.offset(dr, dc))
    }

    /// Whether the other square is at most one step away.
    #[inline(always)]
    pub fn is_adjacent(&self, other: Square) -> bool {
        let (dr, dc) = *self - other;
        (dr, dc) != (0, 0) && dr.abs() <= 1 && dc.abs() <= 1
    }

    /// An iterator over all squares, row by row.
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> {
        (0..64u8).map(|i| Square {
            row: i / 8,
            col: i % 8,
        })
    }
}

impl TryFrom<(u8, u8)> for Square {
    type Error = ParseSquareError;

    #[inline(always)]
    fn try_from((row, col): (u8, u8)) -> Result<Self, Self::Error> {
        Square::new(row, col).ok_or(ParseSquareError)
    }
}

impl From<Square> for (u8, u8) {
    #[inline(always)]
    fn from(sq: Square) -> Self {
        (sq.row, sq.col)
    }
}

/// The `(row, col)` displacement between two squares.
impl Sub for Square {
    type Output = (i8, i8);

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self::Output {
        (
            self.row as i8 - rhs.row as i8,
            self.col as i8 - rhs.col as i8,
        )
    }
}

/// Prints the square in algebraic notation.
impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.col) as char, 8 - self.row)
    }
}

/// The reason why parsing [`Square`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display("failed to parse square")]
pub struct ParseSquareError;

impl FromStr for Square {
    type Err = ParseSquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let &[file @ b'a'..=b'h', rank @ b'1'..=b'8'] = s.as_bytes() else {
            return Err(ParseSquareError);
        };

        Square::new(b'8' - rank, file - b'a').ok_or(ParseSquareError)
    }
}
