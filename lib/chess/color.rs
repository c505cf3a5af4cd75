use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::ops::Not;

/// The owner of a chess [`Piece`][`crate::chess::Piece`].
///
/// White is the first player and starts at the bottom of the board (row 7).
#[derive(
    Debug, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Color {
    #[display("white")]
    White,
    #[display("black")]
    Black,
}

impl Color {
    /// Both colors, in turn order.
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        [Color::White, Color::Black].into_iter()
    }

    /// The row delta of a forward step for pawns of this color.
    #[inline(always)]
    pub fn forward(&self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// The row where the pieces of this color start.
    #[inline(always)]
    pub fn home_row(&self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// The row where the pawns of this color start.
    #[inline(always)]
    pub fn pawn_row(&self) -> u8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    /// The row where the pawns of this color promote.
    #[inline(always)]
    pub fn promotion_row(&self) -> u8 {
        (!*self).home_row()
    }
}

impl Not for Color {
    type Output = Self;

    #[inline(always)]
    fn not(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn color_implements_not_operator(c: Color) {
        assert_eq!(!!c, c);
        assert_ne!(!c, c);
    }

    #[proptest]
    fn pawns_promote_on_the_opponents_home_row(c: Color) {
        assert_eq!(c.promotion_row(), (!c).home_row());
    }

    #[proptest]
    fn pawns_start_one_step_forward_of_the_home_row(c: Color) {
        assert_eq!(c.home_row() as i8 + c.forward(), c.pawn_row() as i8);
    }

    #[test]
    fn white_moves_first() {
        assert_eq!(Color::iter().next(), Some(Color::White));
    }
}
