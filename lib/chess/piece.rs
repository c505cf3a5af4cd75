use crate::chess::{Color, ParseRoleError, Role};
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A chess [piece][`Role`] owned by a certain [`Color`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub struct Piece(pub Color, pub Role);

impl Piece {
    /// This piece's [`Color`].
    #[inline(always)]
    pub fn color(&self) -> Color {
        self.0
    }

    /// This piece's [`Role`].
    #[inline(always)]
    pub fn role(&self) -> Role {
        self.1
    }

    /// Whether this piece is a king.
    #[inline(always)]
    pub fn is_king(&self) -> bool {
        self.1 == Role::King
    }
}

/// Prints the piece in FEN notation, uppercase for white.
impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.color() {
            Color::White => write!(f, "{}", self.role().to_string().to_uppercase()),
            Color::Black => write!(f, "{}", self.role()),
        }
    }
}

/// The reason why parsing [`Piece`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error, From)]
#[display("failed to parse piece")]
pub struct ParsePieceError(ParseRoleError);

impl FromStr for Piece {
    type Err = ParsePieceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        let role = lower.parse()?;

        if lower == s {
            Ok(Piece(Color::Black, role))
        } else if s.to_uppercase() == s {
            Ok(Piece(Color::White, role))
        } else {
            Err(ParsePieceError(ParseRoleError))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[proptest]
    fn piece_has_a_color(r: Role, c: Color) {
        assert_eq!(Piece(c, r).color(), c);
    }

    #[proptest]
    fn piece_has_a_role(r: Role, c: Color) {
        assert_eq!(Piece(c, r).role(), r);
    }

    #[proptest]
    fn parsing_printed_piece_is_an_identity(p: Piece) {
        assert_eq!(p.to_string().parse(), Ok(p));
    }

    #[test]
    fn white_pieces_print_in_uppercase() {
        assert_eq!(Piece(Color::White, Role::Knight).to_string(), "N");
        assert_eq!(Piece(Color::Black, Role::Knight).to_string(), "n");
    }
}
