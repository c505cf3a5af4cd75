use crate::chess::{Color, Piece, Role, Square};
use bitflags::bitflags;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

bitflags! {
    /// The castling rights of both players.
    ///
    /// Rights are only ever revoked, never granted back.
    #[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
    pub struct Castles: u8 {
        const WHITE_SHORT = 0b0001;
        const WHITE_LONG = 0b0010;
        const BLACK_SHORT = 0b0100;
        const BLACK_LONG = 0b1000;
    }
}

impl Default for Castles {
    #[inline(always)]
    fn default() -> Self {
        Castles::all()
    }
}

impl Castles {
    /// The kingside right of the given side.
    #[inline(always)]
    pub fn short(side: Color) -> Self {
        match side {
            Color::White => Castles::WHITE_SHORT,
            Color::Black => Castles::BLACK_SHORT,
        }
    }

    /// The queenside right of the given side.
    #[inline(always)]
    pub fn long(side: Color) -> Self {
        match side {
            Color::White => Castles::WHITE_LONG,
            Color::Black => Castles::BLACK_LONG,
        }
    }

    /// Whether the given side has kingside castling rights.
    #[inline(always)]
    pub fn has_short(&self, side: Color) -> bool {
        self.contains(Castles::short(side))
    }

    /// Whether the given side has queenside castling rights.
    #[inline(always)]
    pub fn has_long(&self, side: Color) -> bool {
        self.contains(Castles::long(side))
    }

    /// The rights that depend on a piece never leaving nor being captured on a square.
    pub fn touching(sq: Square) -> Self {
        Color::iter()
            .filter(|c| sq.row() == c.home_row())
            .map(|c| match sq.col() {
                0 => Castles::long(c),
                4 => Castles::long(c) | Castles::short(c),
                7 => Castles::short(c),
                _ => Castles::empty(),
            })
            .fold(Castles::empty(), |a, b| a | b)
    }

    /// Revokes every right that depends on the given square.
    #[inline(always)]
    pub fn revoke(&mut self, sq: Square) {
        self.remove(Castles::touching(sq));
    }
}

impl fmt::Display for Castles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }

        for side in Color::iter() {
            if self.has_short(side) {
                fmt::Display::fmt(&Piece(side, Role::King), f)?;
            }

            if self.has_long(side) {
                fmt::Display::fmt(&Piece(side, Role::Queen), f)?;
            }
        }

        Ok(())
    }
}

/// The reason why parsing [`Castles`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display("failed to parse castling rights")]
pub struct ParseCastlesError;

impl FromStr for Castles {
    type Err = ParseCastlesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            return Ok(Castles::empty());
        }

        let mut castles = Castles::empty();

        for c in s.chars() {
            let right = match c {
                'K' => Castles::WHITE_SHORT,
                'Q' => Castles::WHITE_LONG,
                'k' => Castles::BLACK_SHORT,
                'q' => Castles::BLACK_LONG,
                _ => return Err(ParseCastlesError),
            };

            if castles.contains(right) {
                return Err(ParseCastlesError);
            }

            castles |= right;
        }

        match castles.is_empty() {
            true => Err(ParseCastlesError),
            false => Ok(castles),
        }
    }
}
