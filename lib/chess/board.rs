use crate::chess::{Color, Piece, Role, Square};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Write};
use std::ops::{Index, IndexMut};

/// The 8x8 array of optional pieces, without any overlay.
///
/// Cheap to copy, which is what the legality engine relies on to evaluate moves on scratch boards.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Grid([[Option<Piece>; 8]; 8]);

impl Grid {
    /// An iterator over all pieces on the grid.
    pub fn iter(&self) -> impl Iterator<Item = (Piece, Square)> + '_ {
        Square::iter().filter_map(|sq| Some((self[sq]?, sq)))
    }

    /// [`Square`] occupied by the king of a [`Color`].
    pub fn king(&self, side: Color) -> Option<Square> {
        self.iter()
            .find(|(p, _)| *p == Piece(side, Role::King))
            .map(|(_, sq)| sq)
    }
}

impl Index<Square> for Grid {
    type Output = Option<Piece>;

    #[inline(always)]
    fn index(&self, sq: Square) -> &Self::Output {
        &self.0[sq.row() as usize][sq.col() as usize]
    }
}

impl IndexMut<Square> for Grid {
    #[inline(always)]
    fn index_mut(&mut self, sq: Square) -> &mut Self::Output {
        &mut self.0[sq.row() as usize][sq.col() as usize]
    }
}

/// A piece temporarily taken off the board, waiting to return to its origin.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TemporaryCapture {
    pub piece: Piece,
    pub origin: Square,
    /// Full rounds left before the piece attempts to return.
    pub rounds: u8,
}

/// The chess board with its magical overlays.
///
/// No rule is enforced here, every write is taken at face value.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Board {
    grid: Grid,
    frozen: BTreeMap<Square, u8>,
    barriers: BTreeSet<Square>,
    invisible: BTreeSet<Square>,
    exiles: Vec<TemporaryCapture>,
}

impl Default for Board {
    fn default() -> Self {
        use Role::*;
        const BACK: [Role; 8] = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];

        let mut board = Board::empty();

        for c in Color::iter() {
            for (col, role) in BACK.into_iter().enumerate() {
                if let Some(sq) = Square::new(c.home_row(), col as u8) {
                    board.grid[sq] = Some(Piece(c, role));
                }

                if let Some(sq) = Square::new(c.pawn_row(), col as u8) {
                    board.grid[sq] = Some(Piece(c, Pawn));
                }
            }
        }

        board
    }
}

impl Board {
    /// A board without pieces nor overlays.
    pub fn empty() -> Self {
        Board {
            grid: Grid::default(),
            frozen: BTreeMap::new(),
            barriers: BTreeSet::new(),
            invisible: BTreeSet::new(),
            exiles: Vec::new(),
        }
    }

    /// The bare array of pieces.
    #[inline(always)]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The [`Piece`] on the given [`Square`], if any.
    #[inline(always)]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.grid[sq]
    }

    /// Whether the given [`Square`] holds a piece.
    #[inline(always)]
    pub fn is_occupied(&self, sq: Square) -> bool {
        self.grid[sq].is_some()
    }

    /// Whether the given [`Square`] holds a piece of a [`Color`].
    #[inline(always)]
    pub fn is_owned_by(&self, sq: Square, side: Color) -> bool {
        self.grid[sq].is_some_and(|p| p.color() == side)
    }

    /// Writes a cell, returning its previous content.
    ///
    /// The invisibility marker of the previous occupant is dropped.
    pub fn place(&mut self, sq: Square, piece: Option<Piece>) -> Option<Piece> {
        self.invisible.remove(&sq);
        std::mem::replace(&mut self.grid[sq], piece)
    }

    /// Moves the piece on `whence` onto `whither`, returning whatever stood on `whither`.
    ///
    /// The invisibility marker travels with the piece.
    pub fn shift(&mut self, whence: Square, whither: Square) -> Option<Piece> {
        let hidden = self.invisible.remove(&whence);
        let piece = self.place(whence, None);
        let displaced = self.place(whither, piece);
        if hidden && piece.is_some() {
            self.invisible.insert(whither);
        }

        displaced
    }

    /// Whether the given [`Square`] is frozen.
    #[inline(always)]
    pub fn is_frozen(&self, sq: Square) -> bool {
        self.frozen.contains_key(&sq)
    }

    /// Whether the given [`Square`] holds a barrier.
    #[inline(always)]
    pub fn is_barrier(&self, sq: Square) -> bool {
        self.barriers.contains(&sq)
    }

    /// Whether the given [`Square`] is frozen or holds a barrier.
    #[inline(always)]
    pub fn is_blocked(&self, sq: Square) -> bool {
        self.is_frozen(sq) || self.is_barrier(sq)
    }

    /// Whether the piece on the given [`Square`] is invisible.
    #[inline(always)]
    pub fn is_invisible(&self, sq: Square) -> bool {
        self.invisible.contains(&sq)
    }

    /// Frozen squares along with the full rounds they remain frozen for.
    pub fn frozen(&self) -> impl Iterator<Item = (Square, u8)> + '_ {
        self.frozen.iter().map(|(&sq, &r)| (sq, r))
    }

    /// Squares holding a barrier.
    pub fn barriers(&self) -> impl Iterator<Item = Square> + '_ {
        self.barriers.iter().copied()
    }

    /// Squares holding an invisible piece.
    pub fn invisible(&self) -> impl Iterator<Item = Square> + '_ {
        self.invisible.iter().copied()
    }

    /// Freezes a square for a number of full rounds, extending any ongoing freeze.
    pub fn freeze(&mut self, sq: Square, rounds: u8) {
        let r = self.frozen.entry(sq).or_default();
        *r = (*r).max(rounds);
    }

    /// Counts down one full round on every frozen square, thawing those that reach zero.
    pub fn thaw(&mut self) {
        self.frozen.retain(|_, r| {
            *r = r.saturating_sub(1);
            *r > 0
        });
    }

    /// Places a permanent barrier.
    pub fn raise_barrier(&mut self, sq: Square) {
        self.barriers.insert(sq);
    }

    /// Marks the piece on the given square as invisible.
    pub fn conceal(&mut self, sq: Square) {
        if self.is_occupied(sq) {
            self.invisible.insert(sq);
        }
    }

    /// Pieces currently off the board, oldest first.
    #[inline(always)]
    pub fn exiles(&self) -> &[TemporaryCapture] {
        &self.exiles
    }

    /// Mutable access to the pieces currently off the board.
    #[inline(always)]
    pub fn exiles_mut(&mut self) -> &mut Vec<TemporaryCapture> {
        &mut self.exiles
    }

    /// [`Square`] occupied by the king of a [`Color`].
    #[inline(always)]
    pub fn king(&self, side: Color) -> Option<Square> {
        self.grid.king(side)
    }

    /// An iterator over all pieces on the board.
    #[inline(always)]
    pub fn iter(&self) -> impl Iterator<Item = (Piece, Square)> + '_ {
        self.grid.iter()
    }
}

/// Retrieves the [`Piece`] at a given [`Square`], if any.
impl Index<Square> for Board {
    type Output = Option<Piece>;

    #[inline(always)]
    fn index(&self, sq: Square) -> &Self::Output {
        &self.grid[sq]
    }
}

/// Draws the board with rank 8 on top.
///
/// Empty squares print as `.`, barriers as `#` and frozen empty squares as `*`.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for sq in Square::iter() {
            match self[sq] {
                Some(p) => write!(f, "{p}")?,
                None if self.is_barrier(sq) => f.write_char('#')?,
                None if self.is_frozen(sq) => f.write_char('*')?,
                None => f.write_char('.')?,
            }

            if sq.col() == 7 {
                writeln!(f, " {}", 8 - sq.row())?;
            }
        }

        f.write_str("abcdefgh")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_strategy::proptest;

    #[test]
    fn default_board_holds_the_standard_setup() {
        let b = Board::default();
        assert_eq!(b.iter().count(), 32);
        assert_eq!(b.king(Color::White), "e1".parse().ok());
        assert_eq!(b.king(Color::Black), "e8".parse().ok());
        assert_eq!(b["d1".parse().unwrap()], Some(Piece(Color::White, Role::Queen)));
        assert_eq!(b["h7".parse().unwrap()], Some(Piece(Color::Black, Role::Pawn)));
    }

    #[test]
    fn board_prints_rank_eight_on_top() {
        let b = Board::default();
        let first = b.to_string().lines().next().map(String::from);
        assert_eq!(first.as_deref(), Some("rnbqkbnr 8"));
    }

    #[proptest]
    fn place_returns_previous_occupant(sq: Square, a: Piece, b: Piece) {
        let mut board = Board::empty();
        assert_eq!(board.place(sq, Some(a)), None);
        assert_eq!(board.place(sq, Some(b)), Some(a));
        assert_eq!(board.piece_at(sq), Some(b));
    }

    #[proptest]
    fn is_owned_by_checks_the_color_of_the_occupant(sq: Square, p: Piece) {
        let mut board = Board::empty();
        assert!(!board.is_owned_by(sq, p.color()));
        board.place(sq, Some(p));
        assert!(board.is_owned_by(sq, p.color()));
        assert!(!board.is_owned_by(sq, !p.color()));
    }

    #[proptest]
    fn frozen_and_barrier_squares_are_blocked(a: Square, b: Square) {
        let mut board = Board::empty();
        board.freeze(a, 2);
        board.raise_barrier(b);
        assert!(board.is_blocked(a));
        assert!(board.is_blocked(b));
    }

    #[proptest]
    fn freeze_lasts_the_given_number_of_rounds(sq: Square, #[strategy(1u8..5)] rounds: u8) {
        let mut board = Board::empty();
        board.freeze(sq, rounds);

        for _ in 1..rounds {
            board.thaw();
            assert!(board.is_frozen(sq));
        }

        board.thaw();
        assert!(!board.is_frozen(sq));
    }

    #[proptest]
    fn shift_carries_the_invisibility_marker(
        p: Piece,
        whence: Square,
        #[filter(#whence != #whither)] whither: Square,
    ) {
        let mut board = Board::empty();
        board.place(whence, Some(p));
        board.conceal(whence);
        board.shift(whence, whither);
        assert!(!board.is_invisible(whence));
        assert!(board.is_invisible(whither));
        assert_eq!(board.piece_at(whither), Some(p));
    }

    #[proptest]
    fn overwriting_a_square_drops_its_invisibility_marker(sq: Square, a: Piece, b: Piece) {
        let mut board = Board::empty();
        board.place(sq, Some(a));
        board.conceal(sq);
        board.place(sq, Some(b));
        assert!(!board.is_invisible(sq));
    }

    #[proptest]
    fn empty_squares_cannot_be_concealed(sq: Square) {
        let mut board = Board::empty();
        board.conceal(sq);
        assert!(!board.is_invisible(sq));
    }
}
