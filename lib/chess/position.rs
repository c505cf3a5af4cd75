use crate::chess::{Board, Castles, Color, Grid, Move, MoveFlags, MoveRecord, Piece, Role};
use crate::chess::{Square, Status, TemporaryCapture};
use crate::magic::MagicState;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Represents an illegal [`Move`] in a given [`Position`].
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Error)]
pub enum IllegalMove {
    #[display("there is no piece on `{_0}`")]
    Vacant(#[error(not(source))] Square),

    #[display("the piece on `{_0}` belongs to the opponent")]
    NotOwned(#[error(not(source))] Square),

    #[display("square `{_0}` is blocked")]
    Blocked(#[error(not(source))] Square),

    #[display("square `{_0}` is occupied by a friendly piece")]
    Occupied(#[error(not(source))] Square),

    #[display("the king on `{_0}` cannot be captured")]
    Regicide(#[error(not(source))] Square),

    #[display("move `{_0}` does not match the piece's movement")]
    Pattern(#[error(not(source))] Move),

    #[display("move `{_0}` leaves the king in check")]
    SelfCheck(#[error(not(source))] Move),
}

/// The reason why moves could not be taken back.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Error)]
pub enum Paradox {
    #[display("not enough moves have been played")]
    Unrecorded,

    #[display("square `{_0}` was altered by magic since the move was played")]
    Altered(#[error(not(source))] Square),
}

/// A piece that came back from a temporary capture.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Return {
    pub piece: Piece,
    pub square: Square,
    /// The opponent piece captured on arrival, if any.
    pub capture: Option<Piece>,
}

/// The complete rules state: pieces, overlays, turn, castling, en passant,
/// magical grants, graveyards and move history.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Position {
    board: Board,
    turn: Color,
    castles: Castles,
    en_passant: Option<Square>,
    magic: [MagicState; 2],
    graveyards: [Vec<Piece>; 2],
    history: Vec<MoveRecord>,
}

impl Default for Position {
    fn default() -> Self {
        Position::setup(Board::default(), Color::White, Castles::all())
    }
}

impl Position {
    /// Sets up an arbitrary [`Board`] with the given side to move and castling rights.
    ///
    /// Rights whose king or rook is not on its original square are dropped.
    pub fn setup(board: Board, turn: Color, castles: Castles) -> Self {
        let mut castles = castles;
        for c in Color::iter() {
            let home = |col| Square::new(c.home_row(), col);
            let holds = |col, role| home(col).is_some_and(|sq| board[sq] == Some(Piece(c, role)));

            if !holds(4, Role::King) {
                castles.remove(Castles::short(c) | Castles::long(c));
            }

            if !holds(7, Role::Rook) {
                castles.remove(Castles::short(c));
            }

            if !holds(0, Role::Rook) {
                castles.remove(Castles::long(c));
            }
        }

        Position {
            board,
            turn,
            castles,
            en_passant: None,
            magic: Default::default(),
            graveyards: Default::default(),
            history: Vec::new(),
        }
    }

    /// The board and its overlays.
    #[inline(always)]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline(always)]
    pub(crate) fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// The side to move.
    #[inline(always)]
    pub fn turn(&self) -> Color {
        self.turn
    }

    /// The castling rights.
    #[inline(always)]
    pub fn castles(&self) -> Castles {
        self.castles
    }

    /// The en passant target, valid for the next move only.
    #[inline(always)]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// The magical state of a player.
    #[inline(always)]
    pub fn magic(&self, side: Color) -> &MagicState {
        &self.magic[side as usize]
    }

    #[inline(always)]
    pub(crate) fn magic_mut(&mut self, side: Color) -> &mut MagicState {
        &mut self.magic[side as usize]
    }

    /// The pieces a player has lost, most recently captured last.
    #[inline(always)]
    pub fn graveyard(&self, side: Color) -> &[Piece] {
        &self.graveyards[side as usize]
    }

    #[inline(always)]
    pub(crate) fn graveyard_mut(&mut self, side: Color) -> &mut Vec<Piece> {
        &mut self.graveyards[side as usize]
    }

    /// The moves played so far, oldest first.
    #[inline(always)]
    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    /// Whether the side to move is in check.
    pub fn is_check(&self) -> bool {
        match self.board.king(self.turn) {
            Some(k) => self.is_square_attacked(k, self.turn),
            None => false,
        }
    }

    /// Whether any piece of the opponent of `defender` can reach `sq` by its raw movement pattern.
    ///
    /// Pieces standing on frozen squares attack nothing, and lines are obstructed by
    /// pieces, barriers and frozen squares alike.
    pub fn is_square_attacked(&self, sq: Square, defender: Color) -> bool {
        self.is_attacked_on(self.board.grid(), sq, defender)
    }

    fn is_attacked_on(&self, grid: &Grid, sq: Square, defender: Color) -> bool {
        grid.iter()
            .filter(|(p, _)| p.color() != defender)
            .filter(|&(_, from)| !self.board.is_frozen(from))
            .any(|(p, from)| self.attacks(grid, p, from, sq))
    }

    fn attacks(&self, grid: &Grid, piece: Piece, whence: Square, whither: Square) -> bool {
        let (dr, dc) = whither - whence;

        match piece.role() {
            Role::Pawn => dr == piece.color().forward() && dc.abs() == 1,
            Role::Knight => matches!((dr.abs(), dc.abs()), (1, 2) | (2, 1)),
            Role::King => whence.is_adjacent(whither),
            Role::Bishop => dr.abs() == dc.abs() && self.is_path_clear(grid, whence, whither, 0),
            Role::Rook => (dr == 0 || dc == 0) && self.is_path_clear(grid, whence, whither, 0),
            Role::Queen => self.is_path_clear(grid, whence, whither, 0),
        }
    }

    /// Whether the squares strictly between two squares on a common line are unobstructed.
    ///
    /// Up to `hops` pieces may be climbed over, blocked squares never.
    fn is_path_clear(&self, grid: &Grid, whence: Square, whither: Square, hops: u8) -> bool {
        let (dr, dc) = whither - whence;
        if (dr, dc) == (0, 0) || (dr != 0 && dc != 0 && dr.abs() != dc.abs()) {
            return false;
        }

        let (sr, sc) = (dr.signum(), dc.signum());
        let mut hops = hops;
        let mut cursor = whence.offset(sr, sc);

        while let Some(sq) = cursor.filter(|&sq| sq != whither) {
            if self.board.is_blocked(sq) {
                return false;
            } else if grid[sq].is_some() {
                match hops.checked_sub(1) {
                    Some(h) => hops = h,
                    None => return false,
                }
            }

            cursor = sq.offset(sr, sc);
        }

        true
    }

    /// Checks whether a [`Move`] is legal, returning its characteristics if so.
    pub fn validate(&self, m: Move) -> Result<MoveFlags, IllegalMove> {
        let (whence, whither) = (m.whence(), m.whither());
        let side = self.turn;

        let piece = self.board[whence].ok_or(IllegalMove::Vacant(whence))?;
        if piece.color() != side {
            return Err(IllegalMove::NotOwned(whence));
        } else if self.board.is_frozen(whence) {
            return Err(IllegalMove::Blocked(whence));
        } else if self.board.is_blocked(whither) {
            return Err(IllegalMove::Blocked(whither));
        }

        match self.board[whither] {
            Some(p) if p.color() == side => return Err(IllegalMove::Occupied(whither)),
            Some(p) if p.is_king() => return Err(IllegalMove::Regicide(whither)),
            _ => {}
        }

        let flags = self.pattern(piece, m).ok_or(IllegalMove::Pattern(m))?;

        let mut grid = *self.board.grid();
        Self::apply_to(&mut grid, piece, m, flags);
        let king = grid.king(side);
        if king.is_some_and(|k| self.is_attacked_on(&grid, k, side)) {
            return Err(IllegalMove::SelfCheck(m));
        }

        Ok(flags)
    }

    /// Whether a [`Move`] is legal.
    #[inline(always)]
    pub fn is_legal(&self, m: Move) -> bool {
        self.validate(m).is_ok()
    }

    /// Matches a move against the movement pattern of the piece, including special moves.
    fn pattern(&self, piece: Piece, m: Move) -> Option<MoveFlags> {
        let (whence, whither) = (m.whence(), m.whither());
        let (dr, dc) = whither - whence;
        let grid = self.board.grid();
        let side = piece.color();
        let magic = self.magic(side);
        let hops = (magic.ladder == Some(whence)) as u8;

        let capture = match grid[whither] {
            Some(_) => MoveFlags::CAPTURE,
            None => MoveFlags::empty(),
        };

        let flags = match piece.role() {
            Role::Pawn => {
                let fwd = side.forward();
                let promotion = match whither.row() == side.promotion_row() {
                    true => MoveFlags::PROMOTION,
                    false => MoveFlags::empty(),
                };

                if dc == 0 && grid[whither].is_none() {
                    if dr == fwd {
                        promotion
                    } else if dr == 2 * fwd
                        && whence.row() == side.pawn_row()
                        && self.is_path_clear(grid, whence, whither, hops)
                    {
                        MoveFlags::DOUBLE_PUSH
                    } else {
                        return None;
                    }
                } else if dc.abs() == 1 && dr == fwd {
                    if grid[whither].is_some() {
                        capture | promotion
                    } else if self.is_en_passant(side, whence, whither) {
                        MoveFlags::CAPTURE | MoveFlags::EN_PASSANT
                    } else {
                        return None;
                    }
                } else {
                    return None;
                }
            }

            Role::Knight if matches!((dr.abs(), dc.abs()), (1, 2) | (2, 1)) => capture,
            Role::Bishop if dr.abs() == dc.abs() => self.slide(whence, whither, hops, capture)?,
            Role::Rook if dr == 0 || dc == 0 => self.slide(whence, whither, hops, capture)?,
            Role::Queen => self.slide(whence, whither, hops, capture)?,
            Role::King if whence.is_adjacent(whither) => capture,

            Role::King if dr == 0 && dc.abs() == 2 && self.can_castle(side, whence, whither) => {
                MoveFlags::CASTLE
            }

            Role::King if magic.queen_soul => self.slide(whence, whither, hops, capture)?,
            _ => return None,
        };

        Some(flags)
    }

    fn slide(&self, whence: Square, whither: Square, hops: u8, f: MoveFlags) -> Option<MoveFlags> {
        self.is_path_clear(self.board.grid(), whence, whither, hops).then_some(f)
    }

    fn is_en_passant(&self, side: Color, whence: Square, whither: Square) -> bool {
        let victim = Square::new(whence.row(), whither.col());
        self.en_passant == Some(whither)
            && victim.is_some_and(|sq| self.board[sq] == Some(Piece(!side, Role::Pawn)))
    }

    /// The king's castling squares and the rook's home square.
    fn castling_squares(side: Color, kingside: bool) -> Option<([Square; 3], Square)> {
        let row = side.home_row();
        let (path, rook) = match kingside {
            true => ([4, 5, 6], 7),
            false => ([4, 3, 2], 0),
        };

        Some((
            [
                Square::new(row, path[0])?,
                Square::new(row, path[1])?,
                Square::new(row, path[2])?,
            ],
            Square::new(row, rook)?,
        ))
    }

    fn can_castle(&self, side: Color, whence: Square, whither: Square) -> bool {
        let kingside = whither.col() > whence.col();
        let Some((path, rook)) = Self::castling_squares(side, kingside) else {
            return false;
        };

        let right = match kingside {
            true => self.castles.has_short(side),
            false => self.castles.has_long(side),
        };

        let between = |sq: &Square| {
            let (lo, hi) = (whence.col().min(rook.col()), whence.col().max(rook.col()));
            sq.row() == whence.row() && (lo + 1..hi).contains(&sq.col())
        };

        right
            && whence == path[0]
            && whither == path[2]
            && self.board[rook] == Some(Piece(side, Role::Rook))
            && !self.board.is_blocked(rook)
            && Square::iter()
                .filter(between)
                .all(|sq| !self.board.is_occupied(sq) && !self.board.is_blocked(sq))
            && path
                .iter()
                .all(|&sq| !self.board.is_blocked(sq) && !self.is_square_attacked(sq, side))
    }

    /// Moves pieces on a bare grid as the move would, without touching any other state.
    fn apply_to(grid: &mut Grid, piece: Piece, m: Move, flags: MoveFlags) {
        let (whence, whither) = (m.whence(), m.whither());
        grid[whence] = None;
        grid[whither] = match flags.contains(MoveFlags::PROMOTION) {
            true => Some(Piece(piece.color(), Role::Queen)),
            false => Some(piece),
        };

        if flags.contains(MoveFlags::EN_PASSANT) {
            if let Some(victim) = Square::new(whence.row(), whither.col()) {
                grid[victim] = None;
            }
        }

        if flags.contains(MoveFlags::CASTLE) {
            let kingside = whither.col() > whence.col();
            if let Some((path, rook)) = Self::castling_squares(piece.color(), kingside) {
                grid[path[1]] = grid[rook].take();
            }
        }
    }

    /// An iterator over the legal [`Move`]s of the side to move.
    pub fn moves(&self) -> impl Iterator<Item = Move> + '_ {
        self.board
            .iter()
            .filter(|(p, _)| p.color() == self.turn)
            .flat_map(|(_, whence)| Square::iter().map(move |whither| Move(whence, whither)))
            .filter(|&m| self.is_legal(m))
    }

    /// Evaluates the [`Status`] for the side to move.
    pub fn status(&self) -> Status {
        match (self.is_check(), self.moves().next().is_some()) {
            (true, false) => Status::Checkmate(self.turn),
            (false, false) => Status::Stalemate,
            (true, true) => Status::Check,
            (false, true) => Status::Active,
        }
    }

    /// Plays a [`Move`] if legal, keeping the turn with the mover.
    pub fn make(&mut self, m: Move) -> Result<MoveRecord, IllegalMove> {
        let flags = self.validate(m)?;
        let (whence, whither) = (m.whence(), m.whither());
        let side = self.turn;

        let piece = self.board[whence].ok_or(IllegalMove::Vacant(whence))?;
        let victim = match flags.contains(MoveFlags::EN_PASSANT) {
            true => Square::new(whence.row(), whither.col()).unwrap_or(whither),
            false => whither,
        };

        let capture = self.board.place(victim, None).map(|p| (p, victim));
        self.board.shift(whence, whither);

        if flags.contains(MoveFlags::PROMOTION) {
            let hidden = self.board.is_invisible(whither);
            self.board.place(whither, Some(Piece(side, Role::Queen)));
            if hidden {
                self.board.conceal(whither);
            }
        }

        if flags.contains(MoveFlags::CASTLE) {
            let kingside = whither.col() > whence.col();
            if let Some((path, rook)) = Self::castling_squares(side, kingside) {
                self.board.shift(rook, path[1]);
            }
        }

        let record = MoveRecord {
            whence,
            whither,
            piece,
            capture,
            flags,
            castles: self.castles,
            en_passant: self.en_passant,
        };

        self.castles.revoke(whence);
        self.castles.revoke(whither);

        self.en_passant = match flags.contains(MoveFlags::DOUBLE_PUSH) {
            true => whence.offset(side.forward(), 0),
            false => None,
        };

        if let Some((p, _)) = capture {
            self.graveyard_mut(p.color()).push(p);
        }

        let magic = self.magic_mut(side);
        if magic.ladder == Some(whence) {
            magic.ladder = None;
        }

        self.history.push(record);
        Ok(record)
    }

    /// Passes the turn to the opponent.
    pub fn pass(&mut self) {
        self.turn = !self.turn;
    }

    /// Plays a [`Move`] if legal and passes the turn.
    pub fn play(&mut self, m: Move) -> Result<MoveRecord, IllegalMove> {
        let record = self.make(m)?;
        self.pass();
        Ok(record)
    }

    /// Captures the piece on a square into its owner's graveyard.
    pub(crate) fn capture(&mut self, sq: Square) -> Option<Piece> {
        let piece = self.lift(sq)?;
        self.graveyard_mut(piece.color()).push(piece);
        Some(piece)
    }

    /// Takes the piece on a square off the board without sending it to the graveyard.
    pub(crate) fn lift(&mut self, sq: Square) -> Option<Piece> {
        let piece = self.board.place(sq, None)?;
        self.castles.revoke(sq);
        Some(piece)
    }

    /// Counts down one full round: thaws frozen squares and brings back temporary captures.
    ///
    /// A returning piece captures an opponent on its origin, but waits while the origin
    /// is blocked or held by a friendly piece or a king.
    pub(crate) fn complete_round(&mut self) -> Vec<Return> {
        self.board.thaw();

        let mut returns = Vec::new();
        let exiles = std::mem::take(self.board.exiles_mut());
        for mut exile in exiles {
            exile.rounds = exile.rounds.saturating_sub(1);
            match exile.rounds {
                0 => match self.bring_back(exile) {
                    Some(r) => returns.push(r),
                    None => self.board.exiles_mut().push(exile),
                },
                _ => self.board.exiles_mut().push(exile),
            }
        }

        returns
    }

    fn bring_back(&mut self, exile: TemporaryCapture) -> Option<Return> {
        let TemporaryCapture { piece, origin, .. } = exile;
        if self.board.is_blocked(origin) {
            return None;
        }

        let occupant = self.board[origin];
        let capture = match occupant {
            None => None,
            Some(p) if p.color() != piece.color() && !p.is_king() => self.capture(origin),
            Some(_) => return None,
        };

        self.board.place(origin, Some(piece));
        Some(Return {
            piece,
            square: origin,
            capture,
        })
    }

    /// Takes back the most recent `plies` moves.
    ///
    /// Fails without changing anything if fewer moves were played or if magic has since
    /// altered any square the moves touched.
    pub fn rewind(&mut self, plies: usize) -> Result<(), Paradox> {
        if self.history.len() < plies {
            return Err(Paradox::Unrecorded);
        }

        let mut next = self.clone();
        for _ in 0..plies {
            next.unmake()?;
        }

        *self = next;
        Ok(())
    }

    fn unmake(&mut self) -> Result<MoveRecord, Paradox> {
        let record = self.history.pop().ok_or(Paradox::Unrecorded)?;
        let MoveRecord {
            whence, whither, ..
        } = record;
        let side = record.piece.color();

        let arrived = match record.is_promotion() {
            true => Piece(side, Role::Queen),
            false => record.piece,
        };

        if self.board[whither] != Some(arrived) {
            return Err(Paradox::Altered(whither));
        } else if self.board.is_occupied(whence) || self.board.is_blocked(whence) {
            return Err(Paradox::Altered(whence));
        }

        if let Some((p, sq)) = record.capture {
            if sq != whither && (self.board.is_occupied(sq) || self.board.is_blocked(sq)) {
                return Err(Paradox::Altered(sq));
            }

            let graveyard = self.graveyard_mut(p.color());
            let i = graveyard.iter().rposition(|&q| q == p);
            graveyard.remove(i.ok_or(Paradox::Altered(sq))?);
        }

        let rook = match record.is_castling() {
            false => None,
            true => Self::castling_squares(side, whither.col() > whence.col()),
        };

        if let Some((path, home)) = rook {
            if self.board[path[1]] != Some(Piece(side, Role::Rook)) {
                return Err(Paradox::Altered(path[1]));
            } else if self.board.is_occupied(home) || self.board.is_blocked(home) {
                return Err(Paradox::Altered(home));
            }

            self.board.shift(path[1], home);
        }

        self.board.shift(whither, whence);

        if record.is_promotion() {
            let hidden = self.board.is_invisible(whence);
            self.board.place(whence, Some(record.piece));
            if hidden {
                self.board.conceal(whence);
            }
        }

        if let Some((p, sq)) = record.capture {
            self.board.place(sq, Some(p));
        }

        self.castles = record.castles;
        self.en_passant = record.en_passant;

        Ok(record)
    }
}

/// Retrieves the [`Piece`] at a given [`Square`], if any.
impl Index<Square> for Position {
    type Output = Option<Piece>;

    #[inline(always)]
    fn index(&self, sq: Square) -> &Self::Output {
        &self.board[sq]
    }
}

#[cfg(test)]
impl proptest::arbitrary::Arbitrary for Position {
    type Parameters = ();
    type Strategy = proptest::strategy::BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        use proptest::{prelude::*, sample::Selector};

        (0..48usize, any::<Selector>())
            .prop_map(|(plies, selector)| {
                let mut pos = Position::default();

                for _ in 0..plies {
                    let moves: Vec<_> = pos.moves().collect();
                    match selector.try_select(moves) {
                        Some(m) if pos.play(m).is_ok() => continue,
                        _ => break,
                    }
                }

                pos
            })
            .boxed()
    }
}
