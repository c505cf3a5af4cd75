use crate::chess::{Color, Move, MoveRecord, Position, Status};
use crate::magic::{Dice, Effect, Item, Report, Rng, Roll, Scene, Spell, Target};
use tracing::{debug, info, instrument};

mod config;
mod error;
mod perception;
mod snapshot;
mod turn;

pub use config::*;
pub use error::*;
pub use perception::*;
pub use snapshot::*;
pub use turn::*;

/// A game of chess with magic, driven one command at a time.
///
/// Every command either succeeds in full or fails leaving the game untouched.
pub struct Game<D: Dice = Rng> {
    config: Config,
    dice: D,
    perception: Box<dyn Perception>,
    pos: Position,
    status: Status,
    turn: TurnRecord,
}

impl Default for Game<Rng> {
    fn default() -> Self {
        Self::new(Config::default(), Rng::default())
    }
}

impl<D: Dice> Game<D> {
    /// Starts a game from the initial position.
    pub fn new(config: Config, dice: D) -> Self {
        Game {
            config,
            dice,
            perception: Box::new(Clairvoyance),
            pos: Position::default(),
            status: Status::Active,
            turn: TurnRecord::default(),
        }
    }

    /// Resumes a game from a [`Snapshot`].
    pub fn resume(config: Config, dice: D, snapshot: Snapshot) -> Self {
        Game {
            pos: snapshot.position,
            status: snapshot.status,
            turn: snapshot.turn,
            ..Self::new(config, dice)
        }
    }

    /// Replaces the hook consulted before invisible pieces are captured.
    pub fn with_perception<P: Perception + 'static>(mut self, perception: P) -> Self {
        self.perception = Box::new(perception);
        self
    }

    /// The game configuration.
    #[inline(always)]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The current position.
    #[inline(always)]
    pub fn position(&self) -> &Position {
        &self.pos
    }

    /// The current [`Status`].
    #[inline(always)]
    pub fn status(&self) -> Status {
        self.status
    }

    /// The turn in progress.
    #[inline(always)]
    pub fn turn(&self) -> &TurnRecord {
        &self.turn
    }

    /// A copy of the full game state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            position: self.pos.clone(),
            status: self.status,
            turn: self.turn.clone(),
        }
    }

    /// Plays a move for the player to move.
    ///
    /// The turn passes to the opponent, unless an extra move was granted
    /// and this move does not give check.
    #[instrument(level = "trace", skip(self), err)]
    pub fn attempt_move(&mut self, m: Move) -> Result<MoveRecord, MoveRejected> {
        if self.status.is_terminal() {
            return Err(MoveRejected::GameOver(self.status));
        } else if !self.turn.is_idle() {
            return Err(MoveRejected::OutOfPhase(self.turn.phase));
        }

        let side = self.pos.turn();
        self.pos.validate(m)?;

        let whither = m.whither();
        if self.pos.board().is_invisible(whither)
            && !self.perception.perceives(&self.pos, side, whither)
        {
            return Err(MoveRejected::Unperceived(whither));
        }

        let record = self.pos.make(m)?;
        debug!(player = %side, %m, capture = ?record.capture, "played move");

        let check = match self.pos.board().king(!side) {
            Some(k) => self.pos.is_square_attacked(k, !side),
            None => false,
        };

        let magic = self.pos.magic_mut(side);
        if magic.extra_move && !check {
            magic.extra_move = false;
            self.turn.phase = Phase::AwaitingAction;
            self.status = self.pos.status();
            debug!(player = %side, "extra move granted");
        } else {
            self.pass_turn();
        }

        Ok(record)
    }

    /// Selects a [`Spell`] to cast.
    pub fn select_spell(&mut self, spell: Spell) -> Result<(), EffectRejected> {
        self.select(spell.into())
    }

    /// Selects an [`Item`] to use.
    pub fn select_item(&mut self, item: Item) -> Result<(), EffectRejected> {
        self.select(item.into())
    }

    /// Selects an [`Effect`], which then awaits resolution.
    #[instrument(level = "trace", skip(self), err)]
    pub fn select(&mut self, effect: Effect) -> Result<(), EffectRejected> {
        if self.status.is_terminal() {
            return Err(EffectRejected::GameOver(self.status));
        } else if !self.turn.is_idle() {
            return Err(EffectRejected::OutOfPhase(self.turn.phase));
        } else if self.turn.has_rolled() && self.config.needs_roll(effect) {
            return Err(EffectRejected::AlreadyRolled);
        } else if self.turn.used(effect) >= self.cap(effect) {
            return Err(EffectRejected::LimitExceeded(effect));
        }

        self.turn.selection = Some(effect);
        self.turn.phase = Phase::AwaitingRoll;
        Ok(())
    }

    /// Cancels the pending selection, if any.
    ///
    /// A roll already taken stays spent.
    pub fn deselect(&mut self) -> Option<Effect> {
        let effect = self.turn.selection.take()?;
        self.turn.phase = Phase::AwaitingAction;
        Some(effect)
    }

    /// Rolls the dice for the pending selection, at most once per turn.
    #[instrument(level = "trace", skip(self), err)]
    pub fn roll_dice(&mut self) -> Result<Roll, RollRejected> {
        if self.status.is_terminal() {
            return Err(RollRejected::GameOver(self.status));
        } else if self.turn.has_rolled() {
            return Err(RollRejected::AlreadyRolled);
        } else if self.turn.selection.is_none() {
            return Err(RollRejected::NothingSelected);
        }

        let side = self.pos.turn();
        let roll = Roll::new(&mut self.dice, &mut self.pos.magic_mut(side).rage);
        debug!(player = %side, %roll, advantage = ?roll.advantage, "rolled dice");

        self.turn.roll = Some(roll);
        Ok(roll)
    }

    /// Resolves the pending selection against a [`Target`].
    #[instrument(level = "trace", skip(self), err)]
    pub fn resolve(&mut self, target: Target) -> Result<Report, EffectRejected> {
        if self.status.is_terminal() {
            return Err(EffectRejected::GameOver(self.status));
        }

        let effect = self.turn.selection.ok_or(EffectRejected::NothingSelected)?;
        if self.turn.used(effect) >= self.cap(effect) {
            return Err(EffectRejected::LimitExceeded(effect));
        }

        if self.config.needs_roll(effect) {
            let roll = self.turn.roll.ok_or(EffectRejected::Unrolled(effect))?;
            match self.config.gate(effect) {
                Some(gate) if !roll.meets(gate) => {
                    return Err(EffectRejected::RollTooLow {
                        effect,
                        roll: roll.value,
                        gate,
                    })
                }

                _ => {}
            }
        }

        let mut pos = self.pos.clone();
        let mut scene = Scene {
            pos: &mut pos,
            dice: &mut self.dice,
            perception: &mut *self.perception,
            config: &self.config,
        };

        let report = effect.apply(target, &mut scene)?;
        let side = pos.turn();
        self.pos = pos;

        self.turn.count(effect);
        self.turn.selection = None;
        self.turn.phase = Phase::Resolved;

        if let Effect::Spell(_) = effect {
            self.pos.magic_mut(side).wand = false;
        }

        if report == Report::Replenished {
            self.turn.spells_used = self.turn.spells_used.saturating_sub(1);
        }

        debug!(player = %side, %effect, %target, %report, "resolved effect");

        if report.ends_turn() {
            self.pass_turn();
        } else {
            self.status = self.pos.status();
            if self.status.is_terminal() {
                info!(status = %self.status, "game over");
            }
        }

        Ok(report)
    }

    /// Ends the turn by using the Skip item.
    #[instrument(level = "trace", skip(self), err)]
    pub fn end_turn(&mut self) -> Result<Report, EffectRejected> {
        self.select_item(Item::Skip)?;
        match self.resolve(Target::None) {
            Ok(report) => Ok(report),
            Err(e) => {
                self.deselect();
                Err(e)
            }
        }
    }

    /// The player to move resigns.
    #[instrument(level = "trace", skip(self))]
    pub fn forfeit(&mut self) -> Status {
        if !self.status.is_terminal() {
            self.status = Status::Forfeited(self.pos.turn());
            info!(status = %self.status, "game over");
        }

        self.status
    }

    /// Starts over from the initial position.
    pub fn reset(&mut self) {
        self.pos = Position::default();
        self.status = Status::Active;
        self.turn = TurnRecord::default();
        info!("game reset");
    }

    fn cap(&self, effect: Effect) -> u8 {
        match effect {
            Effect::Spell(_) => self.config.spells_per_turn,
            Effect::Item(_) => self.config.items_per_turn,
        }
    }

    fn pass_turn(&mut self) {
        let side = self.pos.turn();
        self.pos.magic_mut(side).end_turn();

        let new_round = side == Color::Black;
        if new_round {
            for r in self.pos.complete_round() {
                debug!(piece = %r.piece, square = %r.square, capture = ?r.capture, "piece returned");
            }
        }

        self.pos.pass();
        self.pos.magic_mut(!side).begin_turn();
        self.turn = self.turn.next(new_round);
        self.status = self.pos.status();

        info!(
            turn = self.turn.number,
            round = self.turn.round,
            player = %self.pos.turn(),
            status = %self.status,
            "turn began"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::{Board, Castles, IllegalMove, Piece, Role, Square};
    use crate::magic::MockDice;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn mv(s: &str) -> Move {
        s.parse().unwrap()
    }

    fn dice(rolls: &[u8]) -> MockDice {
        let mut rolls = rolls.to_vec().into_iter();
        let mut dice = MockDice::new();
        dice.expect_roll().returning(move || rolls.next().unwrap_or(1));
        dice.expect_flip().return_const(true);
        dice
    }

    fn game(rolls: &[u8]) -> Game<MockDice> {
        Game::new(Config::default(), dice(rolls))
    }

    fn arranged(pieces: &[(&str, &str)], rolls: &[u8]) -> Game<MockDice> {
        let mut board = Board::empty();
        for &(s, p) in pieces {
            board.place(sq(s), p.parse().ok());
        }

        let pos = Position::setup(board, Color::White, Castles::all());
        let snapshot = Snapshot {
            status: pos.status(),
            position: pos,
            turn: TurnRecord::default(),
        };

        Game::resume(Config::default(), dice(rolls), snapshot)
    }

    #[test]
    fn moves_alternate_between_players() {
        let mut g = game(&[]);
        g.attempt_move(mv("e2e4")).unwrap();
        assert_eq!(g.position().turn(), Color::Black);
        assert_eq!(
            g.attempt_move(mv("d2d4")),
            Err(IllegalMove::NotOwned(sq("d2")).into())
        );

        g.attempt_move(mv("e7e5")).unwrap();
        assert_eq!(g.turn().number, 3);
        assert_eq!(g.turn().round, 2);
    }

    #[test]
    fn rejected_moves_leave_the_game_untouched() {
        let mut g = game(&[]);
        let before = g.snapshot();
        assert!(g.attempt_move(mv("e2e5")).is_err());
        assert_eq!(g.snapshot(), before);
    }

    #[test]
    fn cannot_move_while_a_selection_is_pending() {
        let mut g = game(&[]);
        g.select_spell(Spell::Rage).unwrap();
        assert_eq!(
            g.attempt_move(mv("e2e4")),
            Err(MoveRejected::OutOfPhase(Phase::AwaitingRoll))
        );

        assert_eq!(g.deselect(), Some(Spell::Rage.into()));
        assert!(g.attempt_move(mv("e2e4")).is_ok());
    }

    #[test]
    fn dice_roll_at_most_once_per_turn() {
        let mut g = game(&[12, 20]);
        assert_eq!(g.roll_dice(), Err(RollRejected::NothingSelected));
        g.select_spell(Spell::Rage).unwrap();
        assert_eq!(g.roll_dice().map(|r| r.value), Ok(12));
        assert_eq!(g.roll_dice(), Err(RollRejected::AlreadyRolled));
    }

    #[test]
    fn spells_need_a_roll() {
        let mut g = game(&[]);
        g.select_spell(Spell::Rage).unwrap();
        assert_eq!(
            g.resolve(Target::None),
            Err(EffectRejected::Unrolled(Spell::Rage.into()))
        );
    }

    #[test]
    fn roll_below_the_gate_changes_nothing() {
        let mut g = game(&[4]);
        g.select_spell(Spell::Rage).unwrap();
        g.roll_dice().unwrap();

        let before = g.snapshot();
        let e = g.resolve(Target::None).unwrap_err();
        assert_eq!(e.kind(), ErrorKind::RollTooLow);
        assert_eq!(g.snapshot(), before);
        assert_eq!(g.turn().spells_used, 0);
    }

    #[test]
    fn resolved_spells_are_counted_and_cleared() {
        let mut g = game(&[5]);
        g.select_spell(Spell::Rage).unwrap();
        g.roll_dice().unwrap();
        assert_eq!(g.resolve(Target::None), Ok(Report::Enraged(2)));
        assert_eq!(g.turn().spells_used, 1);
        assert_eq!(g.turn().selection, None);
        assert_eq!(g.turn().phase, Phase::Resolved);
        assert_eq!(g.position().magic(Color::White).rage, 2);
    }

    #[test]
    fn rolled_effects_cannot_be_selected_after_rolling() {
        let mut g = game(&[5]);
        g.select_spell(Spell::Rage).unwrap();
        g.roll_dice().unwrap();
        g.resolve(Target::None).unwrap();
        assert_eq!(
            g.select_spell(Spell::Agility),
            Err(EffectRejected::AlreadyRolled)
        );

        assert!(g.select_item(Item::MagicWand).is_ok());
    }

    #[test]
    fn items_are_capped_per_turn() {
        let mut g = game(&[]);
        for _ in 0..3 {
            g.select_item(Item::MagicWand).unwrap();
            g.resolve(Target::None).unwrap();
        }

        assert_eq!(
            g.select_item(Item::MagicWand),
            Err(EffectRejected::LimitExceeded(Item::MagicWand.into()))
        );

        g.attempt_move(mv("e2e4")).unwrap();
        assert!(g.select_item(Item::MagicWand).is_ok());
    }

    #[test]
    fn mana_potion_refunds_a_spell() {
        let mut g = game(&[5]);
        g.select_spell(Spell::Rage).unwrap();
        g.roll_dice().unwrap();
        g.resolve(Target::None).unwrap();
        g.select_item(Item::ManaPotion).unwrap();
        assert_eq!(g.resolve(Target::None), Ok(Report::Replenished));
        assert_eq!(g.turn().spells_used, 0);
        assert_eq!(g.turn().items_used, 1);
    }

    #[test]
    fn skipping_passes_the_turn() {
        let mut g = game(&[]);
        assert_eq!(g.end_turn(), Ok(Report::Skipped));
        assert_eq!(g.position().turn(), Color::Black);
        assert_eq!(g.turn().items_used, 0);
    }

    #[test]
    fn rage_is_consumed_one_roll_at_a_time() {
        let mut g = game(&[5, 3, 8, 14, 2]);
        g.select_spell(Spell::Rage).unwrap();
        assert_eq!(g.roll_dice().map(|r| r.value), Ok(5));
        g.resolve(Target::None).unwrap();
        g.attempt_move(mv("e2e4")).unwrap();
        g.end_turn().unwrap();

        g.select_item(Item::Wontan).unwrap();
        let roll = g.roll_dice().unwrap();
        assert_eq!(roll.advantage, Some([3, 8]));
        assert_eq!(roll.value, 8);
        assert_eq!(g.position().magic(Color::White).rage, 1);
    }

    #[test]
    fn agility_grants_a_second_move() {
        let mut g = game(&[11]);
        g.select_spell(Spell::Agility).unwrap();
        g.roll_dice().unwrap();
        g.resolve(Target::None).unwrap();

        g.attempt_move(mv("e2e4")).unwrap();
        assert_eq!(g.position().turn(), Color::White);
        g.attempt_move(mv("d2d4")).unwrap();
        assert_eq!(g.position().turn(), Color::Black);
    }

    #[test]
    fn agility_is_forfeited_by_giving_check() {
        let mut g = arranged(&[("e1", "K"), ("e8", "k"), ("a1", "R")], &[11]);
        g.select_spell(Spell::Agility).unwrap();
        g.roll_dice().unwrap();
        g.resolve(Target::None).unwrap();

        g.attempt_move(mv("a1a8")).unwrap();
        assert_eq!(g.position().turn(), Color::Black);
        assert_eq!(g.status(), Status::Check);
        assert!(!g.position().magic(Color::White).extra_move);
    }

    #[test]
    fn thunder_ends_the_turn_when_it_strikes() {
        let mut g = arranged(&[("e1", "K"), ("e8", "k"), ("e5", "n")], &[10]);
        g.select_spell(Spell::Thunder).unwrap();
        g.roll_dice().unwrap();
        let report = g.resolve(Target::Direction("n".parse().unwrap())).unwrap();
        assert_eq!(report, Report::Struck(Piece(Color::Black, Role::Knight), sq("e5")));
        assert_eq!(g.position().turn(), Color::Black);
    }

    #[test]
    fn magic_wand_is_consumed_by_the_next_spell() {
        let mut g = arranged(&[("e1", "K"), ("e8", "k"), ("a1", "R"), ("a5", "n")], &[10]);
        g.select_item(Item::MagicWand).unwrap();
        g.resolve(Target::None).unwrap();
        g.select_spell(Spell::Thunder).unwrap();
        g.roll_dice().unwrap();
        g.resolve("a1:n".parse().unwrap()).unwrap();
        assert!(!g.position().magic(Color::White).wand);
    }

    #[test]
    fn freeze_thaws_after_full_rounds() {
        let mut g = game(&[10]);
        g.select_spell(Spell::Freeze).unwrap();
        g.roll_dice().unwrap();
        g.resolve(Target::Square(sq("d5"))).unwrap();
        assert!(g.position().board().is_frozen(sq("e4")));

        g.attempt_move(mv("g1f3")).unwrap();
        g.attempt_move(mv("g8f6")).unwrap();
        assert!(g.position().board().is_frozen(sq("e4")));
        g.attempt_move(mv("b1c3")).unwrap();
        g.attempt_move(mv("b8c6")).unwrap();
        assert!(!g.position().board().is_frozen(sq("e4")));
    }

    #[test]
    fn fishing_net_returns_its_catch() {
        let mut g = game(&[]);
        g.select_item(Item::FishingNet).unwrap();
        g.resolve(Target::Square(sq("b8"))).unwrap();
        assert_eq!(g.position()[sq("b8")], None);

        for m in ["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6"] {
            g.attempt_move(mv(m)).unwrap();
        }

        assert_eq!(g.position()[sq("b8")], Some(Piece(Color::Black, Role::Knight)));
        assert!(g.position().board().exiles().is_empty());
    }

    #[test]
    fn invisible_pieces_must_be_perceived_to_be_captured() {
        let mut perception = MockPerception::new();
        perception.expect_perceives().return_const(false);

        let mut g = arranged(&[("e1", "K"), ("e8", "k"), ("d1", "R"), ("d7", "n")], &[])
            .with_perception(perception);

        g.pos.board_mut().conceal(sq("d7"));
        assert_eq!(
            g.attempt_move(mv("d1d7")),
            Err(MoveRejected::Unperceived(sq("d7")))
        );

        assert!(g.attempt_move(mv("d1d6")).is_ok());
    }

    #[test]
    fn forfeiting_ends_the_game() {
        let mut g = game(&[]);
        assert_eq!(g.forfeit(), Status::Forfeited(Color::White));
        assert_eq!(g.status().winner(), Some(Color::Black));
        assert_eq!(
            g.attempt_move(mv("e2e4")),
            Err(MoveRejected::GameOver(Status::Forfeited(Color::White)))
        );

        assert_eq!(
            g.select_item(Item::Skip),
            Err(EffectRejected::GameOver(Status::Forfeited(Color::White)))
        );
    }

    #[test]
    fn reset_starts_over() {
        let mut g = game(&[]);
        g.attempt_move(mv("e2e4")).unwrap();
        g.forfeit();
        g.reset();
        assert_eq!(g.snapshot(), game(&[]).snapshot());
    }
}
