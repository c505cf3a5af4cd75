use crate::chess::{Role, TemporaryCapture};
use crate::magic::{Coin, Misfire, ParseEffectError, Report, Scene, Target};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// A consumable item, used by any piece.
#[derive(
    Debug, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(rename_all = "snake_case")]
pub enum Item {
    #[display("knife")]
    Knife,
    #[display("magic_wand")]
    MagicWand,
    #[display("barrier")]
    Barrier,
    #[display("wontan")]
    Wontan,
    #[display("ladder")]
    Ladder,
    #[display("fishing_net")]
    FishingNet,
    #[display("invisibility_potion")]
    InvisibilityPotion,
    #[display("time_machine")]
    TimeMachine,
    #[display("skip")]
    Skip,
    #[display("lucky_coin")]
    LuckyCoin,
    #[display("mana_potion")]
    ManaPotion,
}

impl Item {
    /// All items in the catalog.
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        use Item::*;
        [
            Knife,
            MagicWand,
            Barrier,
            Wontan,
            Ladder,
            FishingNet,
            InvisibilityPotion,
            TimeMachine,
            Skip,
            LuckyCoin,
            ManaPotion,
        ]
        .into_iter()
    }

    pub(crate) fn apply(&self, target: Target, scene: &mut Scene<'_>) -> Result<Report, Misfire> {
        match (self, target) {
            (Item::Knife, Target::Pair(actor, sq)) => {
                scene.ally(actor)?;
                if scene.pos.board().is_frozen(actor) {
                    return Err(Misfire::Blocked(actor));
                } else if !actor.is_adjacent(sq) {
                    return Err(Misfire::OutOfReach(sq));
                }

                let occupant = scene.pos[sq];
                let piece = match occupant {
                    None => return Err(Misfire::Vacant(sq)),
                    Some(p) if p.is_king() => return Err(Misfire::Immune(sq)),
                    Some(p) if p.color() == scene.caster() => p,
                    Some(_) => scene.victim(sq)?,
                };

                scene.pos.capture(sq);
                debug!(%piece, %sq, "stabbed piece");
                Ok(Report::Stabbed(piece, sq))
            }

            (Item::MagicWand, Target::None) => {
                let side = scene.caster();
                scene.pos.magic_mut(side).wand = true;
                Ok(Report::Enchanted)
            }

            (Item::Barrier, Target::Square(sq)) => {
                scene.vacancy(sq)?;
                scene.pos.board_mut().raise_barrier(sq);
                debug!(%sq, "raised barrier");
                Ok(Report::Walled(sq))
            }

            (Item::Wontan, Target::Square(sq)) => {
                let piece = scene.victim(sq)?;
                if piece.role() == Role::Queen {
                    return Err(Misfire::Immune(sq));
                }

                scene.pos.capture(sq);
                debug!(%piece, %sq, "smote piece");
                Ok(Report::Smitten(piece, sq))
            }

            (Item::Ladder, Target::Square(sq)) => {
                scene.ally(sq)?;
                let side = scene.caster();
                scene.pos.magic_mut(side).ladder = Some(sq);
                Ok(Report::Laddered(sq))
            }

            (Item::FishingNet, Target::Square(sq)) => {
                let piece = scene.victim(sq)?;
                let rounds = scene.config.net_rounds;
                scene.pos.lift(sq);
                scene.pos.board_mut().exiles_mut().push(TemporaryCapture {
                    piece,
                    origin: sq,
                    rounds,
                });

                debug!(%piece, %sq, rounds, "netted piece");
                Ok(Report::Netted(piece, sq))
            }

            (Item::InvisibilityPotion, Target::Square(sq)) => {
                scene.ally(sq)?;
                scene.pos.board_mut().conceal(sq);
                Ok(Report::Concealed(sq))
            }

            (Item::TimeMachine, Target::None) => {
                scene.pos.rewind(2)?;
                debug!("rewound two plies");
                Ok(Report::Rewound)
            }

            (Item::Skip, Target::None) => Ok(Report::Skipped),

            (Item::LuckyCoin, Target::None) => match scene.dice.flip() {
                true => Ok(Report::Flipped(Coin::Reward)),
                false => Ok(Report::Flipped(Coin::Punishment)),
            },

            (Item::ManaPotion, Target::None) => Ok(Report::Replenished),

            (_, target) => Err(Misfire::Mismatch(target)),
        }
    }
}

impl FromStr for Item {
    type Err = ParseEffectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Item::iter()
            .find(|item| item.to_string() == s)
            .ok_or(ParseEffectError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::{Board, Castles, Color, Move, Paradox, Piece, Position, Square};
    use crate::game::{Config, MockPerception};
    use crate::magic::MockDice;
    use test_strategy::proptest;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn position(pieces: &[(&str, &str)]) -> Position {
        let mut board = Board::empty();
        for &(s, p) in pieces {
            board.place(sq(s), p.parse().ok());
        }

        Position::setup(board, Color::White, Castles::empty())
    }

    fn use_with(
        pos: &mut Position,
        item: Item,
        target: &str,
        dice: &mut MockDice,
        perceives: bool,
    ) -> Result<Report, Misfire> {
        let mut perception = MockPerception::new();
        perception.expect_perceives().return_const(perceives);

        let mut scene = Scene {
            pos,
            dice,
            perception: &mut perception,
            config: &Config::default(),
        };

        item.apply(target.parse().unwrap(), &mut scene)
    }

    fn use_item(pos: &mut Position, item: Item, target: &str) -> Result<Report, Misfire> {
        use_with(pos, item, target, &mut MockDice::new(), true)
    }

    #[proptest]
    fn parsing_printed_item_is_an_identity(i: Item) {
        assert_eq!(i.to_string().parse(), Ok(i));
    }

    #[test]
    fn knife_captures_an_adjacent_piece_of_either_side() {
        let mut pos = position(&[("e1", "K"), ("e8", "k"), ("d4", "N"), ("d5", "p"), ("c3", "P")]);
        assert_eq!(
            use_item(&mut pos, Item::Knife, "d4>d5"),
            Ok(Report::Stabbed(Piece(Color::Black, Role::Pawn), sq("d5")))
        );

        assert_eq!(
            use_item(&mut pos, Item::Knife, "d4>c3"),
            Ok(Report::Stabbed(Piece(Color::White, Role::Pawn), sq("c3")))
        );

        assert_eq!(pos.graveyard(Color::White).len(), 1);
        assert_eq!(pos.graveyard(Color::Black).len(), 1);
    }

    #[test]
    fn knife_cannot_reach_far_pieces_nor_kings() {
        let mut pos = position(&[("e1", "K"), ("e8", "k"), ("e7", "N"), ("a1", "p")]);
        assert_eq!(
            use_item(&mut pos, Item::Knife, "e7>e8"),
            Err(Misfire::Immune(sq("e8")))
        );

        assert_eq!(
            use_item(&mut pos, Item::Knife, "e7>a1"),
            Err(Misfire::OutOfReach(sq("a1")))
        );

        assert_eq!(
            use_item(&mut pos, Item::Knife, "a1>b1"),
            Err(Misfire::Hostile(sq("a1")))
        );
    }

    #[test]
    fn barrier_requires_an_empty_unblocked_square() {
        let mut pos = position(&[("e1", "K"), ("e8", "k")]);
        assert_eq!(use_item(&mut pos, Item::Barrier, "d4"), Ok(Report::Walled(sq("d4"))));
        assert_eq!(
            use_item(&mut pos, Item::Barrier, "d4"),
            Err(Misfire::Blocked(sq("d4")))
        );

        assert_eq!(
            use_item(&mut pos, Item::Barrier, "e1"),
            Err(Misfire::Occupied(sq("e1")))
        );
    }

    #[test]
    fn wontan_spares_kings_and_queens() {
        let mut pos = position(&[("e1", "K"), ("e8", "k"), ("d8", "q"), ("a8", "r")]);
        assert_eq!(
            use_item(&mut pos, Item::Wontan, "d8"),
            Err(Misfire::Immune(sq("d8")))
        );

        assert_eq!(
            use_item(&mut pos, Item::Wontan, "e8"),
            Err(Misfire::Immune(sq("e8")))
        );

        assert_eq!(
            use_item(&mut pos, Item::Wontan, "a8"),
            Ok(Report::Smitten(Piece(Color::Black, Role::Rook), sq("a8")))
        );
    }

    #[test]
    fn fishing_net_exiles_a_piece_temporarily() {
        let mut pos = position(&[("e1", "K"), ("e8", "k"), ("d5", "b")]);
        let bishop = Piece(Color::Black, Role::Bishop);
        assert_eq!(
            use_item(&mut pos, Item::FishingNet, "d5"),
            Ok(Report::Netted(bishop, sq("d5")))
        );

        assert_eq!(pos[sq("d5")], None);
        assert!(pos.graveyard(Color::Black).is_empty());
        assert_eq!(
            pos.board().exiles(),
            &[TemporaryCapture {
                piece: bishop,
                origin: sq("d5"),
                rounds: 3
            }]
        );
    }

    #[test]
    fn invisible_pieces_must_be_perceived_to_be_targeted() {
        let mut pos = position(&[("e1", "K"), ("e8", "k"), ("d5", "b")]);
        pos.board_mut().conceal(sq("d5"));

        assert_eq!(
            use_with(&mut pos, Item::Wontan, "d5", &mut MockDice::new(), false),
            Err(Misfire::Unperceived(sq("d5")))
        );

        assert!(use_with(&mut pos, Item::Wontan, "d5", &mut MockDice::new(), true).is_ok());
    }

    #[test]
    fn potions_ladders_and_wands_only_affect_own_pieces() {
        let mut pos = position(&[("e1", "K"), ("e8", "k"), ("d2", "P")]);
        assert_eq!(
            use_item(&mut pos, Item::InvisibilityPotion, "e8"),
            Err(Misfire::Hostile(sq("e8")))
        );

        assert_eq!(
            use_item(&mut pos, Item::Ladder, "d3"),
            Err(Misfire::Vacant(sq("d3")))
        );

        use_item(&mut pos, Item::InvisibilityPotion, "d2").unwrap();
        use_item(&mut pos, Item::Ladder, "d2").unwrap();
        use_item(&mut pos, Item::MagicWand, "-").unwrap();

        assert!(pos.board().is_invisible(sq("d2")));
        assert_eq!(pos.magic(Color::White).ladder, Some(sq("d2")));
        assert!(pos.magic(Color::White).wand);
    }

    #[test]
    fn time_machine_takes_back_two_plies() {
        let mut pos = Position::default();
        pos.play(Move(sq("e2"), sq("e4"))).unwrap();
        pos.play(Move(sq("d7"), sq("d5"))).unwrap();
        pos.play(Move(sq("e4"), sq("d5"))).unwrap();
        pos.play(Move(sq("d8"), sq("d5"))).unwrap();

        let Ok(Report::Rewound) = use_item(&mut pos, Item::TimeMachine, "-") else {
            panic!("time machine failed");
        };

        assert_eq!(pos.history().len(), 2);
        assert_eq!(pos[sq("d5")], Some(Piece(Color::Black, Role::Pawn)));
        assert_eq!(pos[sq("e4")], Some(Piece(Color::White, Role::Pawn)));
        assert_eq!(pos[sq("d8")], Some(Piece(Color::Black, Role::Queen)));
        assert!(pos.graveyard(Color::Black).is_empty());
    }

    #[test]
    fn time_machine_requires_two_recorded_plies() {
        let mut pos = Position::default();
        assert_eq!(
            use_item(&mut pos, Item::TimeMachine, "-"),
            Err(Misfire::Paradox(Paradox::Unrecorded))
        );
    }

    #[test]
    fn lucky_coin_flips_the_dice() {
        let mut pos = position(&[("e1", "K"), ("e8", "k")]);
        let mut dice = MockDice::new();
        dice.expect_flip().times(1).return_const(false);

        assert_eq!(
            use_with(&mut pos, Item::LuckyCoin, "-", &mut dice, true),
            Ok(Report::Flipped(Coin::Punishment))
        );
    }
}
