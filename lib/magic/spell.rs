use crate::chess::{Role, Square};
use crate::magic::{Direction, Misfire, ParseEffectError, Report, Scene, Target};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// A spell, cast by the king unless a magic wand is active.
#[derive(
    Debug, Display, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(rename_all = "snake_case")]
pub enum Spell {
    #[display("thunder")]
    Thunder,
    #[display("rage")]
    Rage,
    #[display("freeze")]
    Freeze,
    #[display("necromancy")]
    Necromancy,
    #[display("agility")]
    Agility,
    #[display("fireball")]
    Fireball,
    #[display("queens_soul")]
    QueensSoul,
}

impl Spell {
    /// All spells in the catalog.
    pub fn iter() -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator {
        use Spell::*;
        [Thunder, Rage, Freeze, Necromancy, Agility, Fireball, QueensSoul].into_iter()
    }

    pub(crate) fn apply(&self, target: Target, scene: &mut Scene<'_>) -> Result<Report, Misfire> {
        match (self, target) {
            (Spell::Thunder, Target::Direction(dir)) => {
                let caster = scene.caster();
                let king = scene.pos.board().king(caster);
                let origin = king.ok_or(Misfire::Mismatch(target))?;
                thunder(scene, origin, dir)
            }

            (Spell::Thunder, Target::Ray(origin, dir)) => {
                let caster = scene.ally(origin)?;
                if !caster.is_king() && !scene.pos.magic(scene.caster()).wand {
                    return Err(Misfire::Powerless(origin));
                }

                thunder(scene, origin, dir)
            }

            (Spell::Rage, Target::None) => {
                let charges = scene.config.rage_charges;
                let side = scene.caster();
                let magic = scene.pos.magic_mut(side);
                magic.rage = magic.rage.max(charges);
                Ok(Report::Enraged(magic.rage))
            }

            (Spell::Freeze, Target::Square(corner)) => {
                let block = [(0, 0), (0, 1), (1, 0), (1, 1)]
                    .map(|(dr, dc)| corner.offset(dr, dc).ok_or(Misfire::OutOfReach(corner)));

                let block = [block[0]?, block[1]?, block[2]?, block[3]?];
                let rounds = scene.config.freeze_rounds;
                for sq in block {
                    scene.pos.board_mut().freeze(sq, rounds);
                }

                debug!(%corner, rounds, "froze block");
                Ok(Report::Frozen(block))
            }

            (Spell::Necromancy, Target::Square(sq)) => {
                let side = scene.caster();
                let piece = *scene
                    .pos
                    .graveyard(side)
                    .last()
                    .ok_or(Misfire::EmptyGraveyard)?;

                scene.vacancy(sq)?;
                if piece.role() == Role::Pawn && matches!(sq.row(), 0 | 7) {
                    return Err(Misfire::OutOfReach(sq));
                }

                scene.pos.graveyard_mut(side).pop();
                scene.pos.board_mut().place(sq, Some(piece));
                debug!(%piece, %sq, "revived piece");
                Ok(Report::Revived(piece, sq))
            }

            (Spell::Agility, Target::None) => {
                let side = scene.caster();
                scene.pos.magic_mut(side).extra_move = true;
                Ok(Report::Hastened)
            }

            (Spell::Fireball, Target::Square(center)) => {
                scene.victim(center)?;
                let side = scene.caster();
                let area: Vec<Square> = std::iter::once(center).chain(center.neighbors()).collect();

                let mut burned = Vec::new();
                for sq in area {
                    let occupant = scene.pos[sq];
                    match occupant {
                        Some(p) if p.color() != side && !p.is_king() => {
                            scene.pos.capture(sq);
                            burned.push((p, sq));
                        }

                        _ => {}
                    }
                }

                debug!(%center, burned = burned.len(), "fireball exploded");
                Ok(Report::Burned(burned))
            }

            (Spell::QueensSoul, Target::None) => {
                let side = scene.caster();
                scene.pos.magic_mut(side).queen_soul = true;
                Ok(Report::Empowered)
            }

            (_, target) => Err(Misfire::Mismatch(target)),
        }
    }
}

/// Casts a bolt from `origin` that strikes the first piece in its way.
fn thunder(scene: &mut Scene<'_>, origin: Square, dir: Direction) -> Result<Report, Misfire> {
    let side = scene.caster();

    for sq in dir.ray(origin) {
        if scene.pos.board().is_blocked(sq) {
            return Ok(Report::Deflected(sq));
        }

        let occupant = scene.pos[sq];
        match occupant {
            None => continue,
            Some(p) if p.color() == side || p.is_king() => return Ok(Report::Deflected(sq)),
            Some(p) => {
                scene.pos.capture(sq);
                debug!(piece = %p, %sq, "thunder struck");
                return Ok(Report::Struck(p, sq));
            }
        }
    }

    Ok(Report::Dissipated)
}

impl FromStr for Spell {
    type Err = ParseEffectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Spell::iter()
            .find(|spell| spell.to_string() == s)
            .ok_or(ParseEffectError)
    }
}
