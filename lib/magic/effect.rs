use crate::chess::{Color, Paradox, Piece, Position, Square};
use crate::game::{Config, Perception};
use crate::magic::{Dice, Item, Spell, Target};
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Formatter};
use std::str::FromStr;

/// Either a [`Spell`] or an [`Item`].
#[derive(
    Debug,
    Display,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    From,
)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
pub enum Effect {
    #[display("{_0}")]
    Spell(Spell),
    #[display("{_0}")]
    Item(Item),
}

/// The reason why parsing [`Spell`], [`Item`] or [`Effect`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display("failed to parse magic effect")]
pub struct ParseEffectError;

impl FromStr for Effect {
    type Err = ParseEffectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse()
            .map(Effect::Spell)
            .or_else(|_| s.parse().map(Effect::Item))
    }
}

/// The outcome of a coin flip, whose consequences are negotiated by the players.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(rename_all = "lowercase")]
pub enum Coin {
    #[display("reward")]
    Reward,
    #[display("punishment")]
    Punishment,
}

/// What a resolved effect did.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Report {
    Struck(Piece, Square),
    Deflected(Square),
    Dissipated,
    Enraged(u8),
    Frozen([Square; 4]),
    Revived(Piece, Square),
    Hastened,
    Burned(Vec<(Piece, Square)>),
    Empowered,
    Stabbed(Piece, Square),
    Enchanted,
    Walled(Square),
    Smitten(Piece, Square),
    Laddered(Square),
    Netted(Piece, Square),
    Concealed(Square),
    Rewound,
    Skipped,
    Flipped(Coin),
    Replenished,
}

impl Report {
    /// Whether the caster's turn ends right away.
    pub fn ends_turn(&self) -> bool {
        matches!(self, Report::Struck(..) | Report::Stabbed(..) | Report::Skipped)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Report::Struck(p, sq) => write!(f, "thunder struck `{p}` on `{sq}`"),
            Report::Deflected(sq) => write!(f, "thunder was deflected on `{sq}`"),
            Report::Dissipated => f.write_str("thunder dissipated without hitting anything"),
            Report::Enraged(n) => write!(f, "the next {n} rolls are taken with advantage"),
            Report::Frozen([sq, ..]) => write!(f, "the block at `{sq}` is frozen"),
            Report::Revived(p, sq) => write!(f, "`{p}` rose from the graveyard on `{sq}`"),
            Report::Hastened => f.write_str("one extra move granted"),
            Report::Burned(v) if v.is_empty() => f.write_str("the fireball burned nothing"),
            Report::Burned(v) => {
                f.write_str("the fireball burned")?;
                for (p, sq) in v {
                    write!(f, " `{p}` on `{sq}`")?;
                }

                Ok(())
            }
            Report::Empowered => f.write_str("the king moves like a queen this turn"),
            Report::Stabbed(p, sq) => write!(f, "`{p}` on `{sq}` was stabbed"),
            Report::Enchanted => f.write_str("any piece may cast the next spell"),
            Report::Walled(sq) => write!(f, "a barrier stands on `{sq}`"),
            Report::Smitten(p, sq) => write!(f, "`{p}` on `{sq}` was smitten"),
            Report::Laddered(sq) => write!(f, "the piece on `{sq}` may climb over one piece"),
            Report::Netted(p, sq) => write!(f, "`{p}` on `{sq}` was caught in the net"),
            Report::Concealed(sq) => write!(f, "the piece on `{sq}` turned invisible"),
            Report::Rewound => f.write_str("the last two moves were taken back"),
            Report::Skipped => f.write_str("the turn was skipped"),
            Report::Flipped(c) => write!(f, "the coin landed on {c}"),
            Report::Replenished => f.write_str("one spell refunded"),
        }
    }
}

/// The reason why an effect could not be applied to the chosen target.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Error, From)]
pub enum Misfire {
    #[display("`{_0}` is not a valid target for this effect")]
    Mismatch(#[error(not(source))] Target),

    #[display("there is no piece on `{_0}`")]
    Vacant(#[error(not(source))] Square),

    #[display("the piece on `{_0}` is friendly")]
    Friendly(#[error(not(source))] Square),

    #[display("the piece on `{_0}` belongs to the opponent")]
    Hostile(#[error(not(source))] Square),

    #[display("the piece on `{_0}` is immune")]
    Immune(#[error(not(source))] Square),

    #[display("square `{_0}` is out of reach")]
    OutOfReach(#[error(not(source))] Square),

    #[display("square `{_0}` is occupied")]
    Occupied(#[error(not(source))] Square),

    #[display("square `{_0}` is blocked")]
    Blocked(#[error(not(source))] Square),

    #[display("only the king may cast spells, not the piece on `{_0}`")]
    Powerless(#[error(not(source))] Square),

    #[display("the piece on `{_0}` could not be perceived")]
    Unperceived(#[error(not(source))] Square),

    #[display("the graveyard is empty")]
    EmptyGraveyard,

    #[display("{_0}")]
    #[from]
    Paradox(Paradox),
}

/// Everything an effect may read or mutate while resolving.
pub struct Scene<'a> {
    pub pos: &'a mut Position,
    pub dice: &'a mut dyn Dice,
    pub perception: &'a mut dyn Perception,
    pub config: &'a Config,
}

impl Scene<'_> {
    /// The player resolving the effect.
    #[inline(always)]
    pub fn caster(&self) -> Color {
        self.pos.turn()
    }

    /// The friendly piece on a square.
    pub fn ally(&self, sq: Square) -> Result<Piece, Misfire> {
        match self.pos[sq] {
            None => Err(Misfire::Vacant(sq)),
            Some(p) if p.color() != self.caster() => Err(Misfire::Hostile(sq)),
            Some(p) => Ok(p),
        }
    }

    /// The enemy piece on a square chosen for capture.
    ///
    /// Kings are immune and invisible pieces must be perceived.
    pub fn victim(&mut self, sq: Square) -> Result<Piece, Misfire> {
        match self.pos[sq] {
            None => Err(Misfire::Vacant(sq)),
            Some(p) if p.color() == self.caster() => Err(Misfire::Friendly(sq)),
            Some(p) if p.is_king() => Err(Misfire::Immune(sq)),
            Some(p) => {
                self.perceive(sq)?;
                Ok(p)
            }
        }
    }

    /// Consults the perception hook if the piece on a square is invisible.
    pub fn perceive(&mut self, sq: Square) -> Result<(), Misfire> {
        let caster = self.caster();
        if self.pos.board().is_invisible(sq) && !self.perception.perceives(self.pos, caster, sq) {
            Err(Misfire::Unperceived(sq))
        } else {
            Ok(())
        }
    }

    /// An empty square that accepts new pieces or markers.
    pub fn vacancy(&self, sq: Square) -> Result<Square, Misfire> {
        if self.pos.board().is_blocked(sq) {
            Err(Misfire::Blocked(sq))
        } else if self.pos.board().is_occupied(sq) {
            Err(Misfire::Occupied(sq))
        } else {
            Ok(sq)
        }
    }
}

impl Effect {
    /// The minimum roll this effect requires, if any.
    pub fn gate(&self, config: &Config) -> Option<u8> {
        config.gate(*self)
    }

    /// Applies this effect to a target.
    ///
    /// On error the scene may have been partially mutated, callers resolve on a copy.
    pub fn apply(&self, target: Target, scene: &mut Scene<'_>) -> Result<Report, Misfire> {
        match self {
            Effect::Spell(s) => s.apply(target, scene),
            Effect::Item(i) => i.apply(target, scene),
        }
    }
}
