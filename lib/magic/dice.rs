use derive_more::Display;
use rand::{Rng as _, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

/// Trait for sources of randomness that resolve magic.
#[cfg_attr(test, mockall::automock)]
pub trait Dice {
    /// Rolls a fair twenty-sided die, returning a value in `1..=20`.
    fn roll(&mut self) -> u8;

    /// Flips a fair coin.
    fn flip(&mut self) -> bool;
}

/// A seedable [`Dice`] backed by a [PCG] generator.
///
/// [PCG]: https://www.pcg-random.org
#[derive(Debug, Clone)]
pub struct Rng(Pcg64);

impl Rng {
    /// Dice that always produce the same sequence for the same seed.
    pub fn seeded(seed: u64) -> Self {
        Rng(Pcg64::seed_from_u64(seed))
    }
}

impl Default for Rng {
    fn default() -> Self {
        Rng(Pcg64::from_entropy())
    }
}

impl Dice for Rng {
    fn roll(&mut self) -> u8 {
        self.0.gen_range(1..=20)
    }

    fn flip(&mut self) -> bool {
        self.0.gen()
    }
}

/// The value rolled for a turn.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[display("{value}")]
pub struct Roll {
    /// The value effects are gated on.
    pub value: u8,
    /// Both dice, if the roll was taken with advantage.
    pub advantage: Option<[u8; 2]>,
}

impl Roll {
    /// Rolls once, or twice keeping the highest while rage charges remain.
    ///
    /// Rolling with advantage consumes exactly one charge.
    pub fn new<D: Dice + ?Sized>(dice: &mut D, rage: &mut u8) -> Self {
        match rage.checked_sub(1) {
            None => Roll {
                value: dice.roll(),
                advantage: None,
            },

            Some(r) => {
                *rage = r;
                let dice = [dice.roll(), dice.roll()];
                Roll {
                    value: dice[0].max(dice[1]),
                    advantage: Some(dice),
                }
            }
        }
    }

    /// Whether this roll meets a gate.
    #[inline(always)]
    pub fn meets(&self, gate: u8) -> bool {
        self.value >= gate
    }
}
