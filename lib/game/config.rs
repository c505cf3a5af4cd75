use crate::magic::{Effect, Item, Spell};
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fmt, str::FromStr};

/// Tunable catalog data.
///
/// Parses from and prints to [RON], every field may be omitted.
///
/// [RON]: https://github.com/ron-rs/ron
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// How many spells a player may cast per turn.
    pub spells_per_turn: u8,

    /// How many items a player may use per turn.
    pub items_per_turn: u8,

    /// How many advantage rolls Rage grants.
    pub rage_charges: u8,

    /// For how many full rounds Freeze lasts.
    pub freeze_rounds: u8,

    /// For how many full rounds the Fishing Net keeps its catch.
    pub net_rounds: u8,

    /// The minimum roll of each spell, absent spells accept any roll.
    pub spell_gates: BTreeMap<Spell, u8>,

    /// The minimum roll of each item, absent items need no roll.
    pub item_gates: BTreeMap<Item, u8>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            spells_per_turn: 3,
            items_per_turn: 3,
            rage_charges: 2,
            freeze_rounds: 2,
            net_rounds: 3,
            spell_gates: BTreeMap::from([
                (Spell::Thunder, 10),
                (Spell::Rage, 5),
                (Spell::Freeze, 10),
                (Spell::Necromancy, 15),
                (Spell::Agility, 11),
                (Spell::Fireball, 15),
                (Spell::QueensSoul, 17),
            ]),
            item_gates: BTreeMap::from([(Item::Wontan, 17), (Item::InvisibilityPotion, 13)]),
        }
    }
}

impl Config {
    /// The minimum roll of an effect, if it has one.
    pub fn gate(&self, effect: Effect) -> Option<u8> {
        match effect {
            Effect::Spell(s) => self.spell_gates.get(&s).copied(),
            Effect::Item(i) => self.item_gates.get(&i).copied(),
        }
    }

    /// Whether resolving an effect consults the turn's roll.
    pub fn needs_roll(&self, effect: Effect) -> bool {
        matches!(effect, Effect::Spell(_)) || self.gate(effect).is_some()
    }
}

/// The reason why parsing [`Config`] failed.
#[derive(Debug, Display, Eq, PartialEq, Error, From)]
#[display("failed to parse game configuration")]
pub struct ParseConfigError(ron::de::SpannedError);

impl FromStr for Config {
    type Err = ParseConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ron::de::from_str(s)?)
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&ron::ser::to_string(self).map_err(|_| fmt::Error)?)
    }
}
