use crate::magic::{Effect, Roll};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Where a turn stands.
#[derive(Debug, Display, Default, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// The player may move, or select a spell or an item.
    #[default]
    #[display("awaiting action")]
    AwaitingAction,

    /// A spell or an item is selected and waits to be resolved.
    #[display("awaiting roll")]
    AwaitingRoll,

    /// The last selection resolved, the player may act again.
    #[display("resolved")]
    Resolved,
}

/// The state of the turn in progress.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Turns played so far, counting this one.
    pub number: u32,
    /// Full rounds started so far, counting this one.
    pub round: u32,
    pub phase: Phase,
    /// The spell or item awaiting resolution.
    pub selection: Option<Effect>,
    /// This turn's single roll, once taken.
    pub roll: Option<Roll>,
    pub spells_used: u8,
    pub items_used: u8,
}

impl Default for TurnRecord {
    fn default() -> Self {
        TurnRecord {
            number: 1,
            round: 1,
            phase: Phase::AwaitingAction,
            selection: None,
            roll: None,
            spells_used: 0,
            items_used: 0,
        }
    }
}

impl TurnRecord {
    /// The record of the following turn, which may start a new round.
    pub fn next(&self, new_round: bool) -> Self {
        TurnRecord {
            number: self.number + 1,
            round: self.round + new_round as u32,
            ..TurnRecord::default()
        }
    }

    /// Whether the dice were already rolled this turn.
    #[inline(always)]
    pub fn has_rolled(&self) -> bool {
        self.roll.is_some()
    }

    /// Whether the player may move or select an effect.
    #[inline(always)]
    pub fn is_idle(&self) -> bool {
        self.phase != Phase::AwaitingRoll
    }

    /// How many times an effect of the same kind was used this turn.
    pub fn used(&self, effect: Effect) -> u8 {
        match effect {
            Effect::Spell(_) => self.spells_used,
            Effect::Item(_) => self.items_used,
        }
    }

    /// Counts one more use of an effect.
    pub fn count(&mut self, effect: Effect) {
        match effect {
            Effect::Spell(_) => self.spells_used += 1,
            Effect::Item(_) => self.items_used += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::magic::{Item, Spell};
    use test_strategy::proptest;

    #[test]
    fn game_starts_on_the_first_turn_of_the_first_round() {
        let turn = TurnRecord::default();
        assert_eq!((turn.number, turn.round), (1, 1));
        assert_eq!(turn.phase, Phase::AwaitingAction);
        assert!(!turn.has_rolled());
    }

    #[proptest]
    fn next_turn_resets_everything_but_the_counters(
        #[strategy(1u32..1000)] number: u32,
        #[strategy(1u32..1000)] round: u32,
        new_round: bool,
        phase: Phase,
        e: crate::magic::Effect,
    ) {
        let turn = TurnRecord {
            number,
            round,
            phase,
            selection: Some(e),
            roll: None,
            spells_used: 2,
            items_used: 1,
        };

        let next = turn.next(new_round);
        assert_eq!(next.number, number + 1);
        assert_eq!(next.round, round + new_round as u32);
        assert_eq!(next.phase, Phase::AwaitingAction);
        assert_eq!(next.selection, None);
        assert_eq!((next.spells_used, next.items_used), (0, 0));
    }

    #[test]
    fn spells_and_items_are_counted_independently() {
        let mut turn = TurnRecord::default();
        turn.count(Spell::Rage.into());
        turn.count(Item::Skip.into());
        turn.count(Item::Knife.into());
        assert_eq!(turn.used(Spell::Fireball.into()), 1);
        assert_eq!(turn.used(Item::Barrier.into()), 2);
    }

    #[proptest]
    fn only_a_pending_selection_blocks_other_actions(phase: Phase) {
        let turn = TurnRecord {
            phase,
            ..TurnRecord::default()
        };

        assert_eq!(turn.is_idle(), phase != Phase::AwaitingRoll);
    }
}
