use crate::chess::{IllegalMove, Paradox, Square, Status};
use crate::game::Phase;
use crate::magic::{Effect, Misfire};
use derive_more::{Display, Error, From};

/// The broad category of a rejected command.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    #[display("illegal move")]
    IllegalMove,
    #[display("blocked")]
    Blocked,
    #[display("out of phase")]
    OutOfPhase,
    #[display("roll too low")]
    RollTooLow,
    #[display("limit exceeded")]
    LimitExceeded,
    #[display("invalid target")]
    InvalidTarget,
    #[display("empty resource")]
    EmptyResource,
    #[display("game over")]
    GameOver,
}

/// The reason why a move was rejected.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Error, From)]
pub enum MoveRejected {
    #[display("{_0}")]
    #[from]
    Illegal(IllegalMove),

    #[display("cannot move while {_0}")]
    OutOfPhase(#[error(not(source))] Phase),

    #[display("the game is over, {_0}")]
    GameOver(#[error(not(source))] Status),

    #[display("the piece on `{_0}` could not be perceived")]
    Unperceived(#[error(not(source))] Square),
}

impl MoveRejected {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MoveRejected::Illegal(IllegalMove::Blocked(_)) => ErrorKind::Blocked,
            MoveRejected::Illegal(_) => ErrorKind::IllegalMove,
            MoveRejected::OutOfPhase(_) => ErrorKind::OutOfPhase,
            MoveRejected::GameOver(_) => ErrorKind::GameOver,
            MoveRejected::Unperceived(_) => ErrorKind::InvalidTarget,
        }
    }
}

/// The reason why the dice could not be rolled.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Error)]
pub enum RollRejected {
    #[display("already rolled this turn")]
    AlreadyRolled,

    #[display("nothing to roll for")]
    NothingSelected,

    #[display("the game is over, {_0}")]
    GameOver(#[error(not(source))] Status),
}

impl RollRejected {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RollRejected::AlreadyRolled | RollRejected::NothingSelected => ErrorKind::OutOfPhase,
            RollRejected::GameOver(_) => ErrorKind::GameOver,
        }
    }
}

/// The reason why an effect could not be selected or resolved.
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Error, From)]
pub enum EffectRejected {
    #[display("cannot select an effect while {_0}")]
    OutOfPhase(#[error(not(source))] Phase),

    #[display("no more effects may be selected after rolling")]
    AlreadyRolled,

    #[display("nothing is selected")]
    NothingSelected,

    #[display("`{_0}` needs a roll")]
    Unrolled(#[error(not(source))] Effect),

    #[display("`{_0}` may not be used again this turn")]
    LimitExceeded(#[error(not(source))] Effect),

    #[display("rolled {roll}, but `{effect}` needs at least {gate}")]
    RollTooLow { effect: Effect, roll: u8, gate: u8 },

    #[display("the game is over, {_0}")]
    GameOver(#[error(not(source))] Status),

    #[display("{_0}")]
    #[from]
    Misfire(Misfire),
}

impl EffectRejected {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EffectRejected::OutOfPhase(_)
            | EffectRejected::AlreadyRolled
            | EffectRejected::NothingSelected
            | EffectRejected::Unrolled(_) => ErrorKind::OutOfPhase,
            EffectRejected::LimitExceeded(_) => ErrorKind::LimitExceeded,
            EffectRejected::RollTooLow { .. } => ErrorKind::RollTooLow,
            EffectRejected::GameOver(_) => ErrorKind::GameOver,
            EffectRejected::Misfire(Misfire::Blocked(_)) => ErrorKind::Blocked,
            EffectRejected::Misfire(Misfire::EmptyGraveyard)
            | EffectRejected::Misfire(Misfire::Paradox(Paradox::Unrecorded)) => {
                ErrorKind::EmptyResource
            }

            EffectRejected::Misfire(_) => ErrorKind::InvalidTarget,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chess::Move;
    use crate::magic::{Item, Spell, Target};
    use test_strategy::proptest;

    #[proptest]
    fn blocked_moves_are_reported_as_blocked(sq: Square) {
        let e = MoveRejected::from(IllegalMove::Blocked(sq));
        assert_eq!(e.kind(), ErrorKind::Blocked);
    }

    #[proptest]
    fn other_illegal_moves_are_reported_as_illegal(m: Move) {
        assert_eq!(
            MoveRejected::from(IllegalMove::SelfCheck(m)).kind(),
            ErrorKind::IllegalMove
        );

        assert_eq!(
            MoveRejected::from(IllegalMove::Pattern(m)).kind(),
            ErrorKind::IllegalMove
        );
    }

    #[test]
    fn rolling_twice_is_out_of_phase() {
        assert_eq!(RollRejected::AlreadyRolled.kind(), ErrorKind::OutOfPhase);
    }

    #[proptest]
    fn misfires_map_onto_the_taxonomy(sq: Square, t: Target) {
        let kind = |m: Misfire| EffectRejected::from(m).kind();
        assert_eq!(kind(Misfire::Blocked(sq)), ErrorKind::Blocked);
        assert_eq!(kind(Misfire::EmptyGraveyard), ErrorKind::EmptyResource);
        assert_eq!(kind(Paradox::Unrecorded.into()), ErrorKind::EmptyResource);
        assert_eq!(kind(Paradox::Altered(sq).into()), ErrorKind::InvalidTarget);
        assert_eq!(kind(Misfire::Immune(sq)), ErrorKind::InvalidTarget);
        assert_eq!(kind(Misfire::Mismatch(t)), ErrorKind::InvalidTarget);
    }

    #[test]
    fn roll_too_low_names_the_gate() {
        let e = EffectRejected::RollTooLow {
            effect: Spell::Fireball.into(),
            roll: 14,
            gate: 15,
        };

        assert_eq!(e.kind(), ErrorKind::RollTooLow);
        assert_eq!(e.to_string(), "rolled 14, but `fireball` needs at least 15");
    }

    #[test]
    fn limits_are_reported_as_exceeded() {
        let e = EffectRejected::LimitExceeded(Item::Knife.into());
        assert_eq!(e.kind(), ErrorKind::LimitExceeded);
    }
}
