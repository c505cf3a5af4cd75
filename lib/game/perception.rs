use crate::chess::{Color, Position, Square};

/// Trait for deciding whether a player notices an invisible piece.
///
/// Consulted whenever a player targets an invisible enemy piece for capture.
#[cfg_attr(test, mockall::automock)]
pub trait Perception {
    /// Whether `viewer` perceives the invisible piece on `sq`.
    fn perceives(&mut self, pos: &Position, viewer: Color, sq: Square) -> bool;
}

/// A [`Perception`] that always notices invisible pieces.
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Clairvoyance;

impl Perception for Clairvoyance {
    fn perceives(&mut self, _: &Position, _: Color, _: Square) -> bool {
        true
    }
}
