/// Chess domain types and the move legality engine.
pub mod chess;
/// Turn state machine and the command API.
pub mod game;
/// Dice, spells and items.
pub mod magic;
