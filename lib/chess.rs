mod board;
mod castles;
mod color;
mod r#move;
mod piece;
mod position;
mod role;
mod square;
mod status;

pub use board::*;
pub use castles::*;
pub use color::*;
pub use piece::*;
pub use position::*;
pub use r#move::*;
pub use role::*;
pub use square::*;
pub use status::*;
