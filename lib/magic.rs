mod dice;
mod effect;
mod item;
mod spell;
mod state;
mod target;

pub use dice::*;
pub use effect::*;
pub use item::*;
pub use spell::*;
pub use state::*;
pub use target::*;
