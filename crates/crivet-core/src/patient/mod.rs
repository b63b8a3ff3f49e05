//! Patient state and condition flags.

mod flags;
mod state;

pub use flags::*;
pub use state::*;
