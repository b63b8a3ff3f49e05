//! Domain models for the CRI calculator.

mod alert;
mod drug;
mod profile;

pub use alert::*;
pub use drug::*;
pub use profile::*;
