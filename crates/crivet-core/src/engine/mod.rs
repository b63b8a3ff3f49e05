//! Calculation and advisory engine.
//!
//! Every entry point is a pure function over its inputs and the immutable
//! catalog, safe to call concurrently.

mod alerts;
mod dose_range;
mod infusion;

pub use alerts::*;
pub use dose_range::*;
pub use infusion::*;
