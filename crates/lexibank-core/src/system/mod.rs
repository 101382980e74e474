//! # System Module
//!
//! The stage machine and per-stage metrics.
//!
//! Every word carries a stage from 1 (new) to 9 (mastered). Review pages
//! feed recall outcomes into the machine and read back the distribution.

mod stage;

pub use stage::*;
