//! # Formats Module
//!
//! Serialization formats for whole-repository snapshots.
//! File I/O operations are in the app layer.

mod persistence;

pub use persistence::*;
