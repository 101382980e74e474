//! # Lexibank application library
//!
//! The CLI, HTTP API and configuration, exposed as a library so the
//! integration tests can build routers and configs directly.

pub mod api;
pub mod cli;
pub mod config;

use lexibank_core::Day;
use std::time::{SystemTime, UNIX_EPOCH};

const SECONDS_PER_DAY: u64 = 86_400;

/// Today as a day index since the Unix epoch (UTC).
///
/// A clock before the epoch reads as day 0.
pub fn current_day() -> Day {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    Day::new(u32::try_from(seconds / SECONDS_PER_DAY).unwrap_or(u32::MAX))
}
