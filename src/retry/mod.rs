// src/retry/mod.rs

//! Failure classification for the retry loop.
//!
//! Callers register regular expressions for known-transient failures
//! (leader elections, connection resets, API throttling) and the runner asks
//! the [`RetryMatcher`] whether a failed attempt's output matches one of them.

pub mod matcher;

pub use matcher::{CompiledPattern, RetryMatcher};
