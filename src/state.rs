//! Processing log - durable per-file outcome records
//!
//! This module provides the store that remembers which audio files have
//! already been processed or skipped, so the queue can resume after a
//! restart and "prev" can find the most recent decision.

mod store;
mod types;

pub use store::{LogStore, SledLogStore};
pub use types::{now_ms, LogRecord, LogStatus};
