//! State module for tracking harvest progress
//!
//! # Components
//!
//! - `HostState`: per-host dispatch bookkeeping used by the rate limiter
//! - `ItemOutcome`: what happened to a single locator attempt
//! - `RunPhase`: the batch scheduler's state machine

mod host_state;
mod item_outcome;
mod run_phase;

pub use host_state::HostState;
pub use item_outcome::ItemOutcome;
pub use run_phase::RunPhase;
