//! Caller-side persistence for the learning state and run log
//!
//! The decision engine itself never performs I/O; this crate is the
//! convenience layer the CLI threads the state through. Single writer per
//! household assumed; concurrent writers can lose updates.

mod io;
mod paths;
mod types;

pub use io::{append_jsonl, atomic_write, load_state, read_jsonl, save_state, StoreError};
pub use paths::{Paths, DATA_DIR_ENV};
pub use types::RunRecord;
