//! Scheduler layer for the runner
//!
//! Drives status polling for a single job: warm-up, repeated fetches,
//! completion policy evaluation and the wall-clock budget.

pub mod poller;

pub use poller::{PollError, PollOutcome, PollSettings, StatusPoller};
