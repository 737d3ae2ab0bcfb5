//! Sluice Core
//!
//! Core types and pure logic for the Sluice ingestion status tracker.
//!
//! This crate contains:
//! - Domain types: sub-task records, job summaries, watermarks, batch input
//! - Completion policy: decides when a job snapshot is "done enough"
//! - Aggregation: folds a sub-task snapshot into a single job summary
//!
//! Nothing in here performs I/O; the client and runner crates own the
//! network and database sides.

pub mod aggregate;
pub mod domain;
pub mod error;
pub mod policy;

pub use aggregate::aggregate;
pub use error::{ParseStatusError, SnapshotError};
pub use policy::{CompletionDecision, CompletionPolicy};
