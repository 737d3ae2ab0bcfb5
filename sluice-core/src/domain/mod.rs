//! Core domain types
//!
//! Structures shared between the client (which decodes them from the remote
//! ingestion service), the runner (which polls, aggregates and persists
//! them) and the CLI (which prints them).

pub mod batch;
pub mod summary;
pub mod task;
pub mod watermark;
