//! Repository layer
//!
//! Repositories abstract the two outside systems the runner talks to: the
//! remote ingestion service (job status) and the status database (batch
//! input, watermarks, summaries). They carry no polling or aggregation
//! logic.
//!
//! All repositories are trait-based to enable testing and mocking.

mod ledger;
mod status;

// Re-export traits
pub use ledger::LedgerRepository;
pub use status::{FetchError, StatusRepository};

// Re-export implementations
pub use ledger::PgLedgerRepository;
pub use status::HttpStatusRepository;

#[cfg(test)]
pub mod fakes;
