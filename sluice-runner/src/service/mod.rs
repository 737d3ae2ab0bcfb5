//! Service layer
//!
//! Services contain the runner's business logic. They orchestrate the
//! poller and the repositories; everything they touch is injected so the
//! batch flow can be tested without a network or a database.

mod batch;

pub use batch::{BatchReport, BatchService, PairError};
