//! Error types for core operations

use thiserror::Error;

/// A status string reported by the remote service that does not map onto
/// [`TaskStatus`](crate::domain::task::TaskStatus)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown task status '{0}'")]
pub struct ParseStatusError(pub String);

/// Errors raised when a sub-task snapshot cannot be folded into a summary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// The snapshot contained no sub-task records at all
    #[error("snapshot contains no sub-tasks")]
    Empty,

    /// A field required for the summary was absent from every record
    #[error("field '{field}' is missing from every sub-task")]
    MissingField { field: &'static str },

    /// A row total does not fit in an `i64`
    #[error("sum of '{field}' overflows")]
    RowCountOverflow { field: &'static str },
}
