//! Batch input types

use serde::{Deserialize, Serialize};

/// One unit of work for the batch orchestrator: the latest ingestion job
/// recorded for a source table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPair {
    pub table_name: String,
    pub job_id: String,
}

impl BatchPair {
    pub fn new(table_name: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            job_id: job_id.into(),
        }
    }
}
