//! Watermark domain types
//!
//! Watermarks are written by the extraction step: the highest row version
//! shipped for a table, plus how many rows that extraction produced. The
//! runner only reads them to cross-check the row counts reported back by
//! the remote service.

use serde::{Deserialize, Serialize};

use super::summary::JobSummary;

/// Per-table extraction watermark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatermarkRecord {
    pub table_name: String,
    pub timestamp_watermark: i64,
    pub row_count: i64,
}

/// Outcome of comparing extracted rows with the rows a job reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub extracted_rows: i64,
    pub reported_rows: i64,
}

impl Reconciliation {
    pub fn matches(&self) -> bool {
        self.extracted_rows == self.reported_rows
    }

    /// Rows extracted but not accounted for (negative when the service
    /// reported more than was sent)
    pub fn missing_rows(&self) -> i64 {
        self.extracted_rows.saturating_sub(self.reported_rows)
    }
}

impl WatermarkRecord {
    pub fn reconcile(&self, summary: &JobSummary) -> Reconciliation {
        Reconciliation {
            extracted_rows: self.row_count,
            reported_rows: summary.reported_rows(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::summary::OverallStatus;

    fn summary(valid: i64, invalid: i64) -> JobSummary {
        JobSummary {
            job_id: "job-1".to_string(),
            flow_id: "flow-1".to_string(),
            overall_status: OverallStatus::Success,
            total_tasks: 5,
            total_valid_rows: valid,
            total_invalid_rows: invalid,
            start_time: None,
            end_time: None,
            duration_seconds: 0,
            table_name: Some("Customer".to_string()),
            tasks: Vec::new(),
        }
    }

    #[test]
    fn test_reconcile_counts_invalid_rows() {
        let watermark = WatermarkRecord {
            table_name: "Customer".to_string(),
            timestamp_watermark: 1_000,
            row_count: 103,
        };

        let result = watermark.reconcile(&summary(100, 3));
        assert!(result.matches());
        assert_eq!(result.missing_rows(), 0);
    }

    #[test]
    fn test_reconcile_reports_shortfall() {
        let watermark = WatermarkRecord {
            table_name: "Customer".to_string(),
            timestamp_watermark: 1_000,
            row_count: 120,
        };

        let result = watermark.reconcile(&summary(100, 3));
        assert!(!result.matches());
        assert_eq!(result.missing_rows(), 17);
    }

    #[test]
    fn test_reconcile_saturates_huge_totals() {
        let watermark = WatermarkRecord {
            table_name: "Customer".to_string(),
            timestamp_watermark: 1_000,
            row_count: -5,
        };

        let result = watermark.reconcile(&summary(i64::MAX, 1));
        assert_eq!(result.reported_rows, i64::MAX);
        assert_eq!(result.missing_rows(), i64::MIN);
        assert!(!result.matches());
    }
}
