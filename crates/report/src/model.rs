//! Test outcome records and the run summary derived from them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Passed,
    Failed,
    Pending,
    Skipped,
    #[default]
    Unknown,
}

impl TestStatus {
    /// Map the runner's free-form state string; anything unrecognised is `Unknown`
    pub fn from_state(state: Option<&str>) -> Self {
        match state.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("passed") => TestStatus::Passed,
            Some("failed") => TestStatus::Failed,
            Some("pending") => TestStatus::Pending,
            Some("skipped") => TestStatus::Skipped,
            _ => TestStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Pending => "pending",
            TestStatus::Skipped => "skipped",
            TestStatus::Unknown => "unknown",
        }
    }

    /// Marker written to the error type column for tests that did not fail
    pub fn marker(&self) -> &'static str {
        match self {
            TestStatus::Passed => "PASSED",
            TestStatus::Failed => "FAILED",
            TestStatus::Pending => "PENDING",
            TestStatus::Skipped => "SKIPPED",
            TestStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One executed test, immutable once handed to the collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOutcomeRecord {
    pub test_id: String,
    pub spec_file: String,
    pub duration_ms: u64,
    pub status: TestStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub suite: String,
    pub test_class: String,
    pub test_method: String,
    pub error_message: String,
    pub error_type: String,
    pub error_stack: String,
    pub reason: String,
    pub action_item: String,
    pub action: String,
    pub local_run: String,
    pub detected_by: String,
    pub defect_factor_dependent_passed_in_local: String,
}

impl TestOutcomeRecord {
    pub fn is_failed(&self) -> bool {
        self.status == TestStatus::Failed
    }
}

/// Aggregate counts over a run's records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pending: usize,
    pub skipped: usize,
    pub unknown: usize,
    pub total_duration_ms: u64,
}

impl RunSummary {
    pub fn from_records(records: &[TestOutcomeRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.total += 1;
            summary.total_duration_ms += record.duration_ms;
            match record.status {
                TestStatus::Passed => summary.passed += 1,
                TestStatus::Failed => summary.failed += 1,
                TestStatus::Pending => summary.pending += 1,
                TestStatus::Skipped => summary.skipped += 1,
                TestStatus::Unknown => summary.unknown += 1,
            }
        }
        summary
    }

    /// Passed over total, in percent; zero for an empty run
    pub fn pass_percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let raw = self.passed as f64 / self.total as f64 * 100.0;
        (raw * 100.0).round() / 100.0
    }

    pub fn pass_percentage_display(&self) -> String {
        format!("{:.2}", self.pass_percentage())
    }
}
