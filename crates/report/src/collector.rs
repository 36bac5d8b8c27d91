//! Result collector: turns raw runner results into outcome records

use chrono::{DateTime, TimeDelta, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::model::{RunSummary, TestOutcomeRecord, TestStatus};
use crate::raw::RawTestResult;

/// Identifier used when the runner sends no usable title
pub const UNKNOWN_TEST: &str = "Unknown Test";

/// Separator between title path segments in `testId` and `suite`
pub const TITLE_SEPARATOR: &str = " > ";

pub const SUCCESS_REASON: &str = "Test passed successfully";

const NO_MESSAGE: &str = "Test failed without an error message";

/// Classified failure cause
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Assertion,
    Timeout,
    Network,
    /// No pattern matched; keeps the runner's own error name
    Named(String),
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorKind::Assertion => "AssertionError",
            ErrorKind::Timeout => "TimeoutError",
            ErrorKind::Network => "NetworkError",
            ErrorKind::Named(name) => name,
            ErrorKind::Unknown => "UnknownError",
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            ErrorKind::Assertion => "Application behaviour did not match the expected result",
            ErrorKind::Timeout => "Element or page did not respond within the allowed time",
            ErrorKind::Network => "Target application could not be reached",
            ErrorKind::Named(_) | ErrorKind::Unknown => "Test failed with an unclassified error",
        }
    }

    pub fn action_item(&self) -> &'static str {
        match self {
            ErrorKind::Assertion => "Compare expected vs actual and verify the requirement",
            ErrorKind::Timeout => "Check selectors and page load performance",
            ErrorKind::Network => "Verify base URL availability and network access",
            ErrorKind::Named(_) | ErrorKind::Unknown => "Inspect the stack trace and screenshot",
        }
    }
}

/// Checked in order; the first kind whose pattern matches wins
static CLASSIFIERS: Lazy<Vec<(ErrorKind, Regex)>> = Lazy::new(|| {
    [
        (ErrorKind::Assertion, r"AssertionError|expected .+ to "),
        (ErrorKind::Timeout, r"TimeoutError|Timed out retrying|timed out after"),
        (ErrorKind::Network, r"NetworkError|ECONNREFUSED|ENOTFOUND|net::ERR_"),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(pattern).expect("static pattern compiles")))
    .collect()
});

/// Classify a failure from its error name, message and stack
pub fn classify_error(name: Option<&str>, message: &str, stack: &str) -> ErrorKind {
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    for (kind, pattern) in CLASSIFIERS.iter() {
        let hit = name.map(|n| pattern.is_match(n)).unwrap_or(false)
            || pattern.is_match(message)
            || pattern.is_match(stack);
        if hit {
            return kind.clone();
        }
    }
    match name {
        Some(name) => ErrorKind::Named(name.to_string()),
        None => ErrorKind::Unknown,
    }
}

/// Screenshot file the runner captures for a failed test
pub fn failure_screenshot_name(title: &[String]) -> Option<String> {
    let (test, parents) = title.split_last()?;
    let parent = parents.last().map(String::as_str).unwrap_or_default();
    Some(format!("{} -- {} (failed).png", parent, test))
}

/// Accumulates outcome records for one run
#[derive(Debug)]
pub struct ResultCollector {
    run_started_at: DateTime<Utc>,
    local_run: bool,
    records: Vec<TestOutcomeRecord>,
}

impl ResultCollector {
    /// `run_started_at` stands in for tests that report no start time
    pub fn new(run_started_at: DateTime<Utc>, local_run: bool) -> Self {
        Self {
            run_started_at,
            local_run,
            records: Vec::new(),
        }
    }

    /// Derive and append a record for every result of a completed spec
    pub fn record_spec_completion(&mut self, spec_name: &str, results: &[RawTestResult]) -> usize {
        let before = self.records.len();
        for raw in results {
            let record = derive_record(spec_name, raw, self.run_started_at, self.local_run);
            self.records.push(record);
        }
        let added = self.records.len() - before;
        debug!(spec = spec_name, added, total = self.records.len(), "Recorded spec results");
        added
    }

    pub fn records(&self) -> &[TestOutcomeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_records(&self.records)
    }

    /// Hand the records over, leaving the collector empty
    pub fn drain(&mut self) -> Vec<TestOutcomeRecord> {
        std::mem::take(&mut self.records)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn duration_ms(raw: &RawTestResult) -> u64 {
    raw.duration
        .or(raw.wall_clock_duration)
        .filter(|d| d.is_finite() && *d > 0.0)
        .map(|d| d.round() as u64)
        .unwrap_or(0)
}

fn derive_record(
    spec_name: &str,
    raw: &RawTestResult,
    run_started_at: DateTime<Utc>,
    local_run: bool,
) -> TestOutcomeRecord {
    let (test_id, suite, test_class, test_method) = match raw.title.split_last() {
        Some((last, parents)) => (
            raw.title.join(TITLE_SEPARATOR),
            parents.join(TITLE_SEPARATOR),
            raw.title[0].clone(),
            last.clone(),
        ),
        None => (
            UNKNOWN_TEST.to_string(),
            String::new(),
            String::new(),
            UNKNOWN_TEST.to_string(),
        ),
    };

    let status = TestStatus::from_state(raw.state.as_deref());
    let duration_ms = duration_ms(raw);
    let start_time = raw
        .wall_clock_started_at
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(run_started_at);
    let end_time = i64::try_from(duration_ms)
        .ok()
        .and_then(TimeDelta::try_milliseconds)
        .and_then(|d| start_time.checked_add_signed(d))
        .unwrap_or(start_time);

    let is_defect = test_id.to_ascii_lowercase().contains("defect");

    let mut record = TestOutcomeRecord {
        test_id,
        spec_file: spec_name.to_string(),
        duration_ms,
        status,
        start_time,
        end_time,
        suite,
        test_class,
        test_method,
        error_message: String::new(),
        error_type: status.marker().to_string(),
        error_stack: String::new(),
        reason: String::new(),
        action_item: String::new(),
        action: "None".to_string(),
        local_run: if local_run { "Yes" } else { "No" }.to_string(),
        detected_by: if is_defect { "Defect Test" } else { "Automation" }.to_string(),
        defect_factor_dependent_passed_in_local: "N/A".to_string(),
    };

    match status {
        TestStatus::Failed => {
            let err = raw.err.as_ref();
            let structured_message = non_empty(err.and_then(|e| e.message.as_deref()));
            let structured_stack = non_empty(err.and_then(|e| e.stack.as_deref()));
            let display = non_empty(raw.display_error.as_deref());

            let message = display.or(structured_message).unwrap_or(NO_MESSAGE);
            let stack = structured_stack.or(display).unwrap_or_default();
            let kind = classify_error(err.and_then(|e| e.name.as_deref()), message, stack);

            record.error_message = message.to_string();
            record.error_stack = stack.to_string();
            record.error_type = kind.as_str().to_string();
            record.reason = kind.reason().to_string();
            record.action_item = match failure_screenshot_name(&raw.title) {
                Some(shot) => format!("{} (screenshot: {})", kind.action_item(), shot),
                None => kind.action_item().to_string(),
            };
            record.action = if is_defect { "Log defect" } else { "Investigate" }.to_string();
            record.defect_factor_dependent_passed_in_local =
                if local_run { "No" } else { "Unverified" }.to_string();
        }
        TestStatus::Passed => {
            record.reason = SUCCESS_REASON.to_string();
            record.action_item = "No action required".to_string();
        }
        TestStatus::Pending | TestStatus::Skipped | TestStatus::Unknown => {
            record.reason = format!("Test did not run ({})", status);
            record.action_item = "Review why the test was not executed".to_string();
        }
    }

    record
}
