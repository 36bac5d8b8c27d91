//! Raw result shapes handed over by the external test runner
//!
//! Every type here is built from a `serde_json::Value` field by field, so a
//! wrongly typed or missing field degrades to `None` instead of failing the
//! whole payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One test as reported by the runner when a spec completes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", rename_all = "camelCase")]
pub struct RawTestResult {
    /// Title path, outermost `describe` first
    pub title: Vec<String>,
    pub duration: Option<f64>,
    pub state: Option<String>,
    pub wall_clock_started_at: Option<String>,
    pub wall_clock_duration: Option<f64>,
    pub err: Option<RawError>,
    /// Pre-formatted error text as the runner would display it
    pub display_error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", rename_all = "camelCase")]
pub struct RawError {
    pub message: Option<String>,
    pub stack: Option<String>,
    pub name: Option<String>,
}

/// Totals reported by the runner when the whole run completes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", rename_all = "camelCase")]
pub struct RawRunAggregate {
    pub total_tests: Option<u64>,
    pub total_passed: Option<u64>,
    pub total_failed: Option<u64>,
    pub total_pending: Option<u64>,
    pub total_skipped: Option<u64>,
    pub total_duration: Option<u64>,
}

/// Runner configuration values read once at setup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", rename_all = "camelCase")]
pub struct RunnerConfig {
    pub base_url: Option<String>,
    pub runner_version: Option<String>,
}

impl From<Value> for RawTestResult {
    fn from(value: Value) -> Self {
        Self {
            title: title_path(value.get("title")),
            duration: number(&value, "duration"),
            state: text(&value, "state"),
            wall_clock_started_at: text(&value, "wallClockStartedAt"),
            wall_clock_duration: number(&value, "wallClockDuration"),
            err: value
                .get("err")
                .filter(|v| v.is_object())
                .map(|v| RawError::from(v.clone())),
            display_error: text(&value, "displayError"),
        }
    }
}

impl From<Value> for RawError {
    fn from(value: Value) -> Self {
        Self {
            message: text(&value, "message"),
            stack: text(&value, "stack"),
            name: text(&value, "name"),
        }
    }
}

impl From<Value> for RawRunAggregate {
    fn from(value: Value) -> Self {
        Self {
            total_tests: count(&value, "totalTests"),
            total_passed: count(&value, "totalPassed"),
            total_failed: count(&value, "totalFailed"),
            total_pending: count(&value, "totalPending"),
            total_skipped: count(&value, "totalSkipped"),
            total_duration: count(&value, "totalDuration"),
        }
    }
}

impl From<Value> for RunnerConfig {
    fn from(value: Value) -> Self {
        Self {
            base_url: text(&value, "baseUrl"),
            runner_version: text(&value, "runnerVersion"),
        }
    }
}

fn title_path(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

fn text(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn number(value: &Value, key: &str) -> Option<f64> {
    value
        .get(key)
        .and_then(Value::as_f64)
        .filter(|n| n.is_finite())
}

fn count(value: &Value, key: &str) -> Option<u64> {
    number(value, key).map(|n| if n < 0.0 { 0 } else { n.round() as u64 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_result() {
        let raw: RawTestResult = serde_json::from_value(json!({
            "title": ["Login", "TC001: valid login"],
            "duration": 1520,
            "state": "failed",
            "wallClockStartedAt": "2026-03-01T10:00:00.000Z",
            "err": { "message": "boom", "stack": "at x", "name": "AssertionError" },
            "displayError": "AssertionError: boom"
        }))
        .unwrap();

        assert_eq!(raw.title, vec!["Login", "TC001: valid login"]);
        assert_eq!(raw.duration, Some(1520.0));
        assert_eq!(raw.state.as_deref(), Some("failed"));
        assert_eq!(raw.err.unwrap().name.as_deref(), Some("AssertionError"));
    }

    #[test]
    fn test_wrong_types_degrade_to_none() {
        let raw: RawTestResult = serde_json::from_value(json!({
            "title": 42,
            "duration": "fast",
            "state": null,
            "err": "not an object"
        }))
        .unwrap();

        assert!(raw.title.is_empty());
        assert_eq!(raw.duration, None);
        assert_eq!(raw.state, None);
        assert_eq!(raw.err, None);
    }

    #[test]
    fn test_single_string_title() {
        let raw: RawTestResult = serde_json::from_value(json!({ "title": "standalone" })).unwrap();
        assert_eq!(raw.title, vec!["standalone"]);
    }

    #[test]
    fn test_non_object_payload_is_empty() {
        let raw: RawTestResult = serde_json::from_value(json!([1, 2, 3])).unwrap();
        assert_eq!(raw, RawTestResult::default());
    }

    #[test]
    fn test_aggregate_counts() {
        let agg: RawRunAggregate = serde_json::from_value(json!({
            "totalTests": 3,
            "totalPassed": 2.0,
            "totalFailed": -1
        }))
        .unwrap();
        assert_eq!(agg.total_tests, Some(3));
        assert_eq!(agg.total_passed, Some(2));
        assert_eq!(agg.total_failed, Some(0));
        assert_eq!(agg.total_pending, None);
    }
}
