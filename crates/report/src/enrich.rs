//! Failure enrichment from mochawesome JSON result files
//!
//! The reporter writes one JSON file per spec into its report directory. Each
//! holds nested suites whose tests carry `fullTitle` and an `err` object with
//! `message` and `estack`.

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::collector::TITLE_SEPARATOR;
use crate::error::{ReportError, ReportResult};
use crate::model::TestOutcomeRecord;

/// Failure text found in a native result file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeFailure {
    pub message: Option<String>,
    pub stack: Option<String>,
}

/// Read every `*.json` under `dir`, in file-name order, keyed by full title.
/// Later files overwrite earlier entries for the same test.
pub fn load_native_failures(dir: &Path) -> ReportResult<BTreeMap<String, NativeFailure>> {
    if !dir.is_dir() {
        return Err(ReportError::Enrichment {
            path: dir.display().to_string(),
            reason: "results directory not found".to_string(),
        });
    }

    let mut failures = BTreeMap::new();
    for entry in walkdir::WalkDir::new(dir)
        .max_depth(2)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map(|ext| ext == "json").unwrap_or(false))
    {
        let path = entry.path();
        let enrichment_error = |reason: String| ReportError::Enrichment {
            path: path.display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| enrichment_error(e.to_string()))?;
        let doc: Value = serde_json::from_str(&content).map_err(|e| enrichment_error(e.to_string()))?;

        let before = failures.len();
        if let Some(results) = doc.get("results").and_then(Value::as_array) {
            for result in results {
                collect_suite(result, &mut failures);
            }
        }
        debug!(file = %path.display(), new = failures.len() - before, "Read native results");
    }
    Ok(failures)
}

fn collect_suite(suite: &Value, out: &mut BTreeMap<String, NativeFailure>) {
    if let Some(tests) = suite.get("tests").and_then(Value::as_array) {
        for test in tests {
            let Some(full_title) = test.get("fullTitle").and_then(Value::as_str) else {
                continue;
            };
            let err = test.get("err");
            let field = |key: &str| {
                err.and_then(|e| e.get(key))
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            };
            let failure = NativeFailure {
                message: field("message"),
                stack: field("estack"),
            };
            if failure.message.is_some() || failure.stack.is_some() {
                out.insert(full_title.trim().to_string(), failure);
            }
        }
    }
    if let Some(children) = suite.get("suites").and_then(Value::as_array) {
        for child in children {
            collect_suite(child, out);
        }
    }
}

/// Patch failed records whose title matches a native failure; returns how many changed
pub fn apply_native_failures(
    records: &mut [TestOutcomeRecord],
    failures: &BTreeMap<String, NativeFailure>,
) -> usize {
    let mut patched = 0;
    for record in records.iter_mut().filter(|r| r.is_failed()) {
        let full_title = record.test_id.split(TITLE_SEPARATOR).collect::<Vec<_>>().join(" ");
        let Some(native) = failures
            .get(&full_title)
            .or_else(|| failures.get(&record.test_id))
        else {
            continue;
        };

        let mut changed = false;
        if let Some(message) = &native.message {
            if *message != record.error_message {
                record.error_message = message.clone();
                changed = true;
            }
        }
        if let Some(stack) = &native.stack {
            if *stack != record.error_stack {
                record.error_stack = stack.clone();
                changed = true;
            }
        }
        if changed {
            patched += 1;
        }
    }
    patched
}
