//! End-to-end report pipeline tests
//!
//! Drive a `RunContext` the way the runner bridge does and check the files
//! that land on disk.

use std::fs;
use std::path::Path;

use chrono::{TimeZone, Utc};
use serde_json::json;
use tempfile::TempDir;

use runledger_report::csv::CsvTable;
use runledger_report::writer::{ENVIRONMENT_FILE, SUMMARY_FILE};
use runledger_report::{
    EnvironmentInputs, RawRunAggregate, RawTestResult, ReportConfig, RunContext, RunnerConfig,
};

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn local_inputs() -> EnvironmentInputs {
    EnvironmentInputs {
        platform: Some("linux".to_string()),
        platform_version: Some("6.8.0".to_string()),
        runtime_version: Some("v20.11.1".to_string()),
        vars: Default::default(),
        captured_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
    }
}

fn runner() -> RunnerConfig {
    RunnerConfig {
        base_url: Some("https://my-shop-eight-theta.vercel.app/".to_string()),
        runner_version: None,
    }
}

fn config(out: &Path) -> ReportConfig {
    ReportConfig {
        output_dir: out.to_path_buf(),
        ..Default::default()
    }
}

fn login_results() -> Vec<RawTestResult> {
    serde_json::from_value(json!([
        {
            "title": ["E-commerce Login Page Functionality", "TC001: Should successfully login"],
            "duration": 2100,
            "state": "passed",
            "wallClockStartedAt": "2026-03-01T09:00:01.000Z"
        },
        {
            "title": ["E-commerce Login Page Functionality", "TC002: Should display alert"],
            "duration": 950,
            "state": "failed",
            "wallClockStartedAt": "2026-03-01T09:00:03.100Z",
            "err": {
                "message": "expected true to be false",
                "stack": "AssertionError: expected true to be false\n    at Context.eval (login.cy.ts:60:12)",
                "name": "AssertionError"
            }
        }
    ]))
    .unwrap()
}

fn read_table(path: &Path) -> CsvTable {
    CsvTable::parse(&fs::read_to_string(path).unwrap()).unwrap()
}

fn summary_value(table: &CsvTable, key: &str) -> String {
    table
        .rows
        .iter()
        .find(|row| row[0] == key)
        .map(|row| row[1].clone())
        .unwrap_or_else(|| panic!("missing summary key {}", key))
}

#[test]
fn one_pass_one_fail_scenario() {
    init_logging();
    let tmp = TempDir::new().unwrap();
    let mut run = RunContext::init(&config(tmp.path()), &runner(), &local_inputs());

    run.on_spec_complete("TC001-TC006.cy.ts", &login_results()).unwrap();
    let outcome = run
        .on_run_complete(Some(&RawRunAggregate {
            total_tests: Some(2),
            total_passed: Some(1),
            total_failed: Some(1),
            ..Default::default()
        }))
        .unwrap();

    assert_eq!(outcome.summary.passed, 1);
    assert_eq!(outcome.summary.failed, 1);

    let summary = read_table(&tmp.path().join(SUMMARY_FILE));
    assert_eq!(summary.headers, vec!["key", "value"]);
    assert_eq!(summary_value(&summary, "totalPassed"), "1");
    assert_eq!(summary_value(&summary, "totalFailed"), "1");
    assert_eq!(summary_value(&summary, "passPercentage"), "50.00");
    assert_eq!(summary_value(&summary, "executionContext"), "Local");

    let detailed = read_table(&tmp.path().join("data_suites.csv"));
    assert_eq!(detailed.rows.len(), 2);
    assert_eq!(detailed.value(1, "status"), Some("failed"));
    assert_eq!(detailed.value(1, "errorMessage"), Some("expected true to be false"));
    assert_eq!(detailed.value(1, "errorType"), Some("AssertionError"));
    assert_eq!(detailed.value(0, "errorMessage"), Some(""));
    assert_eq!(detailed.value(0, "reason"), Some("Test passed successfully"));
    assert_eq!(detailed.value(0, "startTime"), Some("2026-03-01T09:00:01.000Z"));
    assert_eq!(detailed.value(0, "endTime"), Some("2026-03-01T09:00:03.100Z"));

    let raw = fs::read_to_string(tmp.path().join("data_suites.csv")).unwrap();
    let first_row = raw.lines().nth(1).unwrap();
    assert!(first_row.contains(",2100,"), "duration should be unquoted: {}", first_row);
}

#[test]
fn destination_directory_is_created() {
    init_logging();
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("cypress").join("results");
    assert!(!out.exists());

    let mut run = RunContext::init(&config(&out), &runner(), &local_inputs());
    run.on_spec_complete("TC001-TC006.cy.ts", &login_results()).unwrap();
    run.on_run_complete(None).unwrap();

    for name in [ENVIRONMENT_FILE, "data_suites.csv", SUMMARY_FILE] {
        assert!(out.join(name).is_file(), "{} missing", name);
    }
    let properties = fs::read_to_string(out.join(ENVIRONMENT_FILE)).unwrap();
    assert!(properties.contains("Base.URL=https://my-shop-eight-theta.vercel.app/"));
    assert!(properties.contains("Execution.Context=Local"));
}

#[test]
fn flush_twice_is_byte_identical() {
    init_logging();
    let tmp = TempDir::new().unwrap();
    let cfg = config(tmp.path());

    let mut run = RunContext::init(&cfg, &runner(), &local_inputs());
    run.on_spec_complete("TC001-TC006.cy.ts", &login_results()).unwrap();
    let records = run.records().to_vec();
    let env = run.environment().clone();

    let writer = runledger_report::ReportWriter::new(runledger_report::WriterOptions::from_config(
        &cfg,
        run.capabilities(),
    ));
    let read_all = || {
        [ENVIRONMENT_FILE, "data_suites.csv", SUMMARY_FILE]
            .map(|name| fs::read(tmp.path().join(name)).unwrap())
    };

    writer.flush(&records, &env, tmp.path()).unwrap();
    let first = read_all();
    writer.flush(&records, &env, tmp.path()).unwrap();
    let second = read_all();
    assert_eq!(first, second);
}

#[test]
fn quotes_and_newlines_round_trip() {
    init_logging();
    let tmp = TempDir::new().unwrap();
    let message = "He said \"go\"\nand then \\n stayed literal";
    let results: Vec<RawTestResult> = serde_json::from_value(json!([{
        "title": ["Checkout, \"express\"", "TC020: totals"],
        "duration": 10,
        "state": "failed",
        "displayError": message,
        "err": { "message": "ignored", "stack": "Error\n    at one\n    at two" }
    }]))
    .unwrap();

    let mut run = RunContext::init(&config(tmp.path()), &runner(), &local_inputs());
    run.on_spec_complete("checkout.cy.ts", &results).unwrap();
    run.on_run_complete(None).unwrap();

    let raw = fs::read_to_string(tmp.path().join("data_suites.csv")).unwrap();
    assert_eq!(raw.lines().count(), 2, "each record stays on one line");

    let table = CsvTable::parse(&raw).unwrap();
    assert_eq!(table.value(0, "errorMessage"), Some(message));
    assert_eq!(table.value(0, "errorStack"), Some("Error\n    at one\n    at two"));
    assert_eq!(table.value(0, "suite"), Some("Checkout, \"express\""));
}

#[test]
fn empty_run_reports_zero_percent() {
    init_logging();
    let tmp = TempDir::new().unwrap();
    let mut run = RunContext::init(&config(tmp.path()), &runner(), &local_inputs());
    run.on_run_complete(None).unwrap();

    let summary = read_table(&tmp.path().join(SUMMARY_FILE));
    assert_eq!(summary_value(&summary, "totalTests"), "0");
    assert_eq!(summary_value(&summary, "passPercentage"), "0.00");

    let detailed = read_table(&tmp.path().join("data_suites.csv"));
    assert_eq!(detailed.headers.len(), 18);
    assert!(detailed.rows.is_empty());
}

#[test]
fn corrupt_native_results_keep_primary_reports() {
    init_logging();
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("mochawesome.json"), "{\"results\": [").unwrap();

    let mut run = RunContext::init(&config(tmp.path()), &runner(), &local_inputs());
    run.on_spec_complete("TC001-TC006.cy.ts", &login_results()).unwrap();
    let outcome = run.on_run_complete(None).unwrap();

    assert!(outcome.enrichment_error.is_some());
    assert_eq!(outcome.enriched, 0);

    let detailed = read_table(&tmp.path().join("data_suites.csv"));
    assert_eq!(detailed.rows.len(), 2);
    assert_eq!(detailed.value(1, "errorMessage"), Some("expected true to be false"));
    let summary = read_table(&tmp.path().join(SUMMARY_FILE));
    assert_eq!(summary_value(&summary, "totalFailed"), "1");
}

#[test]
fn native_results_patch_failure_text() {
    init_logging();
    let tmp = TempDir::new().unwrap();
    let native = tmp.path().join("mochawesome");
    fs::create_dir_all(&native).unwrap();
    fs::write(
        native.join("mochawesome.json"),
        json!({
            "results": [{
                "suites": [{
                    "title": "E-commerce Login Page Functionality",
                    "tests": [{
                        "title": "TC002: Should display alert",
                        "fullTitle": "E-commerce Login Page Functionality TC002: Should display alert",
                        "state": "failed",
                        "err": {
                            "message": "AssertionError: expected true to be false",
                            "estack": "AssertionError: expected true to be false\n    at richer (login.cy.ts:61:3)"
                        }
                    }],
                    "suites": []
                }]
            }]
        })
        .to_string(),
    )
    .unwrap();

    let cfg = ReportConfig {
        native_results_dir: Some(native),
        ..config(tmp.path())
    };
    let mut run = RunContext::init(&cfg, &runner(), &local_inputs());
    run.on_spec_complete("TC001-TC006.cy.ts", &login_results()).unwrap();
    let outcome = run.on_run_complete(None).unwrap();

    assert_eq!(outcome.enriched, 1);
    assert!(outcome.enrichment_error.is_none());

    let detailed = read_table(&tmp.path().join("data_suites.csv"));
    assert_eq!(
        detailed.value(1, "errorMessage"),
        Some("AssertionError: expected true to be false")
    );
    assert!(detailed.value(1, "errorStack").unwrap().contains("at richer"));
    assert_eq!(detailed.value(0, "errorMessage"), Some(""));
}

#[test]
fn ci_context_flows_into_records() {
    init_logging();
    let tmp = TempDir::new().unwrap();
    let mut inputs = local_inputs();
    inputs.vars.insert("BUILD_NUMBER".to_string(), "77".to_string());

    let mut run = RunContext::init(&config(tmp.path()), &runner(), &inputs);
    run.on_spec_complete("TC001-TC006.cy.ts", &login_results()).unwrap();
    run.on_run_complete(None).unwrap();

    let detailed = read_table(&tmp.path().join("data_suites.csv"));
    assert_eq!(detailed.value(0, "localRun"), Some("No"));
    assert_eq!(
        detailed.value(1, "defectFactorDependentPassedInLocal"),
        Some("Unverified")
    );
    let summary = read_table(&tmp.path().join(SUMMARY_FILE));
    assert_eq!(summary_value(&summary, "executionContext"), "CI Build #77");
}
