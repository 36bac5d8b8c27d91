//! Summary Commands

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use std::path::{Path, PathBuf};

use runledger_report::csv::CsvTable;
use runledger_report::{RunSummary, TestStatus};

use crate::output::{print_item, print_list, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct SummaryArgs {
    /// Report directory (defaults to the configured output directory)
    dir: Option<PathBuf>,

    /// Detailed CSV to read instead of the configured file name
    #[arg(long)]
    file: Option<PathBuf>,

    /// Also list failed tests
    #[arg(long)]
    failures: bool,
}

/// Run summary display wrapper for serialization
#[derive(Serialize)]
pub struct SummaryDisplay {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pending: usize,
    pub skipped: usize,
    pub unknown: usize,
    pub duration_ms: u64,
    pub pass_percentage: String,
}

impl From<&RunSummary> for SummaryDisplay {
    fn from(summary: &RunSummary) -> Self {
        Self {
            total: summary.total,
            passed: summary.passed,
            failed: summary.failed,
            pending: summary.pending,
            skipped: summary.skipped,
            unknown: summary.unknown,
            duration_ms: summary.total_duration_ms,
            pass_percentage: summary.pass_percentage_display(),
        }
    }
}

impl TableDisplay for SummaryDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Total", "Passed", "Failed", "Pending", "Skipped", "Unknown", "Duration (ms)", "Pass %"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.total.to_string(),
            self.passed.to_string(),
            self.failed.to_string(),
            self.pending.to_string(),
            self.skipped.to_string(),
            self.unknown.to_string(),
            self.duration_ms.to_string(),
            self.pass_percentage.clone(),
        ]
    }
}

#[derive(Serialize)]
pub struct FailureDisplay {
    pub test_id: String,
    pub spec_file: String,
    pub error_type: String,
    pub error_message: String,
}

impl TableDisplay for FailureDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Test", "Spec", "Type", "Message"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.test_id.clone(),
            self.spec_file.clone(),
            self.error_type.clone(),
            self.error_message.lines().next().unwrap_or_default().to_string(),
        ]
    }
}

pub fn execute(args: SummaryArgs, config_path: &Path, format: OutputFormat) -> Result<i32> {
    let config = super::load_config(config_path)?;
    let path = match args.file {
        Some(file) => file,
        None => args
            .dir
            .unwrap_or_else(|| config.output_dir.clone())
            .join(config.detailed_csv.file_name()),
    };

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let table = CsvTable::parse(&text).with_context(|| format!("Failed to parse {}", path.display()))?;

    let summary = summarize(&table);
    print_item(&SummaryDisplay::from(&summary), format);

    if args.failures {
        print_list(&failures(&table), format);
    }

    Ok(if summary.failed > 0 { 1 } else { 0 })
}

/// Recount a detailed report
pub fn summarize(table: &CsvTable) -> RunSummary {
    let mut summary = RunSummary::default();
    for row in 0..table.rows.len() {
        summary.total += 1;
        summary.total_duration_ms += table
            .value(row, "duration")
            .and_then(|d| d.parse::<u64>().ok())
            .unwrap_or(0);
        match TestStatus::from_state(table.value(row, "status")) {
            TestStatus::Passed => summary.passed += 1,
            TestStatus::Failed => summary.failed += 1,
            TestStatus::Pending => summary.pending += 1,
            TestStatus::Skipped => summary.skipped += 1,
            TestStatus::Unknown => summary.unknown += 1,
        }
    }
    summary
}

fn failures(table: &CsvTable) -> Vec<FailureDisplay> {
    let text = |row: usize, col: &str| table.value(row, col).unwrap_or_default().to_string();
    (0..table.rows.len())
        .filter(|&row| TestStatus::from_state(table.value(row, "status")) == TestStatus::Failed)
        .map(|row| FailureDisplay {
            test_id: text(row, "testId"),
            spec_file: text(row, "specFile"),
            error_type: text(row, "errorType"),
            error_message: text(row, "errorMessage"),
        })
        .collect()
}
