//! CSV encoding for the detailed and summary reports
//!
//! Text fields are always quoted. Inside quotes `"` is doubled and line breaks
//! are written as the two-character escapes `\n` / `\r` (a literal backslash
//! becomes `\\`), so every record occupies exactly one physical line.

use chrono::SecondsFormat;

use crate::environment::EnvironmentSnapshot;
use crate::error::{ReportError, ReportResult};
use crate::model::{RunSummary, TestOutcomeRecord};

pub const BASE_COLUMNS: [&str; 12] = [
    "testId",
    "specFile",
    "duration",
    "status",
    "startTime",
    "endTime",
    "suite",
    "testClass",
    "testMethod",
    "errorMessage",
    "errorType",
    "errorStack",
];

pub const EXTENDED_COLUMNS: [&str; 6] = [
    "reason",
    "actionItem",
    "action",
    "localRun",
    "detectedBy",
    "defectFactorDependentPassedInLocal",
];

pub fn columns(extended: bool) -> Vec<&'static str> {
    let mut cols = BASE_COLUMNS.to_vec();
    if extended {
        cols.extend_from_slice(&EXTENDED_COLUMNS);
    }
    cols
}

enum Field<'a> {
    Text(&'a str),
    Number(u64),
}

/// Quote a text field
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\"\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

fn render_row(fields: &[Field<'_>]) -> String {
    fields
        .iter()
        .map(|f| match f {
            Field::Text(s) => quote(s),
            Field::Number(n) => n.to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Render the detailed per-test CSV
pub fn render_detailed(records: &[TestOutcomeRecord], extended: bool) -> String {
    let mut out = columns(extended).join(",");
    out.push('\n');

    for r in records {
        let start = r.start_time.to_rfc3339_opts(SecondsFormat::Millis, true);
        let end = r.end_time.to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut fields = vec![
            Field::Text(&r.test_id),
            Field::Text(&r.spec_file),
            Field::Number(r.duration_ms),
            Field::Text(r.status.as_str()),
            Field::Text(&start),
            Field::Text(&end),
            Field::Text(&r.suite),
            Field::Text(&r.test_class),
            Field::Text(&r.test_method),
            Field::Text(&r.error_message),
            Field::Text(&r.error_type),
            Field::Text(&r.error_stack),
        ];
        if extended {
            fields.extend([
                Field::Text(&r.reason),
                Field::Text(&r.action_item),
                Field::Text(&r.action),
                Field::Text(&r.local_run),
                Field::Text(&r.detected_by),
                Field::Text(&r.defect_factor_dependent_passed_in_local),
            ]);
        }
        out.push_str(&render_row(&fields));
        out.push('\n');
    }
    out
}

/// Render `test-summary.csv`: counts first, then run metadata
pub fn render_summary(summary: &RunSummary, env: &EnvironmentSnapshot) -> String {
    let counts = [
        ("totalTests", summary.total.to_string()),
        ("totalPassed", summary.passed.to_string()),
        ("totalFailed", summary.failed.to_string()),
        ("totalPending", summary.pending.to_string()),
        ("totalSkipped", summary.skipped.to_string()),
        ("totalUnknown", summary.unknown.to_string()),
        ("totalDuration", summary.total_duration_ms.to_string()),
        ("passPercentage", summary.pass_percentage_display()),
    ];
    let metadata = [
        ("baseUrl", env.base_url.as_str()),
        ("executionContext", env.execution_context.as_str()),
        ("branch", env.branch.as_str()),
        ("buildId", env.build_id.as_str()),
    ];

    let mut out = String::from("key,value\n");
    for (key, value) in counts {
        out.push_str(&format!("{},{}\n", key, value));
    }
    for (key, value) in metadata {
        out.push_str(&format!("{},{}\n", key, quote(value)));
    }
    out.push_str(&format!("capturedAt,{}\n", quote(&env.captured_at_display())));
    out
}

/// A parsed CSV file with a header row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn parse(text: &str) -> ReportResult<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.is_empty());

        let headers = match lines.next() {
            Some((idx, line)) => parse_line(line, idx + 1)?,
            None => return Ok(Self::default()),
        };

        let mut rows = Vec::new();
        for (idx, line) in lines {
            let row = parse_line(line, idx + 1)?;
            if row.len() != headers.len() {
                return Err(ReportError::Csv {
                    line: idx + 1,
                    reason: format!("expected {} fields, found {}", headers.len(), row.len()),
                });
            }
            rows.push(row);
        }
        Ok(Self { headers, rows })
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn value(&self, row: usize, name: &str) -> Option<&str> {
        let col = self.column(name)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

/// Split one physical line into unescaped fields
pub fn parse_line(line: &str, line_no: usize) -> ReportResult<Vec<String>> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        let mut field = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' if chars.peek() == Some(&'"') => {
                        chars.next();
                        field.push('"');
                    }
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.peek() {
                        Some('n') => {
                            chars.next();
                            field.push('\n');
                        }
                        Some('r') => {
                            chars.next();
                            field.push('\r');
                        }
                        Some('\\') => {
                            chars.next();
                            field.push('\\');
                        }
                        _ => field.push('\\'),
                    },
                    _ => field.push(c),
                }
            }
            if !closed {
                return Err(ReportError::Csv {
                    line: line_no,
                    reason: "unterminated quoted field".to_string(),
                });
            }
            match chars.next() {
                None => {
                    fields.push(field);
                    return Ok(fields);
                }
                Some(',') => fields.push(field),
                Some(other) => {
                    return Err(ReportError::Csv {
                        line: line_no,
                        reason: format!("unexpected '{}' after closing quote", other),
                    })
                }
            }
        } else {
            loop {
                match chars.next() {
                    None => {
                        fields.push(field);
                        return Ok(fields);
                    }
                    Some(',') => {
                        fields.push(field);
                        break;
                    }
                    Some(c) => field.push(c),
                }
            }
        }
    }
}
