//! Report writer: serialises a finished run to the destination directory

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{DetailedCsvName, ReportConfig, ReportingCapabilities};
use crate::csv;
use crate::enrich;
use crate::environment::EnvironmentSnapshot;
use crate::error::ReportResult;
use crate::model::{RunSummary, TestOutcomeRecord};

pub const ENVIRONMENT_FILE: &str = "environment.properties";
pub const SUMMARY_FILE: &str = "test-summary.csv";

/// Writer settings resolved from configuration and capabilities
#[derive(Debug, Clone)]
pub struct WriterOptions {
    pub detailed_csv: DetailedCsvName,
    pub extended_columns: bool,
    pub enrichment: bool,
    /// Native results location; `None` means the destination directory
    pub native_results_dir: Option<PathBuf>,
    pub allure_results_dir: Option<PathBuf>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            detailed_csv: DetailedCsvName::default(),
            extended_columns: true,
            enrichment: true,
            native_results_dir: None,
            allure_results_dir: None,
        }
    }
}

impl WriterOptions {
    pub fn from_config(config: &ReportConfig, caps: ReportingCapabilities) -> Self {
        Self {
            detailed_csv: config.detailed_csv,
            extended_columns: config.extended_columns,
            enrichment: caps.enrichment,
            native_results_dir: config.native_results_dir.clone(),
            allure_results_dir: if caps.allure {
                config.allure_results_dir.clone()
            } else {
                None
            },
        }
    }
}

/// What a flush produced
#[derive(Debug, Clone)]
pub struct FlushOutcome {
    pub environment_path: PathBuf,
    pub detailed_path: PathBuf,
    pub summary_path: PathBuf,
    pub allure_environment_path: Option<PathBuf>,
    pub summary: RunSummary,
    /// Records whose failure text was patched from native results
    pub enriched: usize,
    pub enrichment_error: Option<String>,
}

pub struct ReportWriter {
    options: WriterOptions,
}

impl ReportWriter {
    pub fn new(options: WriterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Write the environment, detailed and summary files, then try enrichment.
    ///
    /// Every file is overwritten in full and nothing here reads the clock, so
    /// identical inputs give identical files.
    pub fn flush(
        &self,
        records: &[TestOutcomeRecord],
        env: &EnvironmentSnapshot,
        destination: &Path,
    ) -> ReportResult<FlushOutcome> {
        std::fs::create_dir_all(destination)?;

        let properties = render_properties(env);
        let environment_path = destination.join(ENVIRONMENT_FILE);
        write_file(&environment_path, &properties)?;

        let detailed_path = destination.join(self.options.detailed_csv.file_name());
        write_file(
            &detailed_path,
            &csv::render_detailed(records, self.options.extended_columns),
        )?;

        let summary = RunSummary::from_records(records);
        let summary_path = destination.join(SUMMARY_FILE);
        write_file(&summary_path, &csv::render_summary(&summary, env))?;

        let allure_environment_path = self
            .options
            .allure_results_dir
            .as_deref()
            .and_then(|dir| match write_allure_environment(dir, &properties) {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Could not write Allure environment to {}: {}", dir.display(), e);
                    None
                }
            });

        let mut outcome = FlushOutcome {
            environment_path,
            detailed_path,
            summary_path,
            allure_environment_path,
            summary,
            enriched: 0,
            enrichment_error: None,
        };

        if self.options.enrichment {
            let native_dir = self
                .options
                .native_results_dir
                .clone()
                .unwrap_or_else(|| destination.to_path_buf());
            match self.enrich(records, &native_dir, &outcome.detailed_path) {
                Ok(patched) => outcome.enriched = patched,
                Err(e) => {
                    warn!("Skipping failure enrichment: {}", e);
                    outcome.enrichment_error = Some(e.to_string());
                }
            }
        }

        info!(
            "Reports written to {} ({} tests, {} failed)",
            destination.display(),
            outcome.summary.total,
            outcome.summary.failed
        );
        Ok(outcome)
    }

    fn enrich(
        &self,
        records: &[TestOutcomeRecord],
        native_dir: &Path,
        detailed_path: &Path,
    ) -> ReportResult<usize> {
        let failures = enrich::load_native_failures(native_dir)?;
        if failures.is_empty() {
            return Ok(0);
        }

        let mut patched = records.to_vec();
        let count = enrich::apply_native_failures(&mut patched, &failures);
        if count > 0 {
            write_file(
                detailed_path,
                &csv::render_detailed(&patched, self.options.extended_columns),
            )?;
            info!("Enriched {} failed test(s) from {}", count, native_dir.display());
        }
        Ok(count)
    }
}

/// `key=value` lines, newline-joined
pub fn render_properties(env: &EnvironmentSnapshot) -> String {
    env.properties()
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, escape_property(&value)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escape a value the way `java.util.Properties` reads it back
fn escape_property(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

fn write_allure_environment(dir: &Path, properties: &str) -> ReportResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(ENVIRONMENT_FILE);
    write_file(&path, properties)?;
    Ok(path)
}

fn write_file(path: &Path, content: &str) -> ReportResult<()> {
    std::fs::write(path, content)?;
    info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use chrono::{TimeZone, Utc};

    fn env() -> EnvironmentSnapshot {
        EnvironmentSnapshot {
            platform: "linux".to_string(),
            platform_version: "6.8.0".to_string(),
            runtime_version: "v20.11.1".to_string(),
            base_url: "https://my-shop-eight-theta.vercel.app/".to_string(),
            execution_context: "Local".to_string(),
            branch: "unknown".to_string(),
            build_id: "local".to_string(),
            captured_at: Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_render_properties() {
        let text = render_properties(&env());
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Platform=linux");
        assert_eq!(lines[3], "Base.URL=https://my-shop-eight-theta.vercel.app/");
        assert_eq!(lines[4], "Execution.Context=Local");
        assert_eq!(lines.len(), 8);
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn test_render_properties_escapes_control_characters() {
        let mut env = env();
        env.branch = "feature\\win\r\nfix".to_string();
        env.base_url = "C:\\runs\\site".to_string();

        let text = render_properties(&env);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[3], r"Base.URL=C:\\runs\\site");
        assert_eq!(lines[5], r"Branch=feature\\win\r\nfix");
    }

    #[test]
    fn test_allure_copy_written_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let config = ReportConfig {
            allure_results_dir: Some(dir.path().join("allure-results")),
            ..Default::default()
        };
        let options = WriterOptions::from_config(&config, ReportingCapabilities::detect(&config));
        let outcome = ReportWriter::new(options)
            .flush(&[], &env(), &dir.path().join("out"))
            .unwrap();

        let allure = outcome.allure_environment_path.unwrap();
        assert_eq!(
            std::fs::read_to_string(allure).unwrap(),
            std::fs::read_to_string(outcome.environment_path).unwrap()
        );
    }

    #[test]
    fn test_allure_disabled_skips_copy() {
        let config = ReportConfig {
            allure_results_dir: Some(PathBuf::from("allure-results")),
            allure: false,
            ..Default::default()
        };
        let options = WriterOptions::from_config(&config, ReportingCapabilities::detect(&config));
        assert!(options.allure_results_dir.is_none());
    }

    #[test]
    fn test_alternate_detailed_name() {
        let dir = tempfile::tempdir().unwrap();
        let options = WriterOptions {
            detailed_csv: DetailedCsvName::TestResultsDetailed,
            enrichment: false,
            ..Default::default()
        };
        let outcome = ReportWriter::new(options).flush(&[], &env(), dir.path()).unwrap();
        assert!(outcome.detailed_path.ends_with("test-results-detailed.csv"));
        assert!(outcome.detailed_path.exists());
        assert!(outcome.enrichment_error.is_none());
    }
}
