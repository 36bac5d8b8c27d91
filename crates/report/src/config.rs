//! Reporting configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ReportResult;

/// Reporting configuration, usually read from `runledger.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory receiving the CSV and properties files
    pub output_dir: PathBuf,

    /// Which file name the detailed CSV is written under
    pub detailed_csv: DetailedCsvName,

    /// Append the triage columns after the base columns
    pub extended_columns: bool,

    /// Patch failure text from native (mochawesome) result files
    pub enrichment: bool,

    /// Where native result files live; defaults to `output_dir`
    pub native_results_dir: Option<PathBuf>,

    /// Allure results directory, receives a copy of `environment.properties`
    pub allure_results_dir: Option<PathBuf>,

    /// Master switch for the Allure copy
    pub allure: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("cypress/results"),
            detailed_csv: DetailedCsvName::default(),
            extended_columns: true,
            enrichment: true,
            native_results_dir: None,
            allure_results_dir: None,
            allure: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailedCsvName {
    #[default]
    DataSuites,
    TestResultsDetailed,
}

impl DetailedCsvName {
    pub fn file_name(&self) -> &'static str {
        match self {
            DetailedCsvName::DataSuites => "data_suites.csv",
            DetailedCsvName::TestResultsDetailed => "test-results-detailed.csv",
        }
    }
}

impl ReportConfig {
    /// Load configuration from file, falling back to defaults when it is absent
    pub fn load(path: &Path) -> ReportResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> ReportResult<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Directory scanned for native result files
    pub fn native_results_dir(&self) -> PathBuf {
        self.native_results_dir
            .clone()
            .unwrap_or_else(|| self.output_dir.clone())
    }
}

/// Optional reporting features, decided once when the run starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportingCapabilities {
    pub allure: bool,
    pub enrichment: bool,
}

impl ReportingCapabilities {
    pub fn detect(config: &ReportConfig) -> Self {
        let caps = Self {
            allure: config.allure && config.allure_results_dir.is_some(),
            enrichment: config.enrichment,
        };
        debug!(allure = caps.allure, enrichment = caps.enrichment, "Reporting capabilities");
        caps
    }
}
