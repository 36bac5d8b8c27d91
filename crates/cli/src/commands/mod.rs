//! CLI Commands

use anyhow::{Context, Result};
use std::path::Path;

use runledger_report::ReportConfig;

pub mod env;
pub mod ingest;
pub mod summary;

/// Load the reporting configuration, defaults when the file is absent
pub fn load_config(path: &Path) -> Result<ReportConfig> {
    ReportConfig::load(path).with_context(|| format!("Failed to load config {}", path.display()))
}
