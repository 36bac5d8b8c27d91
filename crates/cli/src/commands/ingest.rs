//! Ingest Command
//!
//! Reads the runner's NDJSON event stream and writes the reports.

use anyhow::{Context, Result};
use clap::Args;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{info, warn};

use runledger_report::{EnvironmentInputs, ReportConfig, RunnerConfig};

use super::summary::SummaryDisplay;
use crate::bridge::Bridge;
use crate::output::{print_item, print_warning, print_written_reports, OutputFormat};

#[derive(Args)]
pub struct IngestArgs {
    /// Event stream file, `-` for stdin
    #[arg(short, long, default_value = "-")]
    events: String,

    /// Report directory
    #[arg(short, long, env = "RUNLEDGER_OUTPUT_DIR")]
    output: Option<PathBuf>,

    /// Base URL recorded when the runner sends no config event
    #[arg(long, env = "RUNLEDGER_BASE_URL")]
    base_url: Option<String>,

    /// Directory holding mochawesome JSON results
    #[arg(long)]
    native_results: Option<PathBuf>,

    /// Allure results directory for environment.properties
    #[arg(long, env = "RUNLEDGER_ALLURE_RESULTS")]
    allure_results: Option<PathBuf>,

    /// Skip patching failures from native result files
    #[arg(long)]
    no_enrichment: bool,

    /// Write only the base CSV columns
    #[arg(long)]
    basic_columns: bool,
}

impl IngestArgs {
    fn apply(&self, mut config: ReportConfig) -> ReportConfig {
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(dir) = &self.native_results {
            config.native_results_dir = Some(dir.clone());
        }
        if let Some(dir) = &self.allure_results {
            config.allure_results_dir = Some(dir.clone());
        }
        if self.no_enrichment {
            config.enrichment = false;
        }
        if self.basic_columns {
            config.extended_columns = false;
        }
        config
    }
}

pub async fn execute(args: IngestArgs, config_path: &Path, format: OutputFormat) -> Result<i32> {
    let config = args.apply(super::load_config(config_path)?);
    let runner = RunnerConfig {
        base_url: args.base_url.clone(),
        runner_version: None,
    };

    let reader: Box<dyn AsyncRead + Unpin + Send> = if args.events == "-" {
        Box::new(tokio::io::stdin())
    } else {
        let file = tokio::fs::File::open(&args.events)
            .await
            .with_context(|| format!("Failed to open event stream {}", args.events))?;
        Box::new(file)
    };

    info!("Reading runner events from {}", if args.events == "-" { "stdin" } else { args.events.as_str() });

    let mut bridge = Bridge::new(config, runner, EnvironmentInputs::from_process());
    feed_events(reader, &mut bridge).await?;

    if bridge.skipped_lines() > 0 {
        print_warning(&format!("Skipped {} unreadable event line(s)", bridge.skipped_lines()));
    }
    if !bridge.is_complete() {
        print_warning("Runner never reported run completion; writing what was collected");
    }

    let outcome = bridge.finish().context("Failed to write reports")?;
    if let Some(err) = &outcome.enrichment_error {
        print_warning(&format!("Failure enrichment skipped: {}", err));
    }
    print_written_reports(&outcome);
    print_item(&SummaryDisplay::from(&outcome.summary), format);

    Ok(if outcome.summary.failed > 0 { 1 } else { 0 })
}

/// Pass every line of `reader` to the bridge. Lines that are not valid UTF-8
/// are decoded lossily, so they still reach the bridge and count as skipped
/// when they no longer parse.
async fn feed_events<R: AsyncRead + Unpin>(reader: R, bridge: &mut Bridge) -> Result<()> {
    let mut segments = BufReader::new(reader).split(b'\n');
    let mut line_no = 0usize;
    while let Some(bytes) = segments.next_segment().await.context("Failed to read event stream")? {
        line_no += 1;
        let line = String::from_utf8_lossy(&bytes);
        if matches!(line, Cow::Owned(_)) {
            warn!(line = line_no, "Event line is not valid UTF-8");
        }
        bridge.handle_line(&line)?;
    }
    Ok(())
}
