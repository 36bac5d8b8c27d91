//! Environment Command

use anyhow::Result;
use clap::Args;

use runledger_report::{capture_environment, EnvironmentInputs, EnvironmentSnapshot, RunnerConfig};

use crate::output::{print_item, OutputFormat, TableDisplay};

#[derive(Args)]
pub struct EnvArgs {
    /// Base URL to record
    #[arg(long, env = "RUNLEDGER_BASE_URL")]
    base_url: Option<String>,
}

impl TableDisplay for EnvironmentSnapshot {
    fn headers() -> Vec<&'static str> {
        properties_headers()
    }

    fn row(&self) -> Vec<String> {
        self.properties().into_iter().map(|(_, v)| v).collect()
    }
}

fn properties_headers() -> Vec<&'static str> {
    vec![
        "Platform",
        "Platform.Version",
        "Runtime.Version",
        "Base.URL",
        "Execution.Context",
        "Branch",
        "Build.Id",
        "Captured.At",
    ]
}

pub fn execute(args: EnvArgs, format: OutputFormat) -> Result<i32> {
    let runner = RunnerConfig {
        base_url: args.base_url,
        runner_version: None,
    };
    let snapshot = capture_environment(&runner, &EnvironmentInputs::from_process());
    print_item(&snapshot, format);
    Ok(0)
}
