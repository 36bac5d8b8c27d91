//! Run environment capture
//!
//! [`capture_environment`] is a pure function over [`EnvironmentInputs`]; only
//! [`EnvironmentInputs::from_process`] touches the real process.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::process::Command;

use crate::raw::RunnerConfig;

pub const UNKNOWN: &str = "unknown";
pub const LOCAL_BUILD: &str = "local";
pub const LOCAL_CONTEXT: &str = "Local";

/// Variables carrying a CI build number, most specific first
const BUILD_NUMBER_VARS: &[&str] = &[
    "BUILD_NUMBER",
    "GITHUB_RUN_NUMBER",
    "CI_PIPELINE_IID",
    "CIRCLE_BUILD_NUM",
];
const BRANCH_VARS: &[&str] = &["BRANCH_NAME", "GIT_BRANCH", "GITHUB_REF_NAME", "CI_COMMIT_REF_NAME"];
const BUILD_ID_VARS: &[&str] = &["BUILD_ID", "GITHUB_RUN_ID", "CI_PIPELINE_ID"];

/// Facts the environment snapshot is derived from
#[derive(Debug, Clone, Default)]
pub struct EnvironmentInputs {
    pub platform: Option<String>,
    pub platform_version: Option<String>,
    pub runtime_version: Option<String>,
    pub vars: BTreeMap<String, String>,
    pub captured_at: DateTime<Utc>,
}

impl EnvironmentInputs {
    /// Gather inputs from the running process
    pub fn from_process() -> Self {
        Self {
            platform: Some(std::env::consts::OS.to_string()),
            platform_version: command_output("uname", &["-r"]),
            runtime_version: command_output("node", &["--version"]),
            vars: std::env::vars().collect(),
            captured_at: Utc::now(),
        }
    }
}

fn command_output(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Environment facts for one run, captured once before any report is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentSnapshot {
    pub platform: String,
    pub platform_version: String,
    pub runtime_version: String,
    pub base_url: String,
    pub execution_context: String,
    pub branch: String,
    pub build_id: String,
    pub captured_at: DateTime<Utc>,
}

impl EnvironmentSnapshot {
    pub fn is_local(&self) -> bool {
        self.execution_context == LOCAL_CONTEXT
    }

    /// Key/value pairs in the order they are written to `environment.properties`
    pub fn properties(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Platform", self.platform.clone()),
            ("Platform.Version", self.platform_version.clone()),
            ("Runtime.Version", self.runtime_version.clone()),
            ("Base.URL", self.base_url.clone()),
            ("Execution.Context", self.execution_context.clone()),
            ("Branch", self.branch.clone()),
            ("Build.Id", self.build_id.clone()),
            ("Captured.At", self.captured_at_display()),
        ]
    }

    pub fn captured_at_display(&self) -> String {
        self.captured_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

fn first_var(vars: &BTreeMap<String, String>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| vars.get(*k))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

fn or_unknown(value: Option<&String>) -> String {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// Build the run's environment snapshot
pub fn capture_environment(config: &RunnerConfig, inputs: &EnvironmentInputs) -> EnvironmentSnapshot {
    let execution_context = match first_var(&inputs.vars, BUILD_NUMBER_VARS) {
        Some(build) => format!("CI Build #{}", build),
        None => LOCAL_CONTEXT.to_string(),
    };

    EnvironmentSnapshot {
        platform: or_unknown(inputs.platform.as_ref()),
        platform_version: or_unknown(inputs.platform_version.as_ref()),
        runtime_version: or_unknown(
            config
                .runner_version
                .as_ref()
                .filter(|v| !v.trim().is_empty())
                .or(inputs.runtime_version.as_ref()),
        ),
        base_url: or_unknown(config.base_url.as_ref()),
        execution_context,
        branch: first_var(&inputs.vars, BRANCH_VARS).unwrap_or_else(|| UNKNOWN.to_string()),
        build_id: first_var(&inputs.vars, BUILD_ID_VARS).unwrap_or_else(|| LOCAL_BUILD.to_string()),
        captured_at: inputs.captured_at,
    }
}
