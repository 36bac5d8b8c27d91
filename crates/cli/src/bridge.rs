//! Runner event bridge
//!
//! The runner-side reporter emits one JSON object per line:
//!
//! ```text
//! {"event":"config","baseUrl":"https://...","runnerVersion":"13.6.4"}
//! {"event":"spec:complete","spec":"login.cy.ts","results":[...]}
//! {"event":"run:complete","totalTests":7,"totalPassed":6,...}
//! ```
//!
//! `config` is optional and only honoured before the first spec.

use serde::Deserialize;
use tracing::{debug, warn};

use runledger_report::{
    EnvironmentInputs, FlushOutcome, RawRunAggregate, RawTestResult, ReportConfig, ReportResult,
    RunContext, RunnerConfig,
};

#[derive(Debug, Deserialize)]
#[serde(tag = "event")]
pub enum RunnerEvent {
    #[serde(rename = "config")]
    Config(RunnerConfig),

    #[serde(rename = "spec:complete")]
    SpecComplete {
        #[serde(default)]
        spec: String,
        #[serde(default)]
        results: Vec<RawTestResult>,
    },

    #[serde(rename = "run:complete")]
    RunComplete(RawRunAggregate),
}

impl RunnerEvent {
    pub fn parse(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }
}

/// Feeds runner events into a lazily started `RunContext`
pub struct Bridge {
    config: ReportConfig,
    runner: RunnerConfig,
    inputs: Option<EnvironmentInputs>,
    run: Option<RunContext>,
    outcome: Option<FlushOutcome>,
    skipped_lines: usize,
}

impl Bridge {
    /// `runner` holds fallbacks for values the `config` event leaves out
    pub fn new(config: ReportConfig, runner: RunnerConfig, inputs: EnvironmentInputs) -> Self {
        Self {
            config,
            runner,
            inputs: Some(inputs),
            run: None,
            outcome: None,
            skipped_lines: 0,
        }
    }

    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    pub fn is_complete(&self) -> bool {
        self.outcome.is_some()
    }

    /// Handle one line of the event stream. Unparseable lines are skipped.
    pub fn handle_line(&mut self, line: &str) -> ReportResult<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        match RunnerEvent::parse(line) {
            Ok(event) => self.handle_event(event),
            Err(e) => {
                self.skipped_lines += 1;
                warn!("Skipping unreadable event: {}", e);
                Ok(())
            }
        }
    }

    pub fn handle_event(&mut self, event: RunnerEvent) -> ReportResult<()> {
        if self.outcome.is_some() {
            warn!("Ignoring event received after run completion");
            return Ok(());
        }

        match event {
            RunnerEvent::Config(config) => {
                if self.run.is_some() {
                    warn!("Ignoring config event received after the run started");
                } else {
                    self.runner = RunnerConfig {
                        base_url: config.base_url.or(self.runner.base_url.take()),
                        runner_version: config.runner_version.or(self.runner.runner_version.take()),
                    };
                }
            }
            RunnerEvent::SpecComplete { spec, results } => {
                let spec = if spec.trim().is_empty() {
                    "unknown spec".to_string()
                } else {
                    spec
                };
                let added = self.run_context().on_spec_complete(&spec, &results)?;
                debug!(spec = %spec, added, "Spec completed");
            }
            RunnerEvent::RunComplete(aggregate) => {
                let outcome = self.run_context().on_run_complete(Some(&aggregate))?;
                self.outcome = Some(outcome);
            }
        }
        Ok(())
    }

    /// Close the stream, flushing whatever was collected if `run:complete` never came
    pub fn finish(mut self) -> ReportResult<FlushOutcome> {
        if let Some(outcome) = self.outcome.take() {
            return Ok(outcome);
        }
        warn!("Event stream ended without run completion, writing collected results");
        self.run_context().on_run_complete(None)
    }

    fn run_context(&mut self) -> &mut RunContext {
        let config = &self.config;
        let runner = &self.runner;
        let inputs = &mut self.inputs;
        self.run.get_or_insert_with(|| {
            let inputs = inputs.take().unwrap_or_else(EnvironmentInputs::from_process);
            RunContext::init(config, runner, &inputs)
        })
    }
}
