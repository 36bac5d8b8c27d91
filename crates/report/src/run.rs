//! Run context: owns the collector and drives the lifecycle hooks

use std::path::PathBuf;
use tracing::{info, warn};

use crate::collector::ResultCollector;
use crate::config::{ReportConfig, ReportingCapabilities};
use crate::environment::{capture_environment, EnvironmentInputs, EnvironmentSnapshot};
use crate::error::{ReportError, ReportResult};
use crate::model::{RunSummary, TestOutcomeRecord};
use crate::raw::{RawRunAggregate, RawTestResult, RunnerConfig};
use crate::writer::{FlushOutcome, ReportWriter, WriterOptions};

/// State for one test run, from setup to the final flush
pub struct RunContext {
    environment: EnvironmentSnapshot,
    capabilities: ReportingCapabilities,
    collector: ResultCollector,
    writer: ReportWriter,
    output_dir: PathBuf,
    finished: bool,
}

impl RunContext {
    /// Capture the environment and decide capabilities, once per run
    pub fn init(config: &ReportConfig, runner: &RunnerConfig, inputs: &EnvironmentInputs) -> Self {
        let environment = capture_environment(runner, inputs);
        let capabilities = ReportingCapabilities::detect(config);
        let collector = ResultCollector::new(environment.captured_at, environment.is_local());

        info!(
            "Run started against {} ({})",
            environment.base_url, environment.execution_context
        );

        Self {
            writer: ReportWriter::new(WriterOptions::from_config(config, capabilities)),
            output_dir: config.output_dir.clone(),
            environment,
            capabilities,
            collector,
            finished: false,
        }
    }

    pub fn environment(&self) -> &EnvironmentSnapshot {
        &self.environment
    }

    pub fn capabilities(&self) -> ReportingCapabilities {
        self.capabilities
    }

    pub fn records(&self) -> &[TestOutcomeRecord] {
        self.collector.records()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Hook: one spec file finished
    pub fn on_spec_complete(&mut self, spec: &str, results: &[RawTestResult]) -> ReportResult<usize> {
        if self.finished {
            return Err(ReportError::RunFinished("spec completion"));
        }
        Ok(self.collector.record_spec_completion(spec, results))
    }

    /// Hook: the whole run finished. Flushes the reports exactly once.
    pub fn on_run_complete(&mut self, aggregate: Option<&RawRunAggregate>) -> ReportResult<FlushOutcome> {
        if self.finished {
            return Err(ReportError::RunFinished("run completion"));
        }
        self.finished = true;

        let summary = self.collector.summary();
        if let Some(aggregate) = aggregate {
            for mismatch in aggregate_mismatches(aggregate, &summary) {
                warn!("Runner totals disagree with collected results: {}", mismatch);
            }
        }

        let records = self.collector.drain();
        self.writer.flush(&records, &self.environment, &self.output_dir)
    }
}

fn aggregate_mismatches(aggregate: &RawRunAggregate, summary: &RunSummary) -> Vec<String> {
    let pairs = [
        ("totalTests", aggregate.total_tests, summary.total),
        ("totalPassed", aggregate.total_passed, summary.passed),
        ("totalFailed", aggregate.total_failed, summary.failed),
        ("totalPending", aggregate.total_pending, summary.pending),
        ("totalSkipped", aggregate.total_skipped, summary.skipped),
    ];
    pairs
        .into_iter()
        .filter_map(|(name, reported, collected)| {
            let reported = reported?;
            (reported != collected as u64)
                .then(|| format!("{} reported {} but collected {}", name, reported, collected))
        })
        .collect()
}
