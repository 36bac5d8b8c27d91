//! runledger report pipeline
//!
//! Collects per-test outcomes from an external browser test runner and writes
//! them out once the run completes:
//! - a detailed CSV with one row per test
//! - a `key,value` summary CSV
//! - an Allure-style `environment.properties`
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         RunContext                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  init(config, runner, inputs)                               │
//! │    ├── capture_environment() -> EnvironmentSnapshot         │
//! │    └── ReportingCapabilities::detect()                      │
//! │  on_spec_complete(spec, [RawTestResult])                    │
//! │    └── ResultCollector -> [TestOutcomeRecord]               │
//! │  on_run_complete(aggregate)                                 │
//! │    └── ReportWriter::flush()                                │
//! │          ├── environment.properties                         │
//! │          ├── data_suites.csv                                │
//! │          ├── test-summary.csv                               │
//! │          └── mochawesome enrichment (optional)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod collector;
pub mod config;
pub mod csv;
pub mod enrich;
pub mod environment;
pub mod error;
pub mod model;
pub mod raw;
pub mod run;
pub mod writer;

pub use collector::ResultCollector;
pub use config::{ReportConfig, ReportingCapabilities};
pub use environment::{capture_environment, EnvironmentInputs, EnvironmentSnapshot};
pub use error::{ReportError, ReportResult};
pub use model::{RunSummary, TestOutcomeRecord, TestStatus};
pub use raw::{RawError, RawRunAggregate, RawTestResult, RunnerConfig};
pub use run::RunContext;
pub use writer::{FlushOutcome, ReportWriter, WriterOptions};
