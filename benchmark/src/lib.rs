// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! conduit-bench Benchmarking Framework
//!
//! Measures and compares HTTP frameworks serving the same workloads.
//!
//! # Pipeline
//!
//! - **Driver**: issues single, streaming or pipeline operations one at a time
//! - **Statistics**: nearest-rank percentiles and unit-aware throughput
//! - **Runner**: starts each framework, runs workloads, profiles and stops it
//! - **Comparison**: baseline-relative throughput, memory and latency ratios
//!
//! # Data Output
//!
//! Reports are saved as timestamped JSON files and rendered as console tables.

pub mod comparison;
pub mod harness;
pub mod metrics;
pub mod reporter;
pub mod runner;
pub mod table;

pub use comparison::{CompareError, Comparison, ComparisonReporter};
pub use harness::{DriverError, LineCounter, WorkloadDriver, WorkloadRun};
pub use metrics::{
    format_latency, percentile, BenchmarkReport, BenchmarkResult, FailureStage, FrameworkFailure,
    LatencySummary, RunMetrics, Sample, SystemInfo,
};
pub use reporter::{JsonReporter, ReporterError};
pub use runner::{BenchmarkRunner, FrameworkOutcome, RunError, RunOptions};
