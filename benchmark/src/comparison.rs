// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Baseline-relative comparison of benchmark results.
//!
//! Throughput and memory ratios are candidate / baseline. Latency and cold
//! start speedups are baseline / candidate, so values above 1 favor the
//! candidate for speed and values below 1 favor it for memory.

use conduit_bench_core::{FrameworkName, WorkloadName};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::{BenchmarkReport, BenchmarkResult};

/// Comparison errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    #[error("At least 2 results are needed for a comparison, have {available}")]
    InsufficientResults { available: usize },

    #[error("Baseline framework not found among results: {name}")]
    BaselineNotFound { name: String },
}

/// One candidate result against the baseline result of the same workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub baseline: FrameworkName,
    pub candidate: FrameworkName,
    pub workload: WorkloadName,
    pub throughput_ratio: Option<f64>,
    pub memory_ratio: Option<f64>,
    pub avg_latency_speedup: Option<f64>,
    pub p95_latency_speedup: Option<f64>,
    pub p99_latency_speedup: Option<f64>,
    pub cold_start_speedup: Option<f64>,
}

impl Comparison {
    /// How many times less memory the candidate uses.
    pub fn memory_reduction(&self) -> Option<f64> {
        self.memory_ratio.and_then(|r| ratio(1.0, r))
    }
}

/// `numerator / denominator`, undefined for a zero or non-finite input.
fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if numerator.is_finite() && denominator.is_finite() && denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

fn ratio_opt(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    ratio(numerator?, denominator?)
}

fn compare_pair(baseline: &BenchmarkResult, candidate: &BenchmarkResult) -> Comparison {
    Comparison {
        baseline: baseline.framework.clone(),
        candidate: candidate.framework.clone(),
        workload: candidate.workload.clone(),
        throughput_ratio: ratio(candidate.throughput, baseline.throughput),
        memory_ratio: ratio(candidate.memory_mb, baseline.memory_mb),
        avg_latency_speedup: ratio_opt(baseline.avg_ms(), candidate.avg_ms()),
        p95_latency_speedup: ratio_opt(baseline.p95_ms(), candidate.p95_ms()),
        p99_latency_speedup: ratio_opt(baseline.p99_ms(), candidate.p99_ms()),
        cold_start_speedup: ratio(baseline.cold_start_ms, candidate.cold_start_ms),
    }
}

/// Accumulates results in test order and compares them to a baseline.
#[derive(Debug, Default, Clone)]
pub struct ComparisonReporter {
    results: Vec<BenchmarkResult>,
}

impl ComparisonReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a saved report.
    pub fn from_report(report: &BenchmarkReport) -> Self {
        Self {
            results: report.results.clone(),
        }
    }

    pub fn add_result(&mut self, result: BenchmarkResult) {
        self.results.push(result);
    }

    pub fn results(&self) -> &[BenchmarkResult] {
        &self.results
    }

    /// Pair every non-baseline result with the baseline result of the same
    /// workload. Candidates whose workload the baseline never ran are skipped.
    pub fn compare(&self, baseline: &str) -> Result<Vec<Comparison>, CompareError> {
        if self.results.len() < 2 {
            return Err(CompareError::InsufficientResults {
                available: self.results.len(),
            });
        }

        if !self
            .results
            .iter()
            .any(|r| r.framework.as_str() == baseline)
        {
            return Err(CompareError::BaselineNotFound {
                name: baseline.to_string(),
            });
        }

        let comparisons = self
            .results
            .iter()
            .filter(|r| r.framework.as_str() != baseline)
            .filter_map(|candidate| {
                let base = self
                    .results
                    .iter()
                    .find(|r| r.framework.as_str() == baseline && r.workload == candidate.workload);
                if base.is_none() {
                    tracing::debug!(
                        candidate = %candidate.framework,
                        workload = %candidate.workload,
                        "No baseline result for workload, skipping"
                    );
                }
                base.map(|base| compare_pair(base, candidate))
            })
            .collect();

        Ok(comparisons)
    }
}
