// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Samples, statistics and the benchmark report model.
//!
//! Percentiles use the nearest-rank convention: sort ascending, take
//! rank = ceil(p * n / 100) and report `sorted[rank - 1]`. Latency
//! statistics are computed over successful samples only and are left
//! undefined when fewer than two exist.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use conduit_bench_core::{FrameworkName, StatsError, WorkloadKind, WorkloadName};
use serde::{Deserialize, Serialize};
use sysinfo::System;
use uuid::Uuid;

/// Fewest successful samples for which latency statistics are defined.
pub const MIN_SAMPLES: usize = 2;

/// One measured operation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Elapsed time in seconds.
    pub duration_secs: f64,
    pub succeeded: bool,
    /// Logical units this operation produced (batch items, stream chunks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_count: Option<u64>,
}

impl Sample {
    pub fn success(duration: Duration, unit_count: Option<u64>) -> Self {
        Self {
            duration_secs: duration.as_secs_f64(),
            succeeded: true,
            unit_count,
        }
    }

    pub fn failure(duration: Duration) -> Self {
        Self {
            duration_secs: duration.as_secs_f64(),
            succeeded: false,
            unit_count: None,
        }
    }

    /// Units credited toward throughput. Requests without a count are one unit.
    pub fn units(&self) -> u64 {
        if self.succeeded {
            self.unit_count.unwrap_or(1)
        } else {
            0
        }
    }
}

/// Nearest-rank percentile of an ascending slice.
pub fn percentile(sorted: &[f64], p: u8) -> Result<f64, StatsError> {
    if p == 0 || p > 100 {
        return Err(StatsError::InvalidPercentile(p));
    }
    let n = sorted.len();
    if n == 0 {
        return Err(StatsError::InsufficientSamples {
            required: 1,
            available: 0,
        });
    }
    // ceil(p * n / 100) without floating point
    let rank = (usize::from(p) * n).div_ceil(100).max(1);
    Ok(sorted[rank - 1])
}

/// Latency distribution of the successful samples of a run, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub min_ms: f64,
    pub max_ms: f64,
    pub avg_ms: f64,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub std_dev_ms: f64,
}

impl LatencySummary {
    /// Summarize the successful samples.
    pub fn from_samples(samples: &[Sample]) -> Result<Self, StatsError> {
        let mut durations: Vec<f64> = samples
            .iter()
            .filter(|s| s.succeeded)
            .map(|s| s.duration_secs * 1_000.0)
            .collect();

        if durations.len() < MIN_SAMPLES {
            return Err(StatsError::InsufficientSamples {
                required: MIN_SAMPLES,
                available: durations.len(),
            });
        }

        durations.sort_by(f64::total_cmp);
        let len = durations.len() as f64;
        let avg_ms = durations.iter().sum::<f64>() / len;
        let variance = durations
            .iter()
            .map(|&d| {
                let diff = d - avg_ms;
                diff * diff
            })
            .sum::<f64>()
            / len;

        Ok(Self {
            min_ms: durations[0],
            max_ms: durations[durations.len() - 1],
            avg_ms,
            p50_ms: percentile(&durations, 50)?,
            p95_ms: percentile(&durations, 95)?,
            p99_ms: percentile(&durations, 99)?,
            std_dev_ms: variance.sqrt(),
        })
    }
}

/// Reduction of one workload run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunMetrics {
    pub issued: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub wall_clock: Duration,
    /// Successful units per wall-clock second.
    pub throughput: f64,
    pub latency: Result<LatencySummary, StatsError>,
}

impl RunMetrics {
    /// Reduce the samples of a run measured over `wall_clock`.
    pub fn reduce(samples: &[Sample], wall_clock: Duration) -> Self {
        let succeeded = samples.iter().filter(|s| s.succeeded).count() as u64;
        let units: u64 = samples.iter().map(Sample::units).sum();
        let secs = wall_clock.as_secs_f64();
        let throughput = if secs > 0.0 { units as f64 / secs } else { 0.0 };

        Self {
            issued: samples.len() as u64,
            succeeded,
            failed: samples.len() as u64 - succeeded,
            wall_clock,
            throughput,
            latency: LatencySummary::from_samples(samples),
        }
    }

    /// Fraction of issued operations that succeeded, 0 when none were issued.
    pub fn success_rate(&self) -> f64 {
        if self.issued == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.issued as f64
        }
    }
}

/// System information captured at benchmark time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name
    pub os: String,
    /// OS version
    pub os_version: String,
    /// Kernel version (Linux)
    pub kernel_version: Option<String>,
    /// CPU model name
    pub cpu_model: String,
    /// Number of CPU cores
    pub cpu_cores: usize,
    /// Total system memory in bytes
    pub memory_bytes: u64,
    /// Hostname
    pub hostname: String,
}

impl SystemInfo {
    /// Collect current system information.
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        Self {
            os: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            cpu_cores: sys.cpus().len(),
            memory_bytes: sys.total_memory(),
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

/// Result of one workload against one framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    pub framework: FrameworkName,
    pub workload: WorkloadName,
    pub kind: WorkloadKind,
    pub issued: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub wall_clock_secs: f64,
    /// Undefined when fewer than two samples succeeded.
    pub latency: Option<LatencySummary>,
    pub throughput: f64,
    pub throughput_unit: String,
    /// Resident memory after the run, 0 when it could not be read.
    pub memory_mb: f64,
    pub cold_start_ms: f64,
    /// CPU cores the linked profile predicts at the measured throughput.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_cores_estimate: Option<f64>,
    /// Contained problems: failed iterations, undefined statistics,
    /// unreadable memory.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<Vec<Sample>>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl BenchmarkResult {
    /// Build a result from a reduced run.
    pub fn from_run(
        framework: FrameworkName,
        workload: WorkloadName,
        kind: WorkloadKind,
        batched: bool,
        metrics: &RunMetrics,
    ) -> Self {
        let mut warnings = Vec::new();
        if metrics.failed > 0 {
            warnings.push(format!(
                "{} of {} iterations failed",
                metrics.failed, metrics.issued
            ));
        }
        if let Err(e) = &metrics.latency {
            warnings.push(e.to_string());
        }

        Self {
            framework,
            workload,
            kind,
            issued: metrics.issued,
            succeeded: metrics.succeeded,
            failed: metrics.failed,
            wall_clock_secs: metrics.wall_clock.as_secs_f64(),
            latency: metrics.latency.as_ref().ok().cloned(),
            throughput: metrics.throughput,
            throughput_unit: kind.throughput_unit(batched).to_string(),
            memory_mb: 0.0,
            cold_start_ms: 0.0,
            cpu_cores_estimate: None,
            warnings,
            samples: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_memory(mut self, memory_mb: f64) -> Self {
        if memory_mb <= 0.0 {
            self.warnings
                .push("memory inspection failed, reported as 0".to_string());
        }
        self.memory_mb = memory_mb;
        self
    }

    pub fn with_cold_start(mut self, cold_start: Duration) -> Self {
        self.cold_start_ms = cold_start.as_secs_f64() * 1_000.0;
        self
    }

    pub fn with_cpu_estimate(mut self, cores: Option<f64>) -> Self {
        self.cpu_cores_estimate = cores;
        self
    }

    pub fn with_samples(mut self, samples: Vec<Sample>) -> Self {
        self.samples = Some(samples);
        self
    }

    /// Add metadata to the result. Values that fail to serialize are skipped.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(value) = serde_json::to_value(value) {
            self.metadata.insert(key.into(), value);
        }
        self
    }

    pub fn avg_ms(&self) -> Option<f64> {
        self.latency.as_ref().map(|l| l.avg_ms)
    }

    pub fn p95_ms(&self) -> Option<f64> {
        self.latency.as_ref().map(|l| l.p95_ms)
    }

    pub fn p99_ms(&self) -> Option<f64> {
        self.latency.as_ref().map(|l| l.p99_ms)
    }
}

/// Stage at which a framework dropped out of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// The server process could not be spawned.
    Spawn,
    /// The server never answered its health check.
    NotReady,
}

impl std::fmt::Display for FailureStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureStage::Spawn => write!(f, "spawn"),
            FailureStage::NotReady => write!(f, "not_ready"),
        }
    }
}

/// A framework that produced no results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkFailure {
    pub framework: FrameworkName,
    pub stage: FailureStage,
    pub message: String,
}

/// Complete benchmark run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    /// Suite identifier
    pub benchmark_suite: String,
    /// Harness version
    pub version: String,
    pub run_id: Uuid,
    /// Timestamp when benchmarks were run
    pub timestamp: DateTime<Utc>,
    /// System information
    pub system_info: SystemInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<FrameworkName>,
    /// Results in test order
    pub results: Vec<BenchmarkResult>,
    #[serde(default)]
    pub failures: Vec<FrameworkFailure>,
}

impl BenchmarkReport {
    /// Create a new, empty benchmark report.
    pub fn new() -> Self {
        Self {
            benchmark_suite: "conduit-bench".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            system_info: SystemInfo::collect(),
            baseline: None,
            results: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Add a result to the report.
    pub fn add_result(&mut self, result: BenchmarkResult) {
        self.results.push(result);
    }

    pub fn add_failure(&mut self, failure: FrameworkFailure) {
        self.failures.push(failure);
    }

    /// Frameworks with at least one result, in test order.
    pub fn frameworks_with_results(&self) -> Vec<&FrameworkName> {
        let mut seen: Vec<&FrameworkName> = Vec::new();
        for result in &self.results {
            if !seen.contains(&&result.framework) {
                seen.push(&result.framework);
            }
        }
        seen
    }
}

impl Default for BenchmarkReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a latency given in milliseconds (auto-selects μs/ms/s).
pub fn format_latency(ms: f64) -> String {
    if ms < 1.0 {
        format!("{:.1}μs", ms * 1_000.0)
    } else if ms < 1_000.0 {
        format!("{:.2}ms", ms)
    } else {
        format!("{:.2}s", ms / 1_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(ms: f64) -> Sample {
        Sample::success(Duration::from_secs_f64(ms / 1_000.0), None)
    }

    #[test]
    fn test_nearest_rank_percentiles() {
        let sorted: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_eq!(percentile(&sorted, 50).unwrap(), 5.0);
        assert_eq!(percentile(&sorted, 95).unwrap(), 10.0);
        assert_eq!(percentile(&sorted, 99).unwrap(), 10.0);
        assert_eq!(percentile(&sorted, 100).unwrap(), 10.0);
        assert_eq!(percentile(&sorted, 1).unwrap(), 1.0);

        let hundred: Vec<f64> = (1..=100).map(f64::from).collect();
        assert_eq!(percentile(&hundred, 95).unwrap(), 95.0);
        assert_eq!(percentile(&hundred, 99).unwrap(), 99.0);
    }

    #[test]
    fn test_percentile_rejects_out_of_range() {
        assert_eq!(percentile(&[1.0], 0), Err(StatsError::InvalidPercentile(0)));
        assert_eq!(
            percentile(&[1.0], 101),
            Err(StatsError::InvalidPercentile(101))
        );
        assert!(percentile(&[], 50).is_err());
    }

    #[test]
    fn test_identical_durations_collapse() {
        let samples = vec![ok(4.0); 20];
        let summary = LatencySummary::from_samples(&samples).unwrap();
        for value in [summary.avg_ms, summary.p50_ms, summary.p95_ms, summary.p99_ms] {
            assert!((value - 4.0).abs() < 1e-9);
        }
        assert!(summary.std_dev_ms.abs() < 1e-9);
    }

    #[test]
    fn test_order_invariance() {
        let forward: Vec<Sample> = (1..=50).map(|i| ok(f64::from(i))).collect();
        let mut shuffled = forward.clone();
        shuffled.reverse();
        shuffled.swap(3, 17);

        let wall = Duration::from_secs(1);
        let a = RunMetrics::reduce(&forward, wall);
        let b = RunMetrics::reduce(&shuffled, wall);
        assert_eq!(a, b);
    }

    #[test]
    fn test_failed_samples_excluded_from_latency() {
        let mut samples = vec![ok(1.0), ok(3.0)];
        samples.push(Sample::failure(Duration::from_secs(5)));

        let metrics = RunMetrics::reduce(&samples, Duration::from_secs(1));
        assert_eq!(metrics.issued, 3);
        assert_eq!(metrics.failed, 1);
        let latency = metrics.latency.unwrap();
        assert!((latency.max_ms - 3.0).abs() < 1e-9);
        assert!((latency.avg_ms - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_failed_run() {
        let samples = vec![Sample::failure(Duration::from_millis(10)); 100];
        let metrics = RunMetrics::reduce(&samples, Duration::from_secs(1));
        assert_eq!(metrics.succeeded, 0);
        assert_eq!(metrics.failed, 100);
        assert_eq!(metrics.throughput, 0.0);
        assert_eq!(
            metrics.latency,
            Err(StatsError::InsufficientSamples {
                required: 2,
                available: 0
            })
        );
    }

    #[test]
    fn test_single_success_is_undefined() {
        let metrics = RunMetrics::reduce(&[ok(2.0)], Duration::from_secs(1));
        assert!(metrics.latency.is_err());
        assert!((metrics.throughput - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_throughput_counts_units() {
        let samples = vec![
            Sample::success(Duration::from_millis(10), Some(32)),
            Sample::success(Duration::from_millis(10), Some(32)),
            Sample::failure(Duration::from_millis(10)),
        ];
        let metrics = RunMetrics::reduce(&samples, Duration::from_millis(500));
        assert!((metrics.throughput - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_wall_clock_throughput() {
        let metrics = RunMetrics::reduce(&[ok(1.0), ok(1.0)], Duration::ZERO);
        assert_eq!(metrics.throughput, 0.0);
    }

    #[test]
    fn test_result_records_warnings() {
        let samples = vec![ok(1.0), Sample::failure(Duration::from_millis(2))];
        let metrics = RunMetrics::reduce(&samples, Duration::from_secs(1));
        let result = BenchmarkResult::from_run(
            FrameworkName::new("conduit").unwrap(),
            WorkloadName::new("tools-list").unwrap(),
            WorkloadKind::Single,
            false,
            &metrics,
        )
        .with_memory(0.0);

        assert!(result.latency.is_none());
        assert_eq!(result.throughput_unit, "req/s");
        assert_eq!(result.warnings.len(), 3);
    }

    #[test]
    fn test_latency_format() {
        assert_eq!(format_latency(0.5), "500.0μs");
        assert_eq!(format_latency(1.5), "1.50ms");
        assert_eq!(format_latency(1_500.0), "1.50s");
    }

    #[test]
    fn test_system_info_collect() {
        let info = SystemInfo::collect();
        assert!(!info.os.is_empty());
        assert!(info.cpu_cores > 0);
        assert!(info.memory_bytes > 0);
    }

    #[test]
    fn test_frameworks_with_results_in_order() {
        let metrics = RunMetrics::reduce(&[ok(1.0), ok(2.0)], Duration::from_secs(1));
        let mut report = BenchmarkReport::new();
        for (framework, workload) in [("b", "w1"), ("a", "w1"), ("b", "w2")] {
            report.add_result(BenchmarkResult::from_run(
                FrameworkName::new(framework).unwrap(),
                WorkloadName::new(workload).unwrap(),
                WorkloadKind::Single,
                false,
                &metrics,
            ));
        }
        let names: Vec<_> = report
            .frameworks_with_results()
            .into_iter()
            .map(|f| f.as_str())
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }
}
