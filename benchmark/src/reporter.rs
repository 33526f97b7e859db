// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! JSON persistence for benchmark reports and cost studies.
//!
//! Files are timestamped so successive runs never overwrite each other.

use crate::metrics::BenchmarkReport;
use chrono::{DateTime, Utc};
use conduit_bench_core::CostStudy;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%SZ";

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to (de)serialize report: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ReporterError {
    let path = path.to_path_buf();
    move |source| ReporterError::Io { path, source }
}

/// JSON reporter writing into one output directory.
pub struct JsonReporter {
    output_dir: PathBuf,
}

impl JsonReporter {
    /// Create a reporter, creating the output directory if needed.
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self, ReporterError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir).map_err(io_error(&output_dir))?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write_json<T: Serialize>(
        &self,
        prefix: &str,
        timestamp: DateTime<Utc>,
        value: &T,
    ) -> Result<PathBuf, ReporterError> {
        let filename = format!("{}_{}.json", prefix, timestamp.format(TIMESTAMP_FORMAT));
        let filepath = self.output_dir.join(filename);

        let file = File::create(&filepath).map_err(io_error(&filepath))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, value)?;

        tracing::debug!(path = %filepath.display(), "Wrote report");
        Ok(filepath)
    }

    /// Save a benchmark report as `benchmark_<timestamp>.json`.
    pub fn save(&self, report: &BenchmarkReport) -> Result<PathBuf, ReporterError> {
        self.write_json("benchmark", report.timestamp, report)
    }

    /// Save a cost study as `cost_analysis_<timestamp>.json`, keyed by load.
    pub fn save_cost_study(&self, study: &CostStudy) -> Result<PathBuf, ReporterError> {
        self.write_json("cost_analysis", Utc::now(), study)
    }

    /// List saved benchmark reports, oldest first.
    pub fn list_reports(&self) -> Result<Vec<PathBuf>, ReporterError> {
        let mut reports = Vec::new();
        for entry in fs::read_dir(&self.output_dir).map_err(io_error(&self.output_dir))? {
            let path = entry.map_err(io_error(&self.output_dir))?.path();
            let is_report = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("benchmark_") && n.ends_with(".json"))
                .unwrap_or(false);
            if is_report {
                reports.push(path);
            }
        }
        reports.sort();
        Ok(reports)
    }

    /// Load a saved benchmark report.
    pub fn load(path: impl AsRef<Path>) -> Result<BenchmarkReport, ReporterError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(io_error(path))?;
        let report = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{BenchmarkResult, RunMetrics, Sample};
    use conduit_bench_core::{builtin_profiles, CostModel, FrameworkName, WorkloadKind, WorkloadName};
    use std::time::Duration;
    use tempfile::TempDir;

    fn sample_report() -> BenchmarkReport {
        let samples: Vec<Sample> = (1..=20)
            .map(|i| Sample::success(Duration::from_micros(i * 137), Some(3)))
            .chain(std::iter::once(Sample::failure(Duration::from_millis(5))))
            .collect();
        let metrics = RunMetrics::reduce(&samples, Duration::from_millis(33));

        let mut report = BenchmarkReport::new();
        report.add_result(
            BenchmarkResult::from_run(
                FrameworkName::new("conduit").unwrap(),
                WorkloadName::new("stream").unwrap(),
                WorkloadKind::Streaming,
                false,
                &metrics,
            )
            .with_memory(12.345)
            .with_cold_start(Duration::from_micros(48_211))
            .with_cpu_estimate(Some(0.0123))
            .with_samples(samples),
        );
        report
    }

    #[test]
    fn test_reporter_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = JsonReporter::new(temp_dir.path()).unwrap();
        let report = sample_report();

        let path = reporter.save(&report).unwrap();
        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("benchmark_"));

        let loaded = JsonReporter::load(&path).unwrap();
        assert_eq!(loaded.run_id, report.run_id);
        assert_eq!(loaded.results, report.results);
        assert_eq!(loaded.system_info, report.system_info);
    }

    #[test]
    fn test_cost_study_keyed_by_load() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = JsonReporter::new(temp_dir.path()).unwrap();
        let study = CostModel::default().study(&builtin_profiles(), &[1_000.0, 10_000.0]);

        let path = reporter.save_cost_study(&study).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["1000"].as_array().unwrap().len(), 4);
        assert_eq!(value["10000"][3]["framework"], "conduit");

        // cost studies are not listed as benchmark reports
        assert!(reporter.list_reports().unwrap().is_empty());
    }

    #[test]
    fn test_list_reports() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = JsonReporter::new(temp_dir.path().join("nested")).unwrap();
        reporter.save(&sample_report()).unwrap();

        let reports = reporter.list_reports().unwrap();
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            JsonReporter::load("/nonexistent/benchmark.json"),
            Err(ReporterError::Io { .. })
        ));
    }
}
