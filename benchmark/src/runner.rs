// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Benchmark orchestration.
//!
//! For each framework in turn: start the server and wait for health, run
//! every selected workload, reduce the samples, read memory and stop the
//! server. A framework that cannot start is recorded as a failure and the
//! run moves on to the next one.

use std::time::Duration;

use conduit_bench_core::{
    Config, FrameworkConfig, FrameworkName, HarnessError, LifecycleManager, ResourceProfiler,
    RunLength, StartOutcome, StopOutcome, WorkloadConfig,
};
use thiserror::Error;

use crate::harness::{DriverError, WorkloadDriver};
use crate::metrics::{
    BenchmarkReport, BenchmarkResult, FailureStage, FrameworkFailure, RunMetrics,
};

/// Iterations per workload in quick mode.
pub const QUICK_ITERATIONS: u64 = 10;
/// Warm-up operations in quick mode.
pub const QUICK_WARMUP: u64 = 2;
/// Upper bound on timed workloads in quick mode.
pub const QUICK_MAX_DURATION: Duration = Duration::from_secs(1);

/// Errors that abort a run before any framework is started.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Harness(#[from] HarnessError),

    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("Unknown framework: {name}")]
    UnknownFramework { name: String },

    #[error("Unknown workload: {name}")]
    UnknownWorkload { name: String },
}

/// Per-run selections and switches.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Frameworks to run, all when empty.
    pub frameworks: Vec<String>,
    /// Workloads to run, all when empty.
    pub workloads: Vec<String>,
    /// Keep raw samples in results.
    pub keep_samples: bool,
    /// Shrink every workload for a smoke run.
    pub quick: bool,
    pub baseline: Option<FrameworkName>,
}

/// What happened to one framework.
#[derive(Debug)]
pub enum FrameworkOutcome {
    Completed(Vec<BenchmarkResult>),
    Failed(FrameworkFailure),
}

fn quick_workload(workload: &WorkloadConfig) -> WorkloadConfig {
    let run_length = match workload.run_length {
        RunLength::Iterations(n) => RunLength::Iterations(n.min(QUICK_ITERATIONS)),
        RunLength::Duration(d) => RunLength::Duration(d.min(QUICK_MAX_DURATION)),
    };
    WorkloadConfig {
        run_length,
        ..workload.clone()
    }
}

fn select<'a, T>(
    items: &'a [T],
    names: &[String],
    name_of: impl Fn(&T) -> &str,
    unknown: impl Fn(String) -> RunError,
) -> Result<Vec<&'a T>, RunError> {
    if names.is_empty() {
        return Ok(items.iter().collect());
    }
    names
        .iter()
        .map(|name| {
            items
                .iter()
                .find(|item| name_of(*item) == name.as_str())
                .ok_or_else(|| unknown(name.clone()))
        })
        .collect()
}

/// Runs selected workloads against selected frameworks.
pub struct BenchmarkRunner<'a> {
    config: &'a Config,
    options: RunOptions,
    frameworks: Vec<&'a FrameworkConfig>,
    workloads: Vec<WorkloadConfig>,
    lifecycle: LifecycleManager,
    driver: WorkloadDriver,
    profiler: ResourceProfiler,
}

impl<'a> BenchmarkRunner<'a> {
    /// Prepare a run. Fails when a selection names an unknown framework or
    /// workload, or when an artifact under test is missing.
    pub fn new(config: &'a Config, options: RunOptions) -> Result<Self, RunError> {
        let frameworks = select(
            &config.frameworks,
            &options.frameworks,
            |f| f.name.as_str(),
            |name| RunError::UnknownFramework { name },
        )?;
        let workloads: Vec<WorkloadConfig> = select(
            &config.workloads,
            &options.workloads,
            |w| w.name.as_str(),
            |name| RunError::UnknownWorkload { name },
        )?
        .into_iter()
        .map(|w| if options.quick { quick_workload(w) } else { w.clone() })
        .collect();

        for framework in &frameworks {
            framework.check_artifact()?;
        }

        let lifecycle = LifecycleManager::new(&config.harness).map_err(HarnessError::from)?;
        let mut driver = WorkloadDriver::new(&config.harness)?;
        if options.quick {
            driver = driver.warmup(config.harness.warmup_iterations.min(QUICK_WARMUP));
        }

        Ok(Self {
            config,
            options,
            frameworks,
            workloads,
            lifecycle,
            driver,
            profiler: ResourceProfiler::new(),
        })
    }

    /// Run every selected framework in order and collect the report.
    pub async fn run(&mut self) -> BenchmarkReport {
        let mut report = BenchmarkReport::new();
        report.baseline = self
            .options
            .baseline
            .clone()
            .or_else(|| self.config.harness.baseline.clone());

        let frameworks = self.frameworks.clone();
        for (index, framework) in frameworks.iter().enumerate() {
            tracing::info!(
                framework = %framework.name,
                progress = %format!("{}/{}", index + 1, frameworks.len()),
                "Benchmarking framework"
            );

            match self.run_framework(framework).await {
                FrameworkOutcome::Completed(results) => {
                    for result in results {
                        report.add_result(result);
                    }
                }
                FrameworkOutcome::Failed(failure) => {
                    tracing::error!(
                        framework = %failure.framework,
                        stage = %failure.stage,
                        reason = %failure.message,
                        "Framework skipped"
                    );
                    report.add_failure(failure);
                }
            }
        }

        report
    }

    /// Start one framework, run all workloads against it, and stop it.
    pub async fn run_framework(&mut self, framework: &FrameworkConfig) -> FrameworkOutcome {
        let outcome = match self.lifecycle.start_and_wait(framework).await {
            Ok(outcome) => outcome,
            Err(e) => {
                return FrameworkOutcome::Failed(FrameworkFailure {
                    framework: framework.name.clone(),
                    stage: FailureStage::Spawn,
                    message: e.to_string(),
                })
            }
        };

        let (process, cold_start) = match outcome {
            StartOutcome::Ready {
                process,
                cold_start,
            } => (process, cold_start),
            StartOutcome::NotReady { waited, exited } => {
                let message = if exited {
                    format!("process exited after {} ms", waited.as_millis())
                } else {
                    format!("not healthy after {} ms", waited.as_millis())
                };
                return FrameworkOutcome::Failed(FrameworkFailure {
                    framework: framework.name.clone(),
                    stage: FailureStage::NotReady,
                    message,
                });
            }
        };

        let config = self.config;
        let profile = config.profile_for(framework);
        let base_url = framework.base_url();
        let mut results = Vec::with_capacity(self.workloads.len());

        for workload in &self.workloads {
            let run = self.driver.run(&base_url, workload).await;
            let metrics = RunMetrics::reduce(&run.samples, run.wall_clock);
            let memory_mb = self.profiler.memory_mb(process.pid());

            let mut result = BenchmarkResult::from_run(
                framework.name.clone(),
                workload.name.clone(),
                workload.kind,
                workload.units_per_request.is_some(),
                &metrics,
            )
            .with_memory(memory_mb)
            .with_cold_start(cold_start)
            .with_cpu_estimate(profile.map(|p| p.cores_at_scale(metrics.throughput)))
            .with_metadata("run_length", workload.run_length.to_string());

            if self.options.keep_samples {
                result = result.with_samples(run.samples);
            }

            tracing::info!(
                framework = %framework.name,
                workload = %workload.name,
                succeeded = metrics.succeeded,
                failed = metrics.failed,
                throughput = %format!("{:.1} {}", result.throughput, result.throughput_unit),
                memory_mb = %format!("{:.1}", memory_mb),
                "Workload complete"
            );
            results.push(result);
        }

        match self.lifecycle.stop(process).await {
            Ok(StopOutcome::Forced) => {
                tracing::warn!(framework = %framework.name, "Server had to be killed")
            }
            Ok(outcome) => tracing::debug!(framework = %framework.name, ?outcome, "Server stopped"),
            Err(e) => tracing::warn!(framework = %framework.name, error = %e, "Stopping server failed"),
        }

        FrameworkOutcome::Completed(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_bench_core::ConfigLoader;

    const CONFIG: &str = r#"
frameworks:
  - name: alpha
    command: ./alpha
    port: 18001
  - name: beta
    command: ./beta
    port: 18002
workloads:
  - name: short
    kind: single
    path: /
    iterations: 500
  - name: timed
    kind: streaming
    path: /stream
    duration_secs: 30
"#;

    #[test]
    fn test_quick_mode_shrinks_workloads() {
        let config = ConfigLoader::load_string(CONFIG).unwrap();
        let runner = BenchmarkRunner::new(
            &config,
            RunOptions {
                quick: true,
                ..RunOptions::default()
            },
        )
        .unwrap();
        assert_eq!(
            runner.workloads[0].run_length,
            RunLength::Iterations(QUICK_ITERATIONS)
        );
        assert_eq!(
            runner.workloads[1].run_length,
            RunLength::Duration(QUICK_MAX_DURATION)
        );
    }

    #[test]
    fn test_selection_keeps_requested_order() {
        let config = ConfigLoader::load_string(CONFIG).unwrap();
        let runner = BenchmarkRunner::new(
            &config,
            RunOptions {
                frameworks: vec!["beta".to_string(), "alpha".to_string()],
                workloads: vec!["timed".to_string()],
                ..RunOptions::default()
            },
        )
        .unwrap();
        let names: Vec<_> = runner.frameworks.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["beta", "alpha"]);
        assert_eq!(runner.workloads.len(), 1);
    }

    #[test]
    fn test_unknown_selection_rejected() {
        let config = ConfigLoader::load_string(CONFIG).unwrap();
        let result = BenchmarkRunner::new(
            &config,
            RunOptions {
                workloads: vec!["missing".to_string()],
                ..RunOptions::default()
            },
        );
        assert!(matches!(result, Err(RunError::UnknownWorkload { .. })));
    }

    #[test]
    fn test_missing_artifact_aborts_before_run() {
        let yaml = CONFIG.replace(
            "    port: 18001\n",
            "    port: 18001\n    artifact: /nonexistent/alpha-server\n",
        );
        let config = ConfigLoader::load_string(&yaml).unwrap();
        let result = BenchmarkRunner::new(&config, RunOptions::default());
        assert!(matches!(
            result,
            Err(RunError::Harness(HarnessError::ArtifactMissing { .. }))
        ));
    }
}
