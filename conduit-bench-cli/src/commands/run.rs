// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `cbench run` command - Benchmark every framework and compare.
//!
//! Exits non-zero when an artifact under test is missing or when no
//! framework produced results.

use anyhow::Context;
use conduit_bench::table::{ComparisonTable, FailuresTable, ResultsTable};
use conduit_bench::{BenchmarkRunner, ComparisonReporter, JsonReporter, RunOptions};
use conduit_bench_core::{ConfigLoader, FrameworkName};

use crate::metrics;

/// Options of a benchmark run.
pub struct RunArgs {
    pub baseline: Option<String>,
    pub frameworks: Vec<String>,
    pub workloads: Vec<String>,
    pub keep_samples: bool,
    pub quick: bool,
    pub metrics_out: Option<String>,
}

pub async fn execute(config_path: &str, args: RunArgs) -> anyhow::Result<()> {
    let config = ConfigLoader::load_file(config_path)?;
    let baseline = args.baseline.map(FrameworkName::new).transpose()?;

    tracing::info!(
        config = %config_path,
        frameworks = config.frameworks.len(),
        workloads = config.workloads.len(),
        quick = args.quick,
        "Starting benchmark run"
    );

    let mut runner = BenchmarkRunner::new(
        &config,
        RunOptions {
            frameworks: args.frameworks,
            workloads: args.workloads,
            keep_samples: args.keep_samples,
            quick: args.quick,
            baseline,
        },
    )?;
    let report = runner.run().await;

    println!();
    print!("{}", ResultsTable(&report.results));
    print!("{}", FailuresTable(&report.failures));

    let reporter = JsonReporter::new(&config.harness.output_dir)?;
    let path = reporter.save(&report)?;
    println!();
    println!("Report saved to: {}", path.display());

    if let Some(metrics_path) = &args.metrics_out {
        metrics::record_report(&report);
        metrics::write_metrics(metrics_path)
            .with_context(|| format!("writing metrics to {}", metrics_path))?;
        println!("Metrics written to: {}", metrics_path);
    }

    if report.results.is_empty() {
        anyhow::bail!(
            "No framework produced results ({} skipped)",
            report.failures.len()
        );
    }

    let baseline = report
        .baseline
        .clone()
        .or_else(|| report.frameworks_with_results().first().map(|f| (*f).clone()));

    if let Some(baseline) = baseline {
        println!();
        match ComparisonReporter::from_report(&report).compare(baseline.as_str()) {
            Ok(comparisons) => print!("{}", ComparisonTable(&comparisons)),
            Err(e) => println!("Comparison unavailable: {}", e),
        }
    }

    Ok(())
}
