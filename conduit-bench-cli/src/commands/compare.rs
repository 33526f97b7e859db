// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `cbench compare` command - Recompute the comparison of a saved report.

use conduit_bench::table::{ComparisonTable, FailuresTable, ResultsTable};
use conduit_bench::{ComparisonReporter, JsonReporter};

pub async fn execute(report_path: &str, baseline: Option<&str>) -> anyhow::Result<()> {
    let report = JsonReporter::load(report_path)?;
    tracing::info!(
        report = %report_path,
        run_id = %report.run_id,
        results = report.results.len(),
        "Loaded report"
    );

    let baseline = match baseline {
        Some(name) => name.to_string(),
        None => report
            .baseline
            .as_ref()
            .or_else(|| report.frameworks_with_results().first().copied())
            .map(|f| f.to_string())
            .ok_or_else(|| anyhow::anyhow!("Report has no results to compare"))?,
    };

    println!(
        "Run {} at {} on {} ({} cores)",
        report.run_id,
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        report.system_info.hostname,
        report.system_info.cpu_cores
    );
    println!();
    print!("{}", ResultsTable(&report.results));
    print!("{}", FailuresTable(&report.failures));
    println!();

    let comparisons = ComparisonReporter::from_report(&report).compare(&baseline)?;
    print!("{}", ComparisonTable(&comparisons));

    Ok(())
}
