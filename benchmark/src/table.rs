// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Console tables.
//!
//! Each table is a borrowed view implementing `Display`, so callers can
//! print it or render it into a string.

use std::fmt;

use conduit_bench_core::cost::format_load;
use conduit_bench_core::{BreakEvenPoint, CostStudy, FootprintSummary, FrameworkProfile};

use crate::comparison::Comparison;
use crate::metrics::{format_latency, BenchmarkResult, FrameworkFailure};

const WIDTH: usize = 100;

fn rule(f: &mut fmt::Formatter<'_>, c: char) -> fmt::Result {
    writeln!(f, "{}", c.to_string().repeat(WIDTH))
}

fn banner(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    rule(f, '=')?;
    writeln!(f, "{}", title)?;
    rule(f, '=')
}

fn latency_cell(value: Option<f64>) -> String {
    value.map(format_latency).unwrap_or_else(|| "n/a".to_string())
}

fn factor_cell(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}x", v))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Per-workload results in test order.
pub struct ResultsTable<'a>(pub &'a [BenchmarkResult]);

impl fmt::Display for ResultsTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        banner(f, "BENCHMARK RESULTS")?;
        writeln!(
            f,
            "{:<18} {:<16} {:>10} {:>10} {:>10} {:>10} {:>16} {:>10} {:>10} {:>6}",
            "Framework", "Workload", "Avg", "p50", "p95", "p99", "Throughput", "Memory", "Cold", "Fail"
        )?;
        rule(f, '-')?;
        for r in self.0 {
            let latency = r.latency.as_ref();
            writeln!(
                f,
                "{:<18} {:<16} {:>10} {:>10} {:>10} {:>10} {:>16} {:>8.1}MB {:>8.0}ms {:>6}",
                r.framework.as_str(),
                r.workload.as_str(),
                latency_cell(latency.map(|l| l.avg_ms)),
                latency_cell(latency.map(|l| l.p50_ms)),
                latency_cell(latency.map(|l| l.p95_ms)),
                latency_cell(latency.map(|l| l.p99_ms)),
                format!("{:.1} {}", r.throughput, r.throughput_unit),
                r.memory_mb,
                r.cold_start_ms,
                r.failed,
            )?;
            for warning in &r.warnings {
                writeln!(f, "{:>20} ! {}", "", warning)?;
            }
        }
        Ok(())
    }
}

/// Frameworks that produced no results.
pub struct FailuresTable<'a>(pub &'a [FrameworkFailure]);

impl fmt::Display for FailuresTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        writeln!(f)?;
        writeln!(f, "Skipped frameworks:")?;
        for failure in self.0 {
            writeln!(
                f,
                "  - {} [{}]: {}",
                failure.framework, failure.stage, failure.message
            )?;
        }
        Ok(())
    }
}

/// Candidate-versus-baseline ratios.
pub struct ComparisonTable<'a>(pub &'a [Comparison]);

impl fmt::Display for ComparisonTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let baseline = match self.0.first() {
            Some(c) => c.baseline.as_str(),
            None => return writeln!(f, "No comparable results."),
        };
        banner(f, &format!("COMPARISON VS {}", baseline))?;
        writeln!(
            f,
            "{:<18} {:<16} {:>12} {:>12} {:>10} {:>10} {:>10} {:>12}",
            "Candidate", "Workload", "Throughput", "Memory", "Avg", "p95", "p99", "Cold start"
        )?;
        rule(f, '-')?;
        for c in self.0 {
            writeln!(
                f,
                "{:<18} {:<16} {:>12} {:>12} {:>10} {:>10} {:>10} {:>12}",
                c.candidate.as_str(),
                c.workload.as_str(),
                factor_cell(c.throughput_ratio),
                factor_cell(c.memory_ratio),
                factor_cell(c.avg_latency_speedup),
                factor_cell(c.p95_latency_speedup),
                factor_cell(c.p99_latency_speedup),
                factor_cell(c.cold_start_speedup),
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Throughput and memory are candidate / baseline; latency and cold start are speedups."
        )
    }
}

/// Cost study across load points, with savings against the first profile.
pub struct CostStudyTable<'a>(pub &'a CostStudy);

impl fmt::Display for CostStudyTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        banner(f, "INFRASTRUCTURE COST ANALYSIS")?;
        for point in &self.0.points {
            writeln!(f)?;
            rule(f, '-')?;
            writeln!(
                f,
                "Scale: {} ops/second ({:.1}M ops/month)",
                format_load(point.load),
                point.load * conduit_bench_core::cost::SECONDS_PER_MONTH / 1_000_000.0
            )?;
            rule(f, '-')?;
            writeln!(
                f,
                "{:<20} {:>12} {:>12} {:>12} {:>15} {:>15}",
                "Framework", "Memory", "CPU Cores", "Instances", "$/Month", "$/M Ops"
            )?;

            let savings = CostStudy::savings_vs_reference(point);
            let reference = point.analyses.first().map(|a| a.display_name.as_str());
            for (index, analysis) in point.analyses.iter().enumerate() {
                writeln!(
                    f,
                    "{:<20} {:>10.0}MB {:>12.1} {:>12} {:>15} {:>15}",
                    analysis.display_name,
                    analysis.memory_mb,
                    analysis.cpu_cores,
                    analysis.instances,
                    format!("${:.2}", analysis.monthly_cost),
                    format!("${:.4}", analysis.cost_per_million),
                )?;
                if let (Some(Some(pct)), Some(reference)) = (savings.get(index), reference) {
                    if index > 0 && *pct > 0.0 {
                        writeln!(f, "{:>20}   {:.0}% savings vs {}", "", pct, reference)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Monthly and annual deltas between two frameworks.
pub struct BreakEvenTable<'a> {
    pub baseline: &'a str,
    pub candidate: &'a str,
    pub points: &'a [BreakEvenPoint],
}

impl fmt::Display for BreakEvenTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        banner(f, "BREAK-EVEN ANALYSIS")?;
        writeln!(f, "{} vs {}", self.baseline, self.candidate)?;
        writeln!(f)?;
        for point in self.points {
            writeln!(
                f,
                "{:>8} ops/sec: ${:>10.2}/mo vs ${:>10.2}/mo = ${:>10.2}/mo savings (${:>12.2}/year)",
                format_load(point.load),
                point.baseline_cost,
                point.candidate_cost,
                point.monthly_delta,
                point.annual_delta
            )?;
        }
        Ok(())
    }
}

/// Headline footprint comparison at one load.
pub struct FootprintTable<'a>(pub &'a FootprintSummary);

impl fmt::Display for FootprintTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        banner(f, "SUMMARY")?;
        writeln!(f, "At {} ops/second:", format_load(s.load))?;
        writeln!(
            f,
            "  {:<16} ${:.2}/month",
            s.baseline.display_name, s.baseline.monthly_cost
        )?;
        writeln!(
            f,
            "  {:<16} ${:.2}/month",
            s.candidate.display_name, s.candidate.monthly_cost
        )?;
        match s.savings_percent {
            Some(pct) => writeln!(
                f,
                "  {:<16} {:.0}% (${:.2}/year)",
                "Savings:", pct, s.annual_savings
            )?,
            None => writeln!(f, "  {:<16} n/a", "Savings:")?,
        }
        writeln!(f)?;
        let name = &s.candidate.display_name;
        writeln!(f, "{} uses {} less memory", name, factor_cell(s.memory_factor))?;
        writeln!(f, "{} uses {} less CPU", name, factor_cell(s.cpu_factor))?;
        writeln!(f, "{} artifact is {} smaller", name, factor_cell(s.artifact_factor))?;
        writeln!(f, "{} cold start is {} faster", name, factor_cell(s.cold_start_factor))
    }
}

/// Configured or built-in resource profiles.
pub struct ProfilesTable<'a>(pub &'a [FrameworkProfile]);

impl fmt::Display for ProfilesTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<16} {:<18} {:>9} {:>12} {:>12} {:>10} {:>10} {:>12}",
            "Key", "Name", "Base MB", "MB/1K ops", "Cores/10K", "Image MB", "Cold ms", "Ops/core"
        )?;
        rule(f, '-')?;
        for p in self.0 {
            writeln!(
                f,
                "{:<16} {:<18} {:>9.1} {:>12.2} {:>12.2} {:>10.0} {:>10.0} {:>12.0}",
                p.key.as_str(),
                p.display_name,
                p.base_memory_mb,
                p.memory_mb_per_unit * 1_000.0 / p.memory_unit,
                p.cpu_cores_per_unit * 10_000.0 / p.cpu_unit,
                p.artifact_size_mb,
                p.cold_start_ms,
                p.max_throughput_per_core
            )?;
        }
        Ok(())
    }
}
