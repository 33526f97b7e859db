// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Infrastructure cost projection.
//!
//! Projects monthly compute cost from a framework profile and a sustained
//! load (ops/sec), then compares frameworks across load points.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::config::BillingConfig;
use crate::profile::FrameworkProfile;
use crate::profiler::ResourceEstimate;
use crate::types::FrameworkName;

/// Billing hours in a month (24 x 30).
pub const HOURS_PER_MONTH: f64 = 720.0;
/// Seconds in a billing month (60 x 60 x 24 x 30).
pub const SECONDS_PER_MONTH: f64 = 2_592_000.0;
const MB_PER_GB: f64 = 1024.0;

/// Load points for a cost study when none are requested.
pub const DEFAULT_STUDY_LOADS: [f64; 3] = [1_000.0, 10_000.0, 100_000.0];
/// Load points for a break-even table when none are requested.
pub const DEFAULT_BREAK_EVEN_LOADS: [f64; 7] = [
    100.0, 500.0, 1_000.0, 5_000.0, 10_000.0, 50_000.0, 100_000.0,
];

/// Projected cost of one framework at one load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostAnalysis {
    pub framework: FrameworkName,
    pub display_name: String,
    pub load: f64,
    pub memory_mb: f64,
    pub cpu_cores: f64,
    pub instances: u32,
    pub monthly_cost: f64,
    pub cost_per_million: f64,
}

/// Cost of two frameworks at one load point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakEvenPoint {
    pub load: f64,
    pub baseline_cost: f64,
    pub candidate_cost: f64,
    /// Baseline minus candidate. Positive means the candidate is cheaper.
    pub monthly_delta: f64,
    pub annual_delta: f64,
}

/// Footprint ratios of a candidate against a baseline at one load.
///
/// Factors are baseline / candidate, so a factor of 10 reads as
/// "ten times smaller". `None` where the candidate value is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintSummary {
    pub load: f64,
    pub baseline: CostAnalysis,
    pub candidate: CostAnalysis,
    pub savings_percent: Option<f64>,
    pub annual_savings: f64,
    pub memory_factor: Option<f64>,
    pub cpu_factor: Option<f64>,
    pub artifact_factor: Option<f64>,
    pub cold_start_factor: Option<f64>,
}

/// One load point of a cost study, analyses in profile order.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyPoint {
    pub load: f64,
    pub analyses: Vec<CostAnalysis>,
}

/// Cost analyses for a set of profiles across load points.
///
/// Serializes as a JSON object keyed by load point, in request order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CostStudy {
    pub points: Vec<StudyPoint>,
}

impl CostStudy {
    /// Monthly cost savings of each analysis relative to the first one
    /// (the reference framework) at the same load, in percent.
    pub fn savings_vs_reference(point: &StudyPoint) -> Vec<Option<f64>> {
        let reference = match point.analyses.first() {
            Some(first) => first.monthly_cost,
            None => return Vec::new(),
        };
        point
            .analyses
            .iter()
            .map(|analysis| savings_percent(reference, analysis.monthly_cost))
            .collect()
    }
}

impl Serialize for CostStudy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.points.len()))?;
        for point in &self.points {
            map.serialize_entry(&format_load(point.load), &point.analyses)?;
        }
        map.end()
    }
}

/// Render a load point as a map key: integral loads without a fraction.
pub fn format_load(load: f64) -> String {
    if load.fract() == 0.0 && load.abs() < 1e15 {
        format!("{}", load as i64)
    } else {
        format!("{}", load)
    }
}

/// Savings of `candidate` against `baseline` in percent, `None` when the
/// baseline costs nothing.
pub fn savings_percent(baseline: f64, candidate: f64) -> Option<f64> {
    if baseline > 0.0 {
        Some((baseline - candidate) / baseline * 100.0)
    } else {
        None
    }
}

fn factor(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 && numerator.is_finite() {
        Some(numerator / denominator)
    } else {
        None
    }
}

/// Cost model parameterized by billing rates.
#[derive(Debug, Clone, Copy, Default)]
pub struct CostModel {
    billing: BillingConfig,
}

impl CostModel {
    pub fn new(billing: BillingConfig) -> Self {
        Self { billing }
    }

    pub fn billing(&self) -> &BillingConfig {
        &self.billing
    }

    /// Project monthly cost of one framework at `load` ops/sec.
    pub fn project(&self, profile: &FrameworkProfile, load: f64) -> CostAnalysis {
        let estimate = ResourceEstimate::at_load(profile, load, self.billing.cores_per_instance);

        let cpu_cost = estimate.cpu_cores * self.billing.cpu_hour_rate * HOURS_PER_MONTH;
        let memory_cost =
            (estimate.memory_mb / MB_PER_GB) * self.billing.gb_hour_rate * HOURS_PER_MONTH;
        let monthly_cost = cpu_cost + memory_cost;

        let ops_per_month = load * SECONDS_PER_MONTH;
        let cost_per_million = if ops_per_month > 0.0 {
            monthly_cost / ops_per_month * 1_000_000.0
        } else {
            0.0
        };

        CostAnalysis {
            framework: profile.key.clone(),
            display_name: profile.display_name.clone(),
            load,
            memory_mb: estimate.memory_mb,
            cpu_cores: estimate.cpu_cores,
            instances: estimate.instances,
            monthly_cost,
            cost_per_million,
        }
    }

    /// Project every profile at one load, in profile order.
    pub fn analyze_scale(&self, profiles: &[FrameworkProfile], load: f64) -> Vec<CostAnalysis> {
        profiles.iter().map(|p| self.project(p, load)).collect()
    }

    /// Project every profile at every load point.
    pub fn study(&self, profiles: &[FrameworkProfile], loads: &[f64]) -> CostStudy {
        let points = loads
            .iter()
            .map(|&load| {
                tracing::debug!(load, profiles = profiles.len(), "Projecting cost");
                StudyPoint {
                    load,
                    analyses: self.analyze_scale(profiles, load),
                }
            })
            .collect();
        CostStudy { points }
    }

    /// Monthly and annual cost delta between two frameworks per load point.
    pub fn break_even(
        &self,
        baseline: &FrameworkProfile,
        candidate: &FrameworkProfile,
        loads: &[f64],
    ) -> Vec<BreakEvenPoint> {
        loads
            .iter()
            .map(|&load| {
                let baseline_cost = self.project(baseline, load).monthly_cost;
                let candidate_cost = self.project(candidate, load).monthly_cost;
                let monthly_delta = baseline_cost - candidate_cost;
                BreakEvenPoint {
                    load,
                    baseline_cost,
                    candidate_cost,
                    monthly_delta,
                    annual_delta: monthly_delta * 12.0,
                }
            })
            .collect()
    }

    /// Footprint comparison of two frameworks at one load.
    pub fn summarize(
        &self,
        baseline: &FrameworkProfile,
        candidate: &FrameworkProfile,
        load: f64,
    ) -> FootprintSummary {
        let base = self.project(baseline, load);
        let cand = self.project(candidate, load);

        FootprintSummary {
            load,
            savings_percent: savings_percent(base.monthly_cost, cand.monthly_cost),
            annual_savings: (base.monthly_cost - cand.monthly_cost) * 12.0,
            memory_factor: factor(base.memory_mb, cand.memory_mb),
            cpu_factor: factor(base.cpu_cores, cand.cpu_cores),
            artifact_factor: factor(baseline.artifact_size_mb, candidate.artifact_size_mb),
            cold_start_factor: factor(baseline.cold_start_ms, candidate.cold_start_ms),
            baseline: base,
            candidate: cand,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{builtin_profiles, find_profile};

    fn profile(key: &str) -> FrameworkProfile {
        find_profile(&builtin_profiles(), key).unwrap().clone()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_project_fastapi_at_10k() {
        let model = CostModel::default();
        let analysis = model.project(&profile("python-fastapi"), 10_000.0);

        // 8 cores * 0.0416 * 720 + (650 / 1024) * 0.0052 * 720
        let expected = 8.0 * 0.0416 * 720.0 + (650.0 / 1024.0) * 0.0052 * 720.0;
        assert!(approx(analysis.monthly_cost, expected));
        assert_eq!(analysis.instances, 4);
        assert!(approx(
            analysis.cost_per_million,
            expected / (10_000.0 * SECONDS_PER_MONTH) * 1e6
        ));
    }

    #[test]
    fn test_zero_load_has_zero_cost_per_million() {
        let model = CostModel::default();
        let analysis = model.project(&profile("conduit"), 0.0);
        assert_eq!(analysis.cost_per_million, 0.0);
        assert_eq!(analysis.instances, 1);
        // memory base still billed
        assert!(analysis.monthly_cost > 0.0);
    }

    #[test]
    fn test_monthly_cost_non_decreasing_in_load() {
        let model = CostModel::default();
        for p in builtin_profiles() {
            let mut previous = 0.0;
            for load in [0.0, 1.0, 100.0, 1_000.0, 5_000.0, 10_000.0, 1e5, 1e6] {
                let cost = model.project(&p, load).monthly_cost;
                assert!(cost >= previous, "{} decreased at {}", p.key, load);
                previous = cost;
            }
        }
    }

    #[test]
    fn test_billing_rates_applied() {
        let model = CostModel::new(BillingConfig {
            cpu_hour_rate: 1.0,
            gb_hour_rate: 0.0,
            cores_per_instance: 4,
        });
        let analysis = model.project(&profile("python-fastapi"), 10_000.0);
        assert!(approx(analysis.monthly_cost, 8.0 * 720.0));
        assert_eq!(analysis.instances, 2);
    }

    #[test]
    fn test_study_preserves_order() {
        let model = CostModel::default();
        let profiles = builtin_profiles();
        let study = model.study(&profiles, &[10_000.0, 1_000.0]);

        assert_eq!(study.points.len(), 2);
        assert_eq!(study.points[0].load, 10_000.0);
        let names: Vec<_> = study.points[1]
            .analyses
            .iter()
            .map(|a| a.framework.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["python-fastapi", "python-flask", "node-express", "conduit"]
        );

        let json = serde_json::to_value(&study).unwrap();
        assert_eq!(json["10000"].as_array().unwrap().len(), 4);
        assert!(json.get("1000").is_some());
    }

    #[test]
    fn test_savings_vs_reference() {
        let model = CostModel::default();
        let study = model.study(&builtin_profiles(), &[100_000.0]);
        let savings = CostStudy::savings_vs_reference(&study.points[0]);
        assert_eq!(savings[0], Some(0.0));
        assert!(savings[3].unwrap() > 80.0);
    }

    #[test]
    fn test_break_even_delta() {
        let model = CostModel::default();
        let points = model.break_even(
            &profile("python-fastapi"),
            &profile("conduit"),
            &DEFAULT_BREAK_EVEN_LOADS,
        );
        assert_eq!(points.len(), 7);
        for point in &points {
            assert!(approx(
                point.monthly_delta,
                point.baseline_cost - point.candidate_cost
            ));
            assert!(approx(point.annual_delta, point.monthly_delta * 12.0));
            assert!(point.monthly_delta > 0.0);
        }
    }

    #[test]
    fn test_summary_factors() {
        let model = CostModel::default();
        let summary = model.summarize(&profile("python-fastapi"), &profile("conduit"), 100_000.0);
        assert!(approx(summary.cpu_factor.unwrap(), 10.0));
        assert!(approx(summary.artifact_factor.unwrap(), 30.0));
        assert!(approx(summary.cold_start_factor.unwrap(), 50.0));

        let mut free = profile("conduit");
        free.cold_start_ms = 0.0;
        let summary = model.summarize(&profile("python-fastapi"), &free, 1_000.0);
        assert!(summary.cold_start_factor.is_none());
    }

    #[test]
    fn test_format_load() {
        assert_eq!(format_load(1000.0), "1000");
        assert_eq!(format_load(2.5), "2.5");
    }
}
