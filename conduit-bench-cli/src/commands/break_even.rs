// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `cbench break-even` command - Cost delta between two profiles.

use conduit_bench::table::BreakEvenTable;
use conduit_bench_core::cost::DEFAULT_BREAK_EVEN_LOADS;
use conduit_bench_core::{find_profile, CostModel, HarnessError};

use super::{load_points, CostInputs};

pub async fn execute(
    config_path: &str,
    baseline: &str,
    candidate: &str,
    loads: &[f64],
) -> anyhow::Result<()> {
    let inputs = CostInputs::load(config_path)?;
    let lookup = |name: &str| {
        find_profile(&inputs.profiles, name).ok_or_else(|| HarnessError::ProfileNotFound {
            name: name.to_string(),
        })
    };
    let baseline_profile = lookup(baseline)?;
    let candidate_profile = lookup(candidate)?;

    let loads = load_points(loads, &DEFAULT_BREAK_EVEN_LOADS)?;

    let points = CostModel::new(inputs.billing).break_even(baseline_profile, candidate_profile, &loads);
    print!(
        "{}",
        BreakEvenTable {
            baseline: &baseline_profile.display_name,
            candidate: &candidate_profile.display_name,
            points: &points,
        }
    );

    Ok(())
}
