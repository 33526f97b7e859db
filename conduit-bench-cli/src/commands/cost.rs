// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `cbench cost` command - Infrastructure cost study.
//!
//! Projects every profile at each load point, prints savings against the
//! first profile, summarizes the first against the last at the highest
//! load, and exports the study as JSON.

use conduit_bench::table::{CostStudyTable, FootprintTable};
use conduit_bench::JsonReporter;
use conduit_bench_core::cost::DEFAULT_STUDY_LOADS;
use conduit_bench_core::CostModel;

use super::{load_points, CostInputs};

pub async fn execute(config_path: &str, loads: &[f64]) -> anyhow::Result<()> {
    let inputs = CostInputs::load(config_path)?;
    let loads = load_points(loads, &DEFAULT_STUDY_LOADS)?;

    let model = CostModel::new(inputs.billing);
    let study = model.study(&inputs.profiles, &loads);
    print!("{}", CostStudyTable(&study));

    let max_load = loads.iter().copied().fold(0.0_f64, f64::max);
    if let (Some(reference), Some(candidate)) = (inputs.profiles.first(), inputs.profiles.last()) {
        if inputs.profiles.len() > 1 {
            println!();
            print!(
                "{}",
                FootprintTable(&model.summarize(reference, candidate, max_load))
            );
        }
    }

    let reporter = JsonReporter::new(&inputs.output_dir)?;
    let path = reporter.save_cost_study(&study)?;
    println!();
    println!("Results exported to {}", path.display());

    Ok(())
}
