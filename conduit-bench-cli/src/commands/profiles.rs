//! `cbench profiles` command - List framework resource profiles.

use conduit_bench::table::ProfilesTable;

use super::CostInputs;

pub async fn execute(config_path: &str) -> anyhow::Result<()> {
    let inputs = CostInputs::load(config_path)?;

    print!("{}", ProfilesTable(&inputs.profiles));
    println!();
    println!(
        "Total: {} profile(s), billed at ${}/vCPU-hour and ${}/GB-hour, {} cores per instance",
        inputs.profiles.len(),
        inputs.billing.cpu_hour_rate,
        inputs.billing.gb_hour_rate,
        inputs.billing.cores_per_instance
    );

    Ok(())
}
