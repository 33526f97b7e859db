// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

use std::path::{Path, PathBuf};

use conduit_bench_core::{builtin_profiles, BillingConfig, ConfigLoader, FrameworkProfile};

pub mod break_even;
pub mod compare;
pub mod cost;
pub mod profiles;
pub mod run;
pub mod validate;

/// Inputs of the cost commands. Built-in profiles and default billing
/// apply when no configuration file exists.
pub struct CostInputs {
    pub profiles: Vec<FrameworkProfile>,
    pub billing: BillingConfig,
    pub output_dir: PathBuf,
}

impl CostInputs {
    pub fn load(config_path: &str) -> anyhow::Result<Self> {
        if !Path::new(config_path).exists() {
            tracing::debug!(config = %config_path, "No configuration file, using built-in profiles");
            return Ok(Self {
                profiles: builtin_profiles(),
                billing: BillingConfig::default(),
                output_dir: PathBuf::from("results"),
            });
        }

        let config = ConfigLoader::load_file(config_path)?;
        Ok(Self {
            profiles: config.profiles,
            billing: config.billing,
            output_dir: config.harness.output_dir,
        })
    }
}

/// Requested load points, or `defaults` when none were given. Every load
/// must be a finite, non-negative number.
pub fn load_points(loads: &[f64], defaults: &[f64]) -> anyhow::Result<Vec<f64>> {
    if let Some(bad) = loads.iter().find(|l| !l.is_finite() || **l < 0.0) {
        anyhow::bail!("Load must be a non-negative number, got {}", bad);
    }
    Ok(if loads.is_empty() {
        defaults.to_vec()
    } else {
        loads.to_vec()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_inputs_fall_back_to_builtins() {
        let inputs = CostInputs::load("/nonexistent/conduit-bench.yaml").unwrap();
        assert_eq!(inputs.profiles.len(), 4);
        assert_eq!(inputs.billing, BillingConfig::default());
    }

    #[test]
    fn test_load_points_defaults_and_validation() {
        assert_eq!(load_points(&[], &[1.0, 2.0]).unwrap(), vec![1.0, 2.0]);
        assert_eq!(load_points(&[0.0, 50.0], &[1.0]).unwrap(), vec![0.0, 50.0]);
        assert!(load_points(&[100.0, -1.0], &[1.0]).is_err());
        assert!(load_points(&[f64::NAN], &[1.0]).is_err());
    }

    #[test]
    fn test_cost_inputs_from_config() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("bench.yaml");
        std::fs::write(
            &path,
            r#"
billing:
  cpu_hour_rate: 0.05
frameworks:
  - name: a
    command: ./a
    port: 8080
workloads:
  - name: w
    kind: single
    path: /
profiles:
  - key: only
    base_memory_mb: 1
    memory_mb_per_unit: 1
    cpu_cores_per_unit: 1
"#,
        )
        .unwrap();

        let inputs = CostInputs::load(path.to_str().unwrap()).unwrap();
        assert_eq!(inputs.profiles.len(), 1);
        assert!((inputs.billing.cpu_hour_rate - 0.05).abs() < 1e-12);
    }
}
