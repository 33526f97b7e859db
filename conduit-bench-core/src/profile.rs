// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Static framework resource profiles.
//!
//! A profile characterizes how a framework's memory and CPU needs grow with
//! load. The model is linear with no saturation term, so projections at
//! extreme loads are approximate.

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;
use crate::types::FrameworkName;

/// Default load unit for marginal memory (per 1K ops/sec).
pub const DEFAULT_MEMORY_UNIT: f64 = 1_000.0;
/// Default load unit for CPU cores (per 10K ops/sec).
pub const DEFAULT_CPU_UNIT: f64 = 10_000.0;

/// Static resource characterization of a framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkProfile {
    /// Lookup key, referenced from framework configs.
    pub key: FrameworkName,
    /// Human-readable name used in tables.
    pub display_name: String,
    /// Resident memory with no load, in MB.
    pub base_memory_mb: f64,
    /// Additional memory per `memory_unit` of load, in MB.
    pub memory_mb_per_unit: f64,
    /// Load (ops/sec) that one memory increment covers.
    pub memory_unit: f64,
    /// CPU cores needed per `cpu_unit` of load.
    pub cpu_cores_per_unit: f64,
    /// Load (ops/sec) that one CPU increment covers.
    pub cpu_unit: f64,
    /// Deployable artifact (container image) size in MB.
    pub artifact_size_mb: f64,
    /// Cold start latency in milliseconds.
    pub cold_start_ms: f64,
    /// Maximum sustainable ops/sec per CPU core.
    pub max_throughput_per_core: f64,
}

impl FrameworkProfile {
    /// Memory needed at the given load, in MB.
    pub fn memory_at_scale(&self, load: f64) -> f64 {
        self.base_memory_mb + (load / self.memory_unit) * self.memory_mb_per_unit
    }

    /// CPU cores needed at the given load.
    pub fn cores_at_scale(&self, load: f64) -> f64 {
        (load / self.cpu_unit) * self.cpu_cores_per_unit
    }

    /// Number of instances needed at the given load. Never less than one.
    pub fn instances_at_scale(&self, load: f64, cores_per_instance: u32) -> u32 {
        let per_instance = f64::from(cores_per_instance.max(1));
        let needed = (self.cores_at_scale(load) / per_instance).ceil();
        if needed.is_finite() && needed > 1.0 {
            needed as u32
        } else {
            1
        }
    }

    /// Check the profile invariants: every coefficient non-negative and
    /// finite, load units strictly positive.
    pub fn validate(&self) -> Result<(), HardValidationError> {
        let non_negative = [
            ("base_memory_mb", self.base_memory_mb),
            ("memory_mb_per_unit", self.memory_mb_per_unit),
            ("cpu_cores_per_unit", self.cpu_cores_per_unit),
            ("artifact_size_mb", self.artifact_size_mb),
            ("cold_start_ms", self.cold_start_ms),
            ("max_throughput_per_core", self.max_throughput_per_core),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(HardValidationError::InvalidFieldValue {
                    field,
                    value: value.to_string(),
                    reason: format!("Must be a non-negative number (profile '{}')", self.key),
                });
            }
        }

        for (field, value) in [("memory_unit", self.memory_unit), ("cpu_unit", self.cpu_unit)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(HardValidationError::InvalidFieldValue {
                    field,
                    value: value.to_string(),
                    reason: format!("Load unit must be positive (profile '{}')", self.key),
                });
            }
        }

        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn builtin(
    key: &str,
    display_name: &str,
    base_memory_mb: f64,
    memory_mb_per_unit: f64,
    cpu_cores_per_unit: f64,
    artifact_size_mb: f64,
    cold_start_ms: f64,
    max_throughput_per_core: f64,
) -> Option<FrameworkProfile> {
    Some(FrameworkProfile {
        key: FrameworkName::new(key).ok()?,
        display_name: display_name.to_string(),
        base_memory_mb,
        memory_mb_per_unit,
        memory_unit: DEFAULT_MEMORY_UNIT,
        cpu_cores_per_unit,
        cpu_unit: DEFAULT_CPU_UNIT,
        artifact_size_mb,
        cold_start_ms,
        max_throughput_per_core,
    })
}

/// Pre-characterized profiles used when a configuration defines none.
///
/// The first entry is the reference baseline for cost studies.
pub fn builtin_profiles() -> Vec<FrameworkProfile> {
    [
        builtin("python-fastapi", "Python FastAPI", 150.0, 50.0, 8.0, 450.0, 2500.0, 1250.0),
        builtin("python-flask", "Python Flask", 120.0, 60.0, 10.0, 380.0, 2200.0, 1000.0),
        builtin("node-express", "Node.js Express", 80.0, 30.0, 6.0, 250.0, 800.0, 1666.0),
        builtin("conduit", "Conduit", 8.0, 2.0, 0.8, 15.0, 50.0, 12500.0),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Look up a profile by key.
pub fn find_profile<'a>(
    profiles: &'a [FrameworkProfile],
    key: &str,
) -> Option<&'a FrameworkProfile> {
    profiles.iter().find(|p| p.key.as_str() == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conduit() -> FrameworkProfile {
        find_profile(&builtin_profiles(), "conduit").unwrap().clone()
    }

    #[test]
    fn test_builtin_profiles_are_valid() {
        let profiles = builtin_profiles();
        assert_eq!(profiles.len(), 4);
        assert_eq!(profiles[0].key.as_str(), "python-fastapi");
        for profile in &profiles {
            profile.validate().unwrap();
        }
    }

    #[test]
    fn test_memory_at_scale_linear() {
        // base 8 + (10_000 / 1000) * 2 = 28
        assert!((conduit().memory_at_scale(10_000.0) - 28.0).abs() < 1e-9);
        assert!((conduit().memory_at_scale(0.0) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_cores_at_scale_linear() {
        let profile = conduit();
        assert!((profile.cores_at_scale(10_000.0) - 0.8).abs() < 1e-9);
        assert!((profile.cores_at_scale(100_000.0) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_instances_never_below_one() {
        let profile = conduit();
        for load in [0.0, 1.0, 100.0, 10_000.0, 1e9] {
            assert!(profile.instances_at_scale(load, 2) >= 1);
        }
        // 8 cores / 2 per instance
        assert_eq!(profile.instances_at_scale(100_000.0, 2), 4);
        // 8.8 cores / 2 per instance rounds up
        assert_eq!(profile.instances_at_scale(110_000.0, 2), 5);
    }

    #[test]
    fn test_validate_rejects_negative_and_zero_unit() {
        let mut profile = conduit();
        profile.memory_mb_per_unit = -1.0;
        assert!(profile.validate().is_err());

        let mut profile = conduit();
        profile.cpu_unit = 0.0;
        assert!(profile.validate().is_err());

        let mut profile = conduit();
        profile.cold_start_ms = f64::NAN;
        assert!(profile.validate().is_err());
    }
}
