// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Resource profiling.
//!
//! Live memory comes from the OS process table through sysinfo. CPU needs
//! are estimated from a static framework profile since a single sequential
//! client cannot saturate a server.

use serde::{Deserialize, Serialize};
use sysinfo::{Pid, System};

use crate::profile::FrameworkProfile;
use crate::types::ProcessId;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Point-in-time reading of a live process.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    /// Resident set size in MB.
    pub memory_mb: f64,
    /// CPU usage in percent of one core since the previous refresh.
    pub cpu_percent: f32,
}

/// Reads live resource usage of server processes.
pub struct ResourceProfiler {
    system: System,
}

impl ResourceProfiler {
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }

    /// Refresh and read a process, or `None` if it cannot be inspected.
    pub fn snapshot(&mut self, pid: ProcessId) -> Option<ProcessSnapshot> {
        let pid = Pid::from_u32(pid.value());
        if !self.system.refresh_process(pid) {
            return None;
        }
        self.system.process(pid).map(|process| ProcessSnapshot {
            memory_mb: process.memory() as f64 / BYTES_PER_MB,
            cpu_percent: process.cpu_usage(),
        })
    }

    /// Resident memory of a process in MB.
    ///
    /// Returns 0 and logs a warning when the process cannot be inspected;
    /// a failed reading never aborts a run.
    pub fn memory_mb(&mut self, pid: ProcessId) -> f64 {
        match self.snapshot(pid) {
            Some(snapshot) => {
                tracing::debug!(pid = %pid, memory_mb = snapshot.memory_mb, "Sampled process memory");
                snapshot.memory_mb
            }
            None => {
                tracing::warn!(pid = %pid, "Could not inspect process memory, reporting 0");
                0.0
            }
        }
    }
}

impl Default for ResourceProfiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Static resource needs of a framework at a given load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceEstimate {
    pub load: f64,
    pub memory_mb: f64,
    pub cpu_cores: f64,
    pub instances: u32,
}

impl ResourceEstimate {
    /// Evaluate the linear profile model at `load` ops/sec.
    pub fn at_load(profile: &FrameworkProfile, load: f64, cores_per_instance: u32) -> Self {
        Self {
            load,
            memory_mb: profile.memory_at_scale(load),
            cpu_cores: profile.cores_at_scale(load),
            instances: profile.instances_at_scale(load, cores_per_instance),
        }
    }
}
