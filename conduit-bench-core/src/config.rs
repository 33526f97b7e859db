// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML configuration parser with strict schema validation.
//!
//! Frameworks, workloads, resource profiles, billing rates and harness
//! timing are all configuration data. Any invalid field results in a
//! HardValidationError before a single process is spawned.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HarnessError, HarnessResult, HardValidationError};
use crate::profile::{
    builtin_profiles, find_profile, FrameworkProfile, DEFAULT_CPU_UNIT, DEFAULT_MEMORY_UNIT,
};
use crate::types::{FrameworkName, Port, WorkloadName};

/// Iterations used when a workload sets neither `iterations` nor `duration_secs`.
const DEFAULT_ITERATIONS: u64 = 1000;

/// Raw harness timing as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
struct RawHarnessConfig {
    #[serde(default = "default_poll_interval_ms")]
    poll_interval_ms: u64,
    #[serde(default = "default_max_wait_ms")]
    max_wait_ms: u64,
    #[serde(default = "default_health_timeout_ms")]
    health_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    request_timeout_ms: u64,
    #[serde(default = "default_stop_timeout_ms")]
    stop_timeout_ms: u64,
    #[serde(default = "default_warmup_iterations")]
    warmup_iterations: u64,
    #[serde(default = "default_output_dir")]
    output_dir: String,
    #[serde(default)]
    baseline: Option<String>,
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_max_wait_ms() -> u64 {
    5000 // 50 polls at 100ms
}

fn default_health_timeout_ms() -> u64 {
    100
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_stop_timeout_ms() -> u64 {
    5000
}

fn default_warmup_iterations() -> u64 {
    100
}

fn default_output_dir() -> String {
    "results".to_string()
}

impl Default for RawHarnessConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            max_wait_ms: default_max_wait_ms(),
            health_timeout_ms: default_health_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            stop_timeout_ms: default_stop_timeout_ms(),
            warmup_iterations: default_warmup_iterations(),
            output_dir: default_output_dir(),
            baseline: None,
        }
    }
}

/// Raw billing rates.
#[derive(Debug, Deserialize)]
struct RawBillingConfig {
    #[serde(default = "default_cpu_hour_rate")]
    cpu_hour_rate: f64,
    #[serde(default = "default_gb_hour_rate")]
    gb_hour_rate: f64,
    #[serde(default = "default_cores_per_instance")]
    cores_per_instance: u32,
}

fn default_cpu_hour_rate() -> f64 {
    0.0416 // per vCPU-hour, t3.medium equivalent
}

fn default_gb_hour_rate() -> f64 {
    0.0052
}

fn default_cores_per_instance() -> u32 {
    2
}

impl Default for RawBillingConfig {
    fn default() -> Self {
        Self {
            cpu_hour_rate: default_cpu_hour_rate(),
            gb_hour_rate: default_gb_hour_rate(),
            cores_per_instance: default_cores_per_instance(),
        }
    }
}

/// Raw framework (system under test) definition.
#[derive(Debug, Deserialize)]
struct RawFrameworkConfig {
    name: String,
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: HashMap<String, String>,
    port: u16,
    #[serde(default = "default_health_path")]
    health_path: String,
    #[serde(default)]
    artifact: Option<String>,
    #[serde(default)]
    profile: Option<String>,
}

fn default_health_path() -> String {
    "/health".to_string()
}

/// Raw workload definition.
#[derive(Debug, Deserialize)]
struct RawWorkloadConfig {
    name: String,
    kind: WorkloadKind,
    #[serde(default)]
    method: Option<String>,
    path: String,
    #[serde(default)]
    payload: Option<serde_json::Value>,
    #[serde(default)]
    iterations: Option<u64>,
    #[serde(default)]
    duration_secs: Option<f64>,
    #[serde(default)]
    units_per_request: Option<u64>,
}

/// Raw resource profile. Load units default to 1K (memory) and 10K (CPU).
#[derive(Debug, Deserialize)]
struct RawProfileConfig {
    key: String,
    #[serde(default)]
    display_name: Option<String>,
    base_memory_mb: f64,
    memory_mb_per_unit: f64,
    #[serde(default = "default_memory_unit")]
    memory_unit: f64,
    cpu_cores_per_unit: f64,
    #[serde(default = "default_cpu_unit")]
    cpu_unit: f64,
    #[serde(default)]
    artifact_size_mb: f64,
    #[serde(default)]
    cold_start_ms: f64,
    #[serde(default)]
    max_throughput_per_core: f64,
}

fn default_memory_unit() -> f64 {
    DEFAULT_MEMORY_UNIT
}

fn default_cpu_unit() -> f64 {
    DEFAULT_CPU_UNIT
}

/// Raw root configuration file.
#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    harness: RawHarnessConfig,
    #[serde(default)]
    billing: RawBillingConfig,
    #[serde(default)]
    frameworks: Vec<RawFrameworkConfig>,
    #[serde(default)]
    workloads: Vec<RawWorkloadConfig>,
    #[serde(default)]
    profiles: Vec<RawProfileConfig>,
}

/// Workload shapes the driver can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadKind {
    /// One synchronous request/response per iteration.
    Single,
    /// Server-sent, newline-delimited stream per iteration.
    Streaming,
    /// One request that fans out into chained server-side stages.
    Pipeline,
}

impl WorkloadKind {
    /// Label for the throughput unit this kind produces.
    pub fn throughput_unit(&self, batched: bool) -> &'static str {
        match (self, batched) {
            (Self::Streaming, _) => "chunks/s",
            (Self::Pipeline, _) => "pipelines/s",
            (Self::Single, true) => "units/s",
            (Self::Single, false) => "req/s",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Streaming => write!(f, "streaming"),
            Self::Pipeline => write!(f, "pipeline"),
        }
    }
}

/// HTTP methods supported for workload requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl HttpMethod {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            _ => None,
        }
    }

    /// Method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How long a workload runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunLength {
    /// A fixed number of measured iterations.
    Iterations(u64),
    /// Measured iterations are issued until this much time has elapsed.
    Duration(Duration),
}

impl fmt::Display for RunLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iterations(n) => write!(f, "{} iterations", n),
            Self::Duration(d) => write!(f, "{:.1}s", d.as_secs_f64()),
        }
    }
}

/// Validated harness timing.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub poll_interval: Duration,
    pub max_wait: Duration,
    pub health_timeout: Duration,
    pub request_timeout: Duration,
    pub stop_timeout: Duration,
    pub warmup_iterations: u64,
    pub output_dir: PathBuf,
    pub baseline: Option<FrameworkName>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(default_poll_interval_ms()),
            max_wait: Duration::from_millis(default_max_wait_ms()),
            health_timeout: Duration::from_millis(default_health_timeout_ms()),
            request_timeout: Duration::from_millis(default_request_timeout_ms()),
            stop_timeout: Duration::from_millis(default_stop_timeout_ms()),
            warmup_iterations: default_warmup_iterations(),
            output_dir: PathBuf::from(default_output_dir()),
            baseline: None,
        }
    }
}

/// Validated billing rates for cost projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Price of one vCPU for one hour.
    pub cpu_hour_rate: f64,
    /// Price of one GB of memory for one hour.
    pub gb_hour_rate: f64,
    /// vCPUs per deployed instance.
    pub cores_per_instance: u32,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            cpu_hour_rate: default_cpu_hour_rate(),
            gb_hour_rate: default_gb_hour_rate(),
            cores_per_instance: default_cores_per_instance(),
        }
    }
}

/// Validated framework definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameworkConfig {
    pub name: FrameworkName,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub port: Port,
    pub health_path: String,
    pub artifact: Option<PathBuf>,
    pub profile: Option<FrameworkName>,
}

impl FrameworkConfig {
    /// Base URL the framework serves on.
    pub fn base_url(&self) -> String {
        self.port.loopback_url()
    }

    /// Health-check URL polled by the lifecycle manager.
    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url(), self.health_path)
    }

    /// Fail with a setup error when the artifact under test is absent.
    pub fn check_artifact(&self) -> HarnessResult<()> {
        match &self.artifact {
            Some(path) if !path.exists() => Err(HarnessError::ArtifactMissing {
                framework: self.name.clone(),
                path: path.clone(),
            }),
            _ => Ok(()),
        }
    }
}

/// Validated workload definition.
#[derive(Debug, Clone)]
pub struct WorkloadConfig {
    pub name: WorkloadName,
    pub kind: WorkloadKind,
    pub method: HttpMethod,
    pub path: String,
    pub payload: Option<serde_json::Value>,
    pub run_length: RunLength,
    /// Logical units per successful request (batch size), if any.
    pub units_per_request: Option<u64>,
}

/// Complete validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub harness: HarnessConfig,
    pub billing: BillingConfig,
    pub frameworks: Vec<FrameworkConfig>,
    pub workloads: Vec<WorkloadConfig>,
    pub profiles: Vec<FrameworkProfile>,
}

impl Config {
    /// Look up a framework by name.
    pub fn framework(&self, name: &str) -> Option<&FrameworkConfig> {
        self.frameworks.iter().find(|f| f.name.as_str() == name)
    }

    /// Resource profile linked to a framework, if any.
    pub fn profile_for(&self, framework: &FrameworkConfig) -> Option<&FrameworkProfile> {
        framework
            .profile
            .as_ref()
            .and_then(|key| find_profile(&self.profiles, key.as_str()))
    }

    /// Check that every framework's artifact under test exists.
    pub fn check_artifacts(&self) -> HarnessResult<()> {
        self.frameworks.iter().try_for_each(FrameworkConfig::check_artifact)
    }
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> HarnessResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(HarnessError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| HarnessError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> HarnessResult<Config> {
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| HarnessError::ConfigParse {
                message: format!("YAML parse error: {}", e),
            })?;

        Self::validate(raw)
    }

    /// Validate raw configuration and convert to validated types.
    fn validate(raw: RawConfig) -> HarnessResult<Config> {
        let billing = Self::validate_billing(raw.billing)?;

        let profiles = if raw.profiles.is_empty() {
            builtin_profiles()
        } else {
            let mut profiles = Vec::with_capacity(raw.profiles.len());
            let mut seen = HashSet::new();
            for raw_profile in raw.profiles {
                let profile = Self::validate_profile(raw_profile)?;
                if !seen.insert(profile.key.clone()) {
                    return Err(HardValidationError::DuplicateName {
                        name: profile.key.to_string(),
                    }
                    .into());
                }
                profiles.push(profile);
            }
            profiles
        };

        let mut frameworks = Vec::with_capacity(raw.frameworks.len());
        let mut seen_names = HashSet::new();
        let mut seen_ports = HashSet::new();

        for (index, raw_framework) in raw.frameworks.into_iter().enumerate() {
            let framework = Self::validate_framework(raw_framework, index, &profiles)?;

            if !seen_names.insert(framework.name.clone()) {
                return Err(HardValidationError::DuplicateName {
                    name: framework.name.to_string(),
                }
                .into());
            }

            if !seen_ports.insert(framework.port.value()) {
                return Err(HardValidationError::InvalidPort {
                    port: framework.port.value(),
                    reason: format!(
                        "Port {} is already used by another framework",
                        framework.port
                    ),
                }
                .into());
            }

            frameworks.push(framework);
        }

        if frameworks.is_empty() {
            return Err(HardValidationError::SchemaValidation {
                message: "At least one framework must be defined".to_string(),
            }
            .into());
        }

        let mut workloads = Vec::with_capacity(raw.workloads.len());
        let mut seen_workloads = HashSet::new();
        for (index, raw_workload) in raw.workloads.into_iter().enumerate() {
            let workload = Self::validate_workload(raw_workload, index)?;
            if !seen_workloads.insert(workload.name.clone()) {
                return Err(HardValidationError::DuplicateName {
                    name: workload.name.to_string(),
                }
                .into());
            }
            workloads.push(workload);
        }

        if workloads.is_empty() {
            return Err(HardValidationError::SchemaValidation {
                message: "At least one workload must be defined".to_string(),
            }
            .into());
        }

        let harness = Self::validate_harness(raw.harness, &frameworks)?;

        Ok(Config {
            harness,
            billing,
            frameworks,
            workloads,
            profiles,
        })
    }

    /// Validate harness timing.
    fn validate_harness(
        raw: RawHarnessConfig,
        frameworks: &[FrameworkConfig],
    ) -> HarnessResult<HarnessConfig> {
        let timings = [
            ("poll_interval_ms", raw.poll_interval_ms),
            ("max_wait_ms", raw.max_wait_ms),
            ("health_timeout_ms", raw.health_timeout_ms),
            ("request_timeout_ms", raw.request_timeout_ms),
            ("stop_timeout_ms", raw.stop_timeout_ms),
        ];
        for (field, value) in timings {
            if value == 0 {
                return Err(HardValidationError::InvalidFieldValue {
                    field,
                    value: "0".to_string(),
                    reason: "Timing values must be greater than 0".to_string(),
                }
                .into());
            }
        }

        if raw.poll_interval_ms > raw.max_wait_ms {
            return Err(HardValidationError::InvalidFieldValue {
                field: "poll_interval_ms",
                value: raw.poll_interval_ms.to_string(),
                reason: format!("Must not exceed max_wait_ms ({})", raw.max_wait_ms),
            }
            .into());
        }

        let baseline = match raw.baseline {
            Some(name) => {
                let name = FrameworkName::new(name)?;
                if !frameworks.iter().any(|f| f.name == name) {
                    return Err(HardValidationError::InvalidFieldValue {
                        field: "baseline",
                        value: name.to_string(),
                        reason: "Baseline must name a configured framework".to_string(),
                    }
                    .into());
                }
                Some(name)
            }
            None => None,
        };

        Ok(HarnessConfig {
            poll_interval: Duration::from_millis(raw.poll_interval_ms),
            max_wait: Duration::from_millis(raw.max_wait_ms),
            health_timeout: Duration::from_millis(raw.health_timeout_ms),
            request_timeout: Duration::from_millis(raw.request_timeout_ms),
            stop_timeout: Duration::from_millis(raw.stop_timeout_ms),
            warmup_iterations: raw.warmup_iterations,
            output_dir: PathBuf::from(raw.output_dir),
            baseline,
        })
    }

    /// Validate billing rates.
    fn validate_billing(raw: RawBillingConfig) -> HarnessResult<BillingConfig> {
        for (field, value) in [
            ("cpu_hour_rate", raw.cpu_hour_rate),
            ("gb_hour_rate", raw.gb_hour_rate),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(HardValidationError::InvalidFieldValue {
                    field,
                    value: value.to_string(),
                    reason: "Rates must be non-negative".to_string(),
                }
                .into());
            }
        }

        if raw.cores_per_instance == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "cores_per_instance",
                value: "0".to_string(),
                reason: "An instance needs at least one core".to_string(),
            }
            .into());
        }

        Ok(BillingConfig {
            cpu_hour_rate: raw.cpu_hour_rate,
            gb_hour_rate: raw.gb_hour_rate,
            cores_per_instance: raw.cores_per_instance,
        })
    }

    /// Validate a single resource profile.
    fn validate_profile(raw: RawProfileConfig) -> HarnessResult<FrameworkProfile> {
        let key = FrameworkName::new(&raw.key)?;
        let profile = FrameworkProfile {
            display_name: raw.display_name.unwrap_or_else(|| key.to_string()),
            key,
            base_memory_mb: raw.base_memory_mb,
            memory_mb_per_unit: raw.memory_mb_per_unit,
            memory_unit: raw.memory_unit,
            cpu_cores_per_unit: raw.cpu_cores_per_unit,
            cpu_unit: raw.cpu_unit,
            artifact_size_mb: raw.artifact_size_mb,
            cold_start_ms: raw.cold_start_ms,
            max_throughput_per_core: raw.max_throughput_per_core,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Validate a single framework definition.
    fn validate_framework(
        raw: RawFrameworkConfig,
        index: usize,
        profiles: &[FrameworkProfile],
    ) -> HarnessResult<FrameworkConfig> {
        let context = format!("framework at index {}", index);

        let name = FrameworkName::new(&raw.name)?;

        if raw.command.trim().is_empty() {
            return Err(HardValidationError::MissingRequiredField {
                field: "command",
                context,
            }
            .into());
        }

        let port = Port::new(raw.port)?;

        if !raw.health_path.starts_with('/') {
            return Err(HardValidationError::InvalidFieldValue {
                field: "health_path",
                value: raw.health_path,
                reason: "Path must start with '/'".to_string(),
            }
            .into());
        }

        for key in raw.env.keys() {
            if key.is_empty() {
                return Err(HardValidationError::InvalidFieldValue {
                    field: "env",
                    value: format!("empty key in {}", context),
                    reason: "Environment variable names cannot be empty".to_string(),
                }
                .into());
            }
        }

        let profile = match raw.profile {
            Some(key) => {
                let key = FrameworkName::new(key)?;
                if find_profile(profiles, key.as_str()).is_none() {
                    return Err(HarnessError::ProfileNotFound {
                        name: key.to_string(),
                    });
                }
                Some(key)
            }
            None => None,
        };

        Ok(FrameworkConfig {
            name,
            command: raw.command,
            args: raw.args,
            env: raw.env,
            port,
            health_path: raw.health_path,
            artifact: raw.artifact.map(PathBuf::from),
            profile,
        })
    }

    /// Validate a single workload definition.
    fn validate_workload(raw: RawWorkloadConfig, index: usize) -> HarnessResult<WorkloadConfig> {
        let context = format!("workload at index {}", index);

        let name = WorkloadName::new(&raw.name)?;

        let method = match raw.method {
            Some(m) => HttpMethod::parse(&m).ok_or_else(|| {
                HardValidationError::InvalidFieldValue {
                    field: "method",
                    value: m.clone(),
                    reason: "Supported methods are GET, POST and PUT".to_string(),
                }
            })?,
            None if raw.kind == WorkloadKind::Streaming => HttpMethod::Get,
            None => HttpMethod::Post,
        };

        if !raw.path.starts_with('/') {
            return Err(HardValidationError::InvalidFieldValue {
                field: "path",
                value: raw.path,
                reason: "Path must start with '/'".to_string(),
            }
            .into());
        }

        let run_length = match (raw.iterations, raw.duration_secs) {
            (Some(_), Some(_)) => {
                return Err(HardValidationError::SchemaValidation {
                    message: format!(
                        "{}: set either iterations or duration_secs, not both",
                        context
                    ),
                }
                .into());
            }
            (Some(0), None) => {
                return Err(HardValidationError::InvalidFieldValue {
                    field: "iterations",
                    value: "0".to_string(),
                    reason: "Iterations must be greater than 0".to_string(),
                }
                .into());
            }
            (Some(n), None) => RunLength::Iterations(n),
            (None, Some(secs)) => {
                if !secs.is_finite() || secs <= 0.0 {
                    return Err(HardValidationError::InvalidFieldValue {
                        field: "duration_secs",
                        value: secs.to_string(),
                        reason: "Duration must be positive".to_string(),
                    }
                    .into());
                }
                let duration = Duration::try_from_secs_f64(secs).map_err(|_| {
                    HardValidationError::InvalidFieldValue {
                        field: "duration_secs",
                        value: secs.to_string(),
                        reason: "Duration is too large".to_string(),
                    }
                })?;
                RunLength::Duration(duration)
            }
            (None, None) => RunLength::Iterations(DEFAULT_ITERATIONS),
        };

        if raw.units_per_request == Some(0) {
            return Err(HardValidationError::InvalidFieldValue {
                field: "units_per_request",
                value: "0".to_string(),
                reason: "Batch size must be greater than 0".to_string(),
            }
            .into());
        }

        Ok(WorkloadConfig {
            name,
            kind: raw.kind,
            method,
            path: raw.path,
            payload: raw.payload,
            run_length,
            units_per_request: raw.units_per_request,
        })
    }
}
