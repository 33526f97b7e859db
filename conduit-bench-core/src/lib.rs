//! conduit-bench Core Library
//!
//! Building blocks of the comparative benchmarking harness: configuration
//! parsing, server process lifecycle, resource profiling, framework
//! profiles and infrastructure cost projection.

pub mod config;
pub mod cost;
pub mod error;
pub mod lifecycle;
pub mod profile;
pub mod profiler;
pub mod types;

// Re-export commonly used types
pub use config::{
    BillingConfig, Config, ConfigLoader, FrameworkConfig, HarnessConfig, HttpMethod, RunLength,
    WorkloadConfig, WorkloadKind,
};
pub use cost::{BreakEvenPoint, CostAnalysis, CostModel, CostStudy, FootprintSummary, StudyPoint};
pub use error::{HardValidationError, HarnessError, HarnessResult, LifecycleError, StatsError};
pub use lifecycle::{LifecycleManager, ServerProcess, StartOutcome, StopOutcome};
pub use profile::{builtin_profiles, find_profile, FrameworkProfile};
pub use profiler::{ProcessSnapshot, ResourceEstimate, ResourceProfiler};
pub use types::{FrameworkName, Port, ProcessId, WorkloadName};
